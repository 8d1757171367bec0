//! Dual-channel playback: pipeline pair and single-active-channel arbitrator
//!
//! # Features
//!
//! - `std`: expose [`mocks`] and `std::error::Error` impls (host tests)
//! - `defmt`: defmt logging and `defmt::Format` derives (hardware)
//! - `tracing`: tracing logging (simulator)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
extern crate platform;

pub mod arbitrator;
pub mod channel;
pub mod error;
pub mod mocks;
pub mod pair;
pub mod pipeline;
pub mod volume;

pub use arbitrator::{ArbiterEvent, Arbitrator, CommandPolicy};
pub use channel::{Channel, ChannelState, ContentLocator, PlaybackCommand};
pub use error::PlaybackError;
pub use pair::{ChannelConfig, ChannelPipelinePair, PairConfig};
pub use pipeline::{
    AudioFormat, LifecycleKind, OutputSubChannel, Pipeline, PipelineBuilder, PipelineEvent,
    PipelineFault, PipelineSpec, PipelineState, SampleFormat, Stage,
};
pub use volume::{OutputDevice, VolumePercent};
