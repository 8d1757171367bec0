//! Phone toy firmware
//!
//! Application layer of the phone toy: turns switch and button changes read
//! through the GPIO expander into ringer / caller playback.
//!
//! # Architecture
//!
//! ```text
//! input_task (InputSource) ──┐
//! pipeline engine callbacks ─┼──▶ EventQueue ──▶ arbitrator_task
//! boot command ──────────────┘                    │  PhoneApp (policy)
//!                                                 ▼
//!                                         ChannelPipelinePair
//! ```
//!
//! [`startup::bring_up`] runs first; if the expander does not come up the
//! app is built disabled and no input ever reaches the pipelines.
//!
//! # Features
//!
//! - `emulator` - Desktop simulator (tokio, tracing-subscriber, mock bus)
//! - `defmt` - Embedded logging
//! - `tracing` - Host logging
//! - `std` - Enable standard library (exposes platform/playback mocks)
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=debug cargo run -p firmware --example phone_sim --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)]

#[macro_use]
extern crate platform;

pub mod app;
pub mod config;
pub mod startup;
pub mod tasks;

pub use app::PhoneApp;
pub use config::AppConfig;
pub use startup::bring_up;
pub use tasks::{
    arbitrator_task, input_task, notify_pipeline, send_command, try_send_event, EventQueue,
    EventReceiver, EventSender,
};
