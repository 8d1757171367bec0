//! Hardware layer for the phone toy: shared I2C bus, GPIO expander, inputs.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate)
//!         ↓
//! Playback Layer (playback crate)
//!         ↓
//! Input Sources (this crate - polling / interrupt strategies)
//!         ↓
//! Register Device Protocol (this crate - GpioExpander)
//!         ↓
//! Bus Access Layer (this crate - SharedI2cBus over embedded-hal-async)
//! ```
//!
//! # Features
//!
//! - `std`: expose [`mocks`] and `std::error::Error` impls (host tests)
//! - `defmt`: defmt logging and `defmt::Format` derives (hardware)
//! - `tracing`: tracing logging (simulator)
//!
//! # Example
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use platform::{ExpanderConfig, GpioExpander, Register, SharedI2cBus};
//!
//! async fn example<C: platform::BusController>(controller: C) {
//!     let bus: SharedI2cBus<NoopRawMutex, C> = SharedI2cBus::new(controller);
//!     let expander = GpioExpander::new(&bus, ExpanderConfig::default());
//!     if expander.initialize().await.is_ok() {
//!         let _ = expander.read_register_with_retry(Register::Intcap0, 10).await;
//!     }
//! }
//! ```

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
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod diagnostics;
pub mod error;
pub mod expander;
pub mod i2c_bus;
pub mod input;
pub mod mocks;

pub use error::{ExpanderError, TransactionFault};
pub use expander::{DeviceState, ExpanderConfig, GpioExpander, Port, Register};
pub use i2c_bus::{BusController, BusHandle, SharedI2cBus};
pub use input::{
    EdgeSource, InputEvent, InputOrigin, InputSnapshot, InputSource, InterruptInput, LineId,
    MatrixLayout, PollMode, PollingInput, SignalEdges,
};
