//! Bench diagnostics: bus scan and output-port walk.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use heapless::Vec;

use crate::error::ExpanderError;
use crate::expander::GpioExpander;
use crate::i2c_bus::{BusController, SharedI2cBus};
use crate::input::LineId;

/// Ping every 7-bit address from 0x01 to 0x7E and collect the ones that ACK.
///
/// Addresses the lock could not be taken for are logged and skipped.
pub async fn scan_bus<M: RawMutex, C: BusController>(
    bus: &SharedI2cBus<M, C>,
    timeout: Duration,
) -> Vec<u8, 128> {
    let mut found = Vec::new();
    info!("diag: scanning i2c bus");
    for address in 0x01..0x7F_u8 {
        match bus.ping(address, timeout).await {
            Ok(()) => {
                info!("diag: device at {}", address);
                // 126 candidates, capacity 128.
                let _ = found.push(address);
            }
            Err(ExpanderError::Busy) => warn!("diag: {} skipped, bus busy", address),
            Err(_) => {}
        }
    }
    info!("diag: scan done, {} device(s)", found.len());
    found
}

/// Walk a single set bit up and back down the output port `loops` times,
/// holding each position for `dwell`, then clear the port.
pub async fn walk_outputs<M: RawMutex, C: BusController>(
    expander: &GpioExpander<'_, M, C>,
    loops: u8,
    dwell: Duration,
) -> Result<(), ExpanderError> {
    let port = expander.config().output_port.data();
    for _ in 0..loops {
        for bit in (0..8u8).chain((0..8u8).rev()) {
            expander.write_register(port, LineId::new(bit).mask()).await?;
            Timer::after(dwell).await;
        }
    }
    expander.write_register(port, 0x00).await
}
