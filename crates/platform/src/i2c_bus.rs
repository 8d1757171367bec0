//! Shared I2C bus with a bounded-wait ownership lock.
//!
//! Every transaction sequence runs while holding a [`BusHandle`]. The handle
//! wraps an embassy [`MutexGuard`], so at most one task can issue bytes on the
//! wire at a time and the lock is released when the handle drops.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};
use embedded_hal::i2c::Error as _;
use embedded_hal_async::i2c::I2c;

use crate::error::{ExpanderError, TransactionFault};

/// I2C controller that can also flush its transmit/receive FIFOs.
///
/// Implemented by the board's I2C peripheral wrapper (and by
/// [`crate::mocks::MockI2c`] on the host).
pub trait BusController: I2c {
    /// Clear the controller's transmit and receive buffers.
    ///
    /// Called after a failed transaction. Must tolerate repeated calls and
    /// must not retry anything itself.
    fn reset_fifos(&mut self) -> Result<(), Self::Error>;
}

/// A bus controller behind an async lock.
pub struct SharedI2cBus<M: RawMutex, C> {
    controller: Mutex<M, C>,
}

impl<M: RawMutex, C: BusController> SharedI2cBus<M, C> {
    /// Wrap a controller.
    pub const fn new(controller: C) -> Self {
        Self {
            controller: Mutex::new(controller),
        }
    }

    /// Take exclusive ownership of the bus, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`ExpanderError::Busy`] if another holder kept the lock past `timeout`.
    pub async fn acquire(&self, timeout: Duration) -> Result<BusHandle<'_, M, C>, ExpanderError> {
        match with_timeout(timeout, self.controller.lock()).await {
            Ok(guard) => Ok(BusHandle { guard }),
            Err(_) => {
                warn!("i2c: bus lock not acquired within {} ms", timeout.as_millis());
                Err(ExpanderError::Busy)
            }
        }
    }

    /// Check whether a device acknowledges `address`.
    pub async fn ping(&self, address: u8, timeout: Duration) -> Result<(), ExpanderError> {
        let mut handle = self.acquire(timeout).await?;
        handle.ping(address).await
    }

    /// Acquire the bus and reset the controller FIFOs.
    pub async fn reset(&self, timeout: Duration) -> Result<(), ExpanderError> {
        let mut handle = self.acquire(timeout).await?;
        handle.reset();
        Ok(())
    }
}

/// Exclusive right to issue transactions. Dropping it releases the bus.
pub struct BusHandle<'a, M: RawMutex, C> {
    guard: MutexGuard<'a, M, C>,
}

impl<M: RawMutex, C: BusController> BusHandle<'_, M, C> {
    /// Issue one transaction against `address`.
    ///
    /// `writes` go out first; when `read` is non-empty a repeated start
    /// follows and `read.len()` bytes are clocked in. A NACK or bus error
    /// aborts the transaction and is reported as
    /// [`ExpanderError::TransactionFailed`]. The FIFOs are left untouched;
    /// recovery is the caller's decision.
    pub async fn transact(
        &mut self,
        address: u8,
        writes: &[u8],
        read: &mut [u8],
    ) -> Result<(), ExpanderError> {
        trace!("i2c: transact addr={} out={} in={}", address, writes.len(), read.len());
        let result = if read.is_empty() {
            self.guard.write(address, writes).await
        } else if writes.is_empty() {
            self.guard.read(address, read).await
        } else {
            self.guard.write_read(address, writes, read).await
        };
        result.map_err(|e| {
            let fault = TransactionFault::from_kind(e.kind());
            error!("i2c: transaction with {} failed: {}", address, fault);
            ExpanderError::TransactionFailed(fault)
        })
    }

    /// Address-only write; succeeds if the target acknowledges.
    pub async fn ping(&mut self, address: u8) -> Result<(), ExpanderError> {
        self.transact(address, &[], &mut []).await
    }

    /// Clear the controller FIFOs. A failing reset is logged and ignored.
    pub fn reset(&mut self) {
        warn!("i2c: resetting controller fifos");
        if self.guard.reset_fifos().is_err() {
            error!("i2c: fifo reset rejected by controller");
        }
    }

    /// Give the bus back.
    pub fn release(self) {
        drop(self.guard);
    }
}
