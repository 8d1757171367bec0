//! MCP23016-style GPIO expander driver.
//!
//! Register access is `select, then write` or `select, repeated start, read`
//! on a [`SharedI2cBus`]. The driver starts [`DeviceState::Uninitialized`]
//! and refuses every register operation until [`GpioExpander::initialize`]
//! has programmed the port directions.
//!
//! # Failure handling
//!
//! - A failed single read or write resets the controller FIFOs and returns
//!   [`ExpanderError::TransactionFailed`]. Nothing is retried here.
//! - [`GpioExpander::read_register_with_retry`] retries without resetting
//!   and performs exactly one FIFO reset if every attempt fails.

pub mod registers;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use crate::error::ExpanderError;
use crate::i2c_bus::{BusController, BusHandle, SharedI2cBus};
pub use registers::{address_byte, Port, Register, DEFAULT_ADDRESS};

/// Initialization state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Directions not yet programmed; register access fails fast.
    Uninitialized,
    /// Directions and polarity programmed.
    Initialized,
}

/// Static configuration of one expander.
///
/// Defaults follow the MCP23016 datasheet: port 0 all inputs, port 1 all
/// outputs, 30 ms settle after each read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpanderConfig {
    /// 7-bit device address.
    pub address: u8,
    /// IODIR0 value (1 = input).
    pub direction_p0: u8,
    /// IODIR1 value (1 = input).
    pub direction_p1: u8,
    /// Port wired to buttons and matrix lines.
    pub input_port: Port,
    /// Port wired to matrix columns and indicators.
    pub output_port: Port,
    /// Longest wait for the bus lock.
    pub bus_timeout: Duration,
    /// Delay after a read, held under the bus lock.
    pub settle: Duration,
    /// Delay between attempts of a retried read.
    pub retry_backoff: Duration,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            direction_p0: 0xFF,
            direction_p1: 0x00,
            input_port: Port::P0,
            output_port: Port::P1,
            bus_timeout: Duration::from_millis(100),
            settle: Duration::from_millis(30),
            retry_backoff: Duration::from_millis(5),
        }
    }
}

impl ExpanderConfig {
    /// Set both direction registers.
    #[must_use]
    pub const fn with_directions(mut self, p0: u8, p1: u8) -> Self {
        self.direction_p0 = p0;
        self.direction_p1 = p1;
        self
    }

    /// Choose which port is sensed and which is driven.
    #[must_use]
    pub const fn with_ports(mut self, input: Port, output: Port) -> Self {
        self.input_port = input;
        self.output_port = output;
        self
    }

    /// Set the bus-lock timeout.
    #[must_use]
    pub const fn with_bus_timeout(mut self, timeout: Duration) -> Self {
        self.bus_timeout = timeout;
        self
    }

    /// Set the post-read settle delay.
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Set the delay between retried reads.
    #[must_use]
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Register writes performed by `initialize`, in order.
    #[must_use]
    pub const fn init_sequence(&self) -> [(Register, u8); 5] {
        [
            (Register::Iodir0, self.direction_p0),
            (Register::Iodir1, self.direction_p1),
            (Register::Ipol0, 0x00),
            (Register::Ipol1, 0x00),
            (Register::Iocon0, 0x00),
        ]
    }
}

/// Driver for one expander on a shared bus.
///
/// Takes `&self` everywhere so the input task and the bring-up code can share
/// one instance; the bus lock serializes the wire.
pub struct GpioExpander<'a, M: RawMutex, C> {
    bus: &'a SharedI2cBus<M, C>,
    config: ExpanderConfig,
    initialized: AtomicBool,
}

impl<'a, M: RawMutex, C: BusController> GpioExpander<'a, M, C> {
    /// Create an uninitialized driver.
    pub fn new(bus: &'a SharedI2cBus<M, C>, config: ExpanderConfig) -> Self {
        Self {
            bus,
            config,
            initialized: AtomicBool::new(false),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        if self.initialized.load(Ordering::Acquire) {
            DeviceState::Initialized
        } else {
            DeviceState::Uninitialized
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Ping the device and program directions, polarity and control.
    ///
    /// Returns immediately without touching the bus if already initialized.
    /// The whole sequence runs under one bus acquisition. On failure the
    /// FIFOs are reset and the device stays uninitialized.
    pub async fn initialize(&self) -> Result<(), ExpanderError> {
        if self.state() == DeviceState::Initialized {
            return Ok(());
        }
        let mut bus = self.bus.acquire(self.config.bus_timeout).await?;
        // Another caller may have finished while we waited for the lock.
        if self.state() == DeviceState::Initialized {
            return Ok(());
        }
        match self.program(&mut bus).await {
            Ok(()) => {
                self.initialized.store(true, Ordering::Release);
                info!("expander: initialized at {}", self.config.address);
                Ok(())
            }
            Err(e) => {
                if e.is_transaction_fault() {
                    bus.reset();
                }
                error!("expander: initialize failed: {}", e);
                Err(e)
            }
        }
    }

    async fn program(&self, bus: &mut BusHandle<'_, M, C>) -> Result<(), ExpanderError> {
        let address = self.config.address;
        bus.ping(address).await?;
        for (register, value) in self.config.init_sequence() {
            bus.transact(address, &[register.addr(), value], &mut []).await?;
        }
        Ok(())
    }

    /// Write one register.
    pub async fn write_register(&self, register: Register, value: u8) -> Result<(), ExpanderError> {
        self.ensure_initialized()?;
        let mut bus = self.bus.acquire(self.config.bus_timeout).await?;
        let result = bus
            .transact(self.config.address, &[register.addr(), value], &mut [])
            .await;
        if result.is_err() {
            bus.reset();
        }
        result
    }

    /// Read one register. Resets the FIFOs on a failed transaction.
    pub async fn read_register(&self, register: Register) -> Result<u8, ExpanderError> {
        self.ensure_initialized()?;
        self.read_once(register, true).await
    }

    /// Read with up to `max_attempts` tries (0 is treated as 1).
    ///
    /// Stops at the first success. Failed attempts do not reset the FIFOs;
    /// if all of them fail, one reset is issued and
    /// [`ExpanderError::ReadExhausted`] is returned.
    pub async fn read_register_with_retry(
        &self,
        register: Register,
        max_attempts: u8,
    ) -> Result<u8, ExpanderError> {
        self.ensure_initialized()?;
        let attempts = max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.read_once(register, false).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!("expander: read attempt {}/{} failed: {}", attempt, attempts, e);
                    if attempt < attempts && self.config.retry_backoff > Duration::from_ticks(0) {
                        Timer::after(self.config.retry_backoff).await;
                    }
                }
            }
        }
        warn!("expander: read of {} exhausted {} attempts", register.addr(), attempts);
        if self.bus.reset(self.config.bus_timeout).await.is_err() {
            error!("expander: post-retry fifo reset skipped, bus busy");
        }
        Err(ExpanderError::ReadExhausted { attempts })
    }

    async fn read_once(&self, register: Register, reset_on_fault: bool) -> Result<u8, ExpanderError> {
        let mut bus = self.bus.acquire(self.config.bus_timeout).await?;
        let mut buf = [0u8; 1];
        let result = bus
            .transact(self.config.address, &[register.addr()], &mut buf)
            .await;
        if let Err(e) = result {
            if reset_on_fault {
                bus.reset();
            }
            return Err(e);
        }
        if self.config.settle > Duration::from_ticks(0) {
            Timer::after(self.config.settle).await;
        }
        bus.release();
        let [value] = buf;
        Ok(value)
    }

    fn ensure_initialized(&self) -> Result<(), ExpanderError> {
        match self.state() {
            DeviceState::Initialized => Ok(()),
            DeviceState::Uninitialized => Err(ExpanderError::NotInitialized),
        }
    }
}
