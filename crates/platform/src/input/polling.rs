//! Periodic polling of a data port or a column/line switch matrix.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Ticker, Timer};
use heapless::{Deque, Vec};

use super::{InputEvent, InputOrigin, InputSnapshot, InputSource};
use crate::expander::{GpioExpander, Register};
use crate::i2c_bus::BusController;

/// Most matrix columns a poller tracks.
pub const MAX_COLUMNS: usize = 8;

/// Column-drive / line-sense switch matrix.
///
/// A scan first clears the drive register, then for each column writes its
/// mask, waits `settle`, and reads `sense & line_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixLayout {
    /// Register the column masks are written to.
    pub drive: Register,
    /// Register the lines are read from.
    pub sense: Register,
    /// One drive mask per column.
    pub columns: &'static [u8],
    /// Bits of `sense` that carry lines.
    pub line_mask: u8,
    /// Delay between driving a column and reading its lines.
    pub settle: Duration,
}

impl Default for MatrixLayout {
    fn default() -> Self {
        Self {
            drive: Register::Gp1,
            sense: Register::Gp0,
            columns: &[0x80, 0x40, 0x20],
            line_mask: 0x1F,
            settle: Duration::from_millis(10),
        }
    }
}

/// What a [`PollingInput`] reads each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollMode {
    /// Read one data register.
    Port(Register),
    /// Scan a switch matrix.
    Matrix(MatrixLayout),
}

/// Fixed-period poller.
///
/// Uses plain [`GpioExpander::read_register`]: no retry, a failed cycle is
/// skipped and the next tick tries again.
pub struct PollingInput<'a, M: RawMutex, C> {
    expander: &'a GpioExpander<'a, M, C>,
    mode: PollMode,
    period: Duration,
    ticker: Ticker,
    snapshots: Vec<InputSnapshot, MAX_COLUMNS>,
    pending: Deque<InputEvent, MAX_COLUMNS>,
}

impl<'a, M: RawMutex, C: BusController> PollingInput<'a, M, C> {
    /// Poll `mode` every `period`, treating `baseline` as the initial value
    /// of every tracked byte.
    pub fn new(
        expander: &'a GpioExpander<'a, M, C>,
        mode: PollMode,
        period: Duration,
        baseline: u8,
    ) -> Self {
        let tracked = match mode {
            PollMode::Port(_) => 1,
            PollMode::Matrix(layout) => {
                if layout.columns.len() > MAX_COLUMNS {
                    warn!("input: matrix has {} columns, scanning the first {}", layout.columns.len(), MAX_COLUMNS);
                }
                layout.columns.len().min(MAX_COLUMNS)
            }
        };
        let mut snapshots = Vec::new();
        for _ in 0..tracked {
            // Capacity checked above.
            let _ = snapshots.push(InputSnapshot::new(baseline));
        }
        Self {
            expander,
            mode,
            period,
            ticker: Ticker::every(period),
            snapshots,
            pending: Deque::new(),
        }
    }

    /// Snapshot for column `index` (or the port, index 0).
    pub fn snapshot(&self, index: usize) -> Option<&InputSnapshot> {
        self.snapshots.get(index)
    }

    /// Run one polling cycle now and queue any changes.
    ///
    /// Returns how many events were queued.
    pub async fn poll_once(&mut self) -> usize {
        match self.mode {
            PollMode::Port(register) => self.poll_port(register).await,
            PollMode::Matrix(layout) => self.scan_matrix(layout).await,
        }
    }

    async fn poll_port(&mut self, register: Register) -> usize {
        let value = match self.expander.read_register(register).await {
            Ok(value) => value,
            Err(e) => {
                warn!("input: poll of {} skipped: {}", register.addr(), e);
                return 0;
            }
        };
        let Some(snapshot) = self.snapshots.first_mut() else {
            return 0;
        };
        let event = snapshot.observe(InputOrigin::Port(register), value, Instant::now());
        if event.changed && self.pending.push_back(event).is_ok() {
            1
        } else {
            0
        }
    }

    async fn scan_matrix(&mut self, layout: MatrixLayout) -> usize {
        if let Err(e) = self.expander.write_register(layout.drive, 0x00).await {
            warn!("input: matrix scan skipped: {}", e);
            return 0;
        }
        let mut queued = 0usize;
        for (index, (&column, snapshot)) in layout
            .columns
            .iter()
            .zip(self.snapshots.iter_mut())
            .enumerate()
        {
            if let Err(e) = self.expander.write_register(layout.drive, column).await {
                warn!("input: matrix column {} skipped: {}", index, e);
                continue;
            }
            Timer::after(layout.settle).await;
            let lines = match self.expander.read_register(layout.sense).await {
                Ok(value) => value & layout.line_mask,
                Err(e) => {
                    warn!("input: matrix column {} skipped: {}", index, e);
                    continue;
                }
            };
            let origin = InputOrigin::MatrixColumn(u8::try_from(index).unwrap_or(u8::MAX));
            let event = snapshot.observe(origin, lines, Instant::now());
            if event.changed && self.pending.push_back(event).is_ok() {
                queued = queued.saturating_add(1);
            }
        }
        queued
    }
}

impl<M: RawMutex, C: BusController> InputSource for PollingInput<'_, M, C> {
    async fn next_event(&mut self) -> InputEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            self.ticker.next().await;
            self.poll_once().await;
        }
    }

    fn restart(&mut self) {
        // Pending events already advanced the snapshot; keep them.
        self.ticker = Ticker::every(self.period);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expander::{ExpanderConfig, DEFAULT_ADDRESS};
    use crate::i2c_bus::SharedI2cBus;
    use crate::mocks::MockI2c;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn config() -> ExpanderConfig {
        ExpanderConfig::default()
            .with_settle(Duration::from_ticks(0))
            .with_retry_backoff(Duration::from_ticks(0))
    }

    #[tokio::test]
    async fn port_poll_emits_only_on_change() {
        let mock = MockI2c::new(DEFAULT_ADDRESS);
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, config());
        expander.initialize().await.unwrap();
        mock.script_reads(Register::Gp0, &[0x00, 0x08, 0x08, 0x00]);
        let mut input = PollingInput::new(
            &expander,
            PollMode::Port(Register::Gp0),
            Duration::from_millis(1),
            0x00,
        );

        let rose = input.next_event().await;
        let fell = input.next_event().await;

        assert_eq!((rose.previous, rose.value), (0x00, 0x08));
        assert!(rose.rose(0x08));
        assert_eq!((fell.previous, fell.value), (0x08, 0x00));
        assert!(fell.fell(0x08));
        assert_eq!(input.snapshot(0).unwrap().value(), 0x00);
    }

    #[tokio::test]
    async fn failed_poll_is_skipped() {
        let mock = MockI2c::new(DEFAULT_ADDRESS);
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, config());
        expander.initialize().await.unwrap();
        mock.set_register(Register::Gp0, 0x04);
        mock.fail_next_reads(2);
        let mut input = PollingInput::new(
            &expander,
            PollMode::Port(Register::Gp0),
            Duration::from_millis(1),
            0x00,
        );

        assert_eq!(input.poll_once().await, 0);
        assert_eq!(input.poll_once().await, 0);
        let event = input.next_event().await;

        assert_eq!(event.value, 0x04);
        assert_eq!(event.origin, InputOrigin::Port(Register::Gp0));
    }

    #[tokio::test]
    async fn matrix_scan_drives_each_column_and_reports_closures() {
        let mock = MockI2c::new(DEFAULT_ADDRESS);
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, config());
        expander.initialize().await.unwrap();
        mock.set_matrix(Register::Gp1, Register::Gp0, &[(0x40, 0x03)]);
        mock.clear_log();
        let layout = MatrixLayout {
            settle: Duration::from_ticks(0),
            ..MatrixLayout::default()
        };
        let mut input = PollingInput::new(&expander, PollMode::Matrix(layout), Duration::from_millis(1), 0x00);

        let queued = input.poll_once().await;

        assert_eq!(queued, 1);
        let event = input.next_event().await;
        assert_eq!(event.origin, InputOrigin::MatrixColumn(1));
        assert_eq!(event.value, 0x03);
        let driven: std::vec::Vec<u8> = mock
            .writes()
            .into_iter()
            .filter(|(reg, _)| *reg == Register::Gp1.addr())
            .map(|(_, value)| value)
            .collect();
        assert_eq!(driven, vec![0x00, 0x80, 0x40, 0x20]);

        assert_eq!(input.poll_once().await, 0);
    }

    #[tokio::test]
    async fn restart_keeps_observed_changes() {
        let mock = MockI2c::new(DEFAULT_ADDRESS);
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, config());
        expander.initialize().await.unwrap();
        mock.set_register(Register::Gp0, 0x01);
        let mut input = PollingInput::new(
            &expander,
            PollMode::Port(Register::Gp0),
            Duration::from_millis(1),
            0x00,
        );

        assert_eq!(input.poll_once().await, 1);
        input.restart();

        let press = input.next_event().await;
        assert_eq!((press.previous, press.value), (0x00, 0x01));
        assert_eq!(input.snapshot(0).unwrap().value(), 0x01);
        // Nothing replayed: the line still reads the same.
        assert_eq!(input.poll_once().await, 0);
    }
}
