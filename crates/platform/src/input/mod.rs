//! Input sources built on the expander.
//!
//! Both strategies ([`PollingInput`] and [`InterruptInput`]) produce the same
//! lazy, endless stream of [`InputEvent`]s through [`InputSource`], and both
//! debounce through [`InputSnapshot`]: an event is emitted only when a read
//! returns a byte different from the last one observed. Read failures are
//! logged and the cycle is skipped.

pub mod interrupt;
pub mod polling;

use embassy_time::Instant;

use crate::expander::Register;

pub use interrupt::{EdgeSource, InterruptInput, SignalEdges};
pub use polling::{MatrixLayout, PollMode, PollingInput};

/// Logical input line: a bit position in a data-port register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineId(u8);

impl LineId {
    /// Line at bit `bit` (0..=7).
    #[must_use]
    pub const fn new(bit: u8) -> Self {
        Self(bit)
    }

    /// Bit position.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self.0
    }

    /// Single-bit mask, or 0 for a bit outside the port.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match 1u8.checked_shl(self.0 as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }
}

/// Where an event's byte was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputOrigin {
    /// A polled data port.
    Port(Register),
    /// Interrupt capture after an edge on this line.
    Line(LineId),
    /// Switch-matrix column, by index into the layout's column list.
    MatrixColumn(u8),
}

/// One observation of an input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvent {
    /// Source of the byte.
    pub origin: InputOrigin,
    /// `value != previous`. Sources only emit events where this is true.
    pub changed: bool,
    /// Byte just read.
    pub value: u8,
    /// Byte observed before this one.
    pub previous: u8,
    /// When the read completed.
    pub timestamp: Instant,
}

impl InputEvent {
    /// Any bit of `mask` went 0 → 1.
    #[must_use]
    pub fn rose(&self, mask: u8) -> bool {
        self.value & mask != 0 && self.previous & mask == 0
    }

    /// Any bit of `mask` went 1 → 0.
    #[must_use]
    pub fn fell(&self, mask: u8) -> bool {
        self.value & mask == 0 && self.previous & mask != 0
    }
}

/// Last observed value of one input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot {
    value: u8,
    changed_at: Instant,
}

impl InputSnapshot {
    /// Snapshot seeded with `baseline`, as if it had been read at boot.
    #[must_use]
    pub const fn new(baseline: u8) -> Self {
        Self {
            value: baseline,
            changed_at: Instant::from_ticks(0),
        }
    }

    /// Last value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    /// When the value last changed.
    #[must_use]
    pub fn changed_at(&self) -> Instant {
        self.changed_at
    }

    /// Record a successful read and describe it.
    ///
    /// The snapshot only moves when the value differs.
    pub fn observe(&mut self, origin: InputOrigin, value: u8, now: Instant) -> InputEvent {
        let previous = self.value;
        let changed = value != previous;
        if changed {
            self.value = value;
            self.changed_at = now;
        }
        InputEvent {
            origin,
            changed,
            value,
            previous,
            timestamp: now,
        }
    }
}

/// A restartable, endless stream of deduplicated input events.
pub trait InputSource {
    /// Wait for the next change.
    fn next_event(&mut self) -> impl core::future::Future<Output = InputEvent>;

    /// Start the schedule over.
    ///
    /// Wake-ups not yet acted on may be dropped, but a change already
    /// folded into the snapshot is still delivered. Snapshots are kept, so
    /// a restart neither loses nor replays a change.
    fn restart(&mut self);
}
