//! Channel volume and the shared output device.

use crate::pipeline::{OutputSubChannel, PipelineFault};

/// Volume as a percentage, clamped to 0–100.
///
/// Wraps a `u8` with the invariant `0 <= value <= 100`; [`VolumePercent::new`]
/// clamps anything above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumePercent(u8);

impl VolumePercent {
    /// Create a `VolumePercent`, clamping values above 100 to 100.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Return the inner volume value (0–100).
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// The physical output both sinks share.
pub trait OutputDevice {
    /// Set the playback volume of one sub-channel.
    fn set_volume(
        &mut self,
        output: OutputSubChannel,
        volume: VolumePercent,
    ) -> impl core::future::Future<Output = Result<(), PipelineFault>>;
}
