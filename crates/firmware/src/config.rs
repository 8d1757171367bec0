//! Board and application constants.
//!
//! Everything tunable lives here so the tasks and the state machine stay
//! free of magic numbers.

use embassy_time::Duration;
use platform::{ExpanderConfig, LineId, MatrixLayout, Port, Register};
use playback::{
    AudioFormat, ChannelConfig, ContentLocator, OutputSubChannel, PairConfig, VolumePercent,
};

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Clip played on channel A when the matrix closes (and on boot).
pub const RINGTONE: ContentLocator = "/sdcard/ringtones/vintage.mp3";

/// Clip played on channel B when REC goes active.
pub const CALLER_CLIP: ContentLocator = "/sdcard/callers/elevator-song.mp3";

/// Ringer volume, percent.
pub const RINGER_VOLUME: u8 = 60;

/// Caller volume, percent.
pub const CALLER_VOLUME: u8 = 40;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The REC button / hook switch, bit 3 of the input port.
pub const REC_LINE: LineId = LineId::new(3);

/// Read attempts for the interrupt-capture register after an edge.
pub const INTERRUPT_READ_ATTEMPTS: u8 = 10;

/// Period of the polling input task.
pub const POLL_PERIOD: Duration = Duration::from_millis(50);

/// Depth of the merged arbitrator queue.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Value driven onto the output port once bring-up succeeds.
pub const OUTPUT_PRESET: u8 = 0xFF;

/// Play the ringtone once the expander is up.
pub const RING_ON_BOOT: bool = true;

/// Expander settings for this board.
pub fn expander_config() -> ExpanderConfig {
    ExpanderConfig::default().with_ports(Port::P0, Port::P1)
}

/// Switch matrix wiring: columns driven on GP1, lines sensed on GP0.
pub fn matrix_layout() -> MatrixLayout {
    MatrixLayout::default()
}

/// Register the interrupt source reads after an edge.
pub fn capture_register() -> Register {
    expander_config().input_port.capture()
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Settings for [`PhoneApp`](crate::app::PhoneApp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppConfig {
    /// Line whose rising edge starts the caller clip.
    pub rec_line: LineId,
    /// Channel A clip.
    pub ringtone: ContentLocator,
    /// Channel B clip.
    pub caller_clip: ContentLocator,
    /// Issue a ring on channel A after bring-up.
    pub ring_on_boot: bool,
}

impl AppConfig {
    /// Board defaults.
    pub const DEFAULT: Self = Self {
        rec_line: REC_LINE,
        ringtone: RINGTONE,
        caller_clip: CALLER_CLIP,
        ring_on_boot: RING_ON_BOOT,
    };
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pipeline pair settings: ringer on the left sub-channel, caller on the right.
pub fn pair_config() -> PairConfig {
    PairConfig {
        a: ChannelConfig {
            volume: VolumePercent::new(RINGER_VOLUME),
            output: OutputSubChannel::Left,
            decoder: AudioFormat::Mp3,
        },
        b: ChannelConfig {
            volume: VolumePercent::new(CALLER_VOLUME),
            output: OutputSubChannel::Right,
            decoder: AudioFormat::Mp3,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rec_line_is_bit_three() {
        assert_eq!(REC_LINE.mask(), 0x08);
    }

    #[test]
    fn test_capture_follows_input_port() {
        assert_eq!(capture_register(), Register::Intcap0);
    }

    #[test]
    fn test_locators_match_decoder() {
        let pair = pair_config();
        assert_eq!(AudioFormat::from_locator(RINGTONE), Some(pair.a.decoder));
        assert_eq!(AudioFormat::from_locator(CALLER_CLIP), Some(pair.b.decoder));
    }

    #[test]
    fn test_channels_use_distinct_outputs_and_volumes() {
        let pair = pair_config();
        assert_ne!(pair.a.output, pair.b.output);
        assert_eq!(pair.a.volume.get(), RINGER_VOLUME);
        assert_eq!(pair.b.volume.get(), CALLER_VOLUME);
    }
}
