//! Playback errors.

use crate::channel::Channel;
use crate::pipeline::PipelineFault;

/// Errors returned by the pipeline pair and the arbitrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// An engine call other than teardown failed.
    Pipeline {
        /// Affected channel.
        channel: Channel,
        /// Engine error.
        fault: PipelineFault,
    },
    /// Stop, drain or terminate failed; the channel keeps whatever state its
    /// pipeline reports.
    TerminationFailed {
        /// Affected channel.
        channel: Channel,
    },
    /// `channel` is not idle, so the other one may not start.
    ConflictingChannel {
        /// The channel still holding the output.
        channel: Channel,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for PlaybackError {}

impl core::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pipeline { channel, fault } => {
                write!(f, "Pipeline on channel {channel} failed: {fault}")
            }
            Self::TerminationFailed { channel } => {
                write!(f, "Channel {channel} failed to terminate")
            }
            Self::ConflictingChannel { channel } => {
                write!(f, "Channel {channel} still active")
            }
        }
    }
}
