//! Playback channels and the commands that drive them.

/// One of the two mutually exclusive output paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Ringer.
    A,
    /// Caller / phone.
    B,
}

impl Channel {
    /// Both channels, A first.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The channel this one excludes.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Stable index (A = 0, B = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Last known lifecycle state of a channel.
///
/// ```text
/// Idle ──play──▶ Running ──sink finished──▶ Finished ──terminate+reset──▶ Idle
///                   │
///                   └──stop──▶ Terminating ──drained+terminated──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Built, not producing sound, ready for `play`.
    Idle,
    /// Producing sound. At most one channel is ever here.
    Running,
    /// Sink reported end of stream; awaiting teardown.
    Finished,
    /// Stop requested; draining.
    Terminating,
}

/// Content locator handed to the source stage (a path on the storage medium).
pub type ContentLocator = &'static str;

/// Request to the arbitrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackCommand {
    /// Stop the other channel, then play `locator` here.
    PlayOnChannel(Channel, ContentLocator),
    /// Stop every channel that is not idle.
    Stop,
    /// Stop one channel.
    StopChannel(Channel),
}

impl core::fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PlayOnChannel(channel, locator) => write!(f, "play {locator} on {channel}"),
            Self::Stop => write!(f, "stop all"),
            Self::StopChannel(channel) => write!(f, "stop {channel}"),
        }
    }
}
