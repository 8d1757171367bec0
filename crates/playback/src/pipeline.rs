//! Boundary to the media pipeline engine.
//!
//! The engine owns decoding and output timing. This crate only builds one
//! source → decoder → sink chain per channel, re-targets it between plays,
//! and reacts to the lifecycle notifications it posts.

use crate::channel::{Channel, ContentLocator};

/// Decoder selection for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioFormat {
    /// MPEG Layer 3
    Mp3,
    /// Waveform Audio File Format
    Wav,
}

impl AudioFormat {
    /// Detect the audio format from a lowercase file extension.
    ///
    /// Returns `None` when the extension is not recognised.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }

    /// Detect the format from the extension of a content locator.
    pub fn from_locator(locator: &str) -> Option<Self> {
        let (_, ext) = locator.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// Pipeline stage that emitted a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// File reader.
    Source,
    /// Decoder.
    Decoder,
    /// Sample writer.
    Sink,
}

/// Decoded stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits: u8,
    /// Channel count (1 = mono, 2 = stereo).
    pub channels: u8,
}

/// State an engine pipeline reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineState {
    /// Built or terminated, not running.
    Init,
    /// Moving samples.
    Running,
    /// Paused mid-stream.
    Paused,
    /// Stopped and drained.
    Stopped,
    /// Reached end of stream.
    Finished,
    /// A stage failed.
    Error,
}

/// What happened in a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleKind {
    /// The decoder learned the stream's sample format.
    FormatKnown(SampleFormat),
    /// The stage changed state.
    StateChanged(PipelineState),
}

/// Lifecycle notification posted by the engine into the merged event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineEvent {
    /// Channel whose pipeline posted it.
    pub channel: Channel,
    /// Emitting stage.
    pub stage: Stage,
    /// Event payload.
    pub kind: LifecycleKind,
}

/// Error reported by an engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineFault {
    /// The engine refused the request in its current state.
    Rejected,
    /// The engine did not answer in time.
    Timeout,
    /// Storage or output I/O failed.
    Io,
}

impl core::fmt::Display for PipelineFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Rejected => write!(f, "request rejected"),
            Self::Timeout => write!(f, "engine timeout"),
            Self::Io => write!(f, "i/o failure"),
        }
    }
}

/// Physical output sub-channel a sink is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputSubChannel {
    /// Left slot of the output device.
    Left,
    /// Right slot of the output device.
    Right,
}

/// What to build for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineSpec {
    /// Channel the pipeline serves.
    pub channel: Channel,
    /// Decoder stage.
    pub decoder: AudioFormat,
    /// Sink binding.
    pub output: OutputSubChannel,
}

/// One constructed source → decoder → sink chain.
pub trait Pipeline {
    /// Start moving samples.
    fn run(&mut self) -> impl core::future::Future<Output = Result<(), PipelineFault>>;

    /// Request a stop. Returns before the chain has drained.
    fn stop(&mut self) -> impl core::future::Future<Output = Result<(), PipelineFault>>;

    /// Wait until every stage has stopped.
    fn wait_for_stop(&mut self) -> impl core::future::Future<Output = Result<(), PipelineFault>>;

    /// Tear the running chain down so it can be re-targeted.
    fn terminate(&mut self) -> impl core::future::Future<Output = Result<(), PipelineFault>>;

    /// Clear ring buffers and per-element state.
    fn reset_buffers(&mut self) -> Result<(), PipelineFault>;

    /// Point the source stage at new content.
    fn set_source_locator(&mut self, locator: ContentLocator) -> Result<(), PipelineFault>;

    /// Configure the sink for the decoded stream.
    fn set_sink_format(&mut self, format: SampleFormat) -> Result<(), PipelineFault>;

    /// Format the decoder is producing for the current content, once known.
    ///
    /// Notifications can outlive the play that caused them; this is the
    /// authoritative answer.
    fn decoder_format(&self) -> Option<SampleFormat>;

    /// State as the engine sees it.
    fn state(&self) -> PipelineState;
}

/// Constructs pipelines at startup.
pub trait PipelineBuilder {
    /// Pipeline type produced.
    type Pipeline: Pipeline;

    /// Build the chain described by `spec`.
    fn build(&mut self, spec: PipelineSpec) -> Result<Self::Pipeline, PipelineFault>;
}
