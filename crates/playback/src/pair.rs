//! Two pipelines, built once, sharing one output device.
//!
//! `ChannelPipelinePair` owns both pipelines and each channel's last known
//! [`ChannelState`]. It refuses to start a channel while the other is not
//! idle; stopping the other channel first is the arbitrator's job.

use crate::channel::{Channel, ChannelState, ContentLocator};
use crate::error::PlaybackError;
use crate::pipeline::{
    AudioFormat, OutputSubChannel, Pipeline, PipelineBuilder, PipelineSpec, PipelineState,
    SampleFormat,
};
use crate::volume::{OutputDevice, VolumePercent};

/// Per-channel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Volume applied on every play.
    pub volume: VolumePercent,
    /// Sink binding.
    pub output: OutputSubChannel,
    /// Decoder stage.
    pub decoder: AudioFormat,
}

/// Settings for both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairConfig {
    /// Channel A (ringer).
    pub a: ChannelConfig,
    /// Channel B (caller).
    pub b: ChannelConfig,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            a: ChannelConfig {
                volume: VolumePercent::new(60),
                output: OutputSubChannel::Left,
                decoder: AudioFormat::Mp3,
            },
            b: ChannelConfig {
                volume: VolumePercent::new(40),
                output: OutputSubChannel::Right,
                decoder: AudioFormat::Mp3,
            },
        }
    }
}

struct ChannelSlot<P> {
    pipeline: P,
    config: ChannelConfig,
    state: ChannelState,
    locator: Option<ContentLocator>,
    applied_format: Option<SampleFormat>,
}

impl<P: Pipeline> ChannelSlot<P> {
    /// Adopt the pipeline's view after a failed teardown.
    fn settle_from_pipeline(&mut self) {
        self.state = match self.pipeline.state() {
            PipelineState::Running => ChannelState::Running,
            PipelineState::Finished => ChannelState::Finished,
            PipelineState::Paused => ChannelState::Terminating,
            PipelineState::Init | PipelineState::Stopped | PipelineState::Error => {
                ChannelState::Idle
            }
        };
    }
}

/// Both channel pipelines plus the output device.
pub struct ChannelPipelinePair<P, O> {
    a: ChannelSlot<P>,
    b: ChannelSlot<P>,
    output: O,
}

impl<P: Pipeline, O: OutputDevice> ChannelPipelinePair<P, O> {
    /// Build both pipelines. Called once at startup.
    pub fn build<B>(builder: &mut B, output: O, config: PairConfig) -> Result<Self, PlaybackError>
    where
        B: PipelineBuilder<Pipeline = P>,
    {
        let a = Self::build_slot(builder, Channel::A, config.a)?;
        let b = Self::build_slot(builder, Channel::B, config.b)?;
        info!("playback: pipelines built");
        Ok(Self { a, b, output })
    }

    fn build_slot<B>(
        builder: &mut B,
        channel: Channel,
        config: ChannelConfig,
    ) -> Result<ChannelSlot<P>, PlaybackError>
    where
        B: PipelineBuilder<Pipeline = P>,
    {
        let spec = PipelineSpec {
            channel,
            decoder: config.decoder,
            output: config.output,
        };
        let pipeline = builder
            .build(spec)
            .map_err(|fault| PlaybackError::Pipeline { channel, fault })?;
        Ok(ChannelSlot {
            pipeline,
            config,
            state: ChannelState::Idle,
            locator: None,
            applied_format: None,
        })
    }

    fn slot(&self, channel: Channel) -> &ChannelSlot<P> {
        match channel {
            Channel::A => &self.a,
            Channel::B => &self.b,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut ChannelSlot<P> {
        match channel {
            Channel::A => &mut self.a,
            Channel::B => &mut self.b,
        }
    }

    /// Last known state of `channel`.
    pub fn state(&self, channel: Channel) -> ChannelState {
        self.slot(channel).state
    }

    /// The channel currently `Running`, if any.
    pub fn running_channel(&self) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|&channel| self.state(channel) == ChannelState::Running)
    }

    /// Locator set by the most recent `play` on `channel`.
    pub fn locator(&self, channel: Channel) -> Option<ContentLocator> {
        self.slot(channel).locator
    }

    /// Engine-side state of `channel`'s pipeline.
    pub fn pipeline_state(&self, channel: Channel) -> PipelineState {
        self.slot(channel).pipeline.state()
    }

    /// Start `locator` on `channel`.
    ///
    /// A channel that is not idle is stopped first. Then volume, locator,
    /// buffer reset and run, in that order.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::ConflictingChannel`] if the other channel is not
    /// idle; otherwise any engine failure.
    pub async fn play(&mut self, channel: Channel, locator: ContentLocator) -> Result<(), PlaybackError> {
        let other = channel.other();
        if self.state(other) != ChannelState::Idle {
            return Err(PlaybackError::ConflictingChannel { channel: other });
        }
        if self.state(channel) != ChannelState::Idle {
            self.stop(channel).await?;
        }

        let ChannelConfig { volume, output, decoder } = self.slot(channel).config;
        if AudioFormat::from_locator(locator) != Some(decoder) {
            warn!("playback: {} does not look like the channel {} decoder input", locator, channel);
        }
        self.output
            .set_volume(output, volume)
            .await
            .map_err(|fault| PlaybackError::Pipeline { channel, fault })?;

        let slot = self.slot_mut(channel);
        let fail = |fault| PlaybackError::Pipeline { channel, fault };
        slot.pipeline.set_source_locator(locator).map_err(fail)?;
        slot.pipeline.reset_buffers().map_err(fail)?;
        slot.locator = Some(locator);
        slot.applied_format = None;
        slot.pipeline.run().await.map_err(fail)?;
        slot.state = ChannelState::Running;
        info!("playback: channel {} playing {} at {}%", channel, locator, volume.get());
        Ok(())
    }

    /// Stop `channel` and wait until it has drained and been torn down.
    ///
    /// Idle channels are left alone.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::TerminationFailed`]; the channel then takes the state
    /// its pipeline reports.
    pub async fn stop(&mut self, channel: Channel) -> Result<(), PlaybackError> {
        let slot = self.slot_mut(channel);
        if slot.state == ChannelState::Idle {
            return Ok(());
        }
        slot.state = ChannelState::Terminating;
        debug!("playback: channel {} terminating", channel);
        let drained = match slot.pipeline.stop().await {
            Ok(()) => slot.pipeline.wait_for_stop().await,
            Err(fault) => Err(fault),
        };
        let result = match drained {
            Ok(()) => slot.pipeline.terminate().await,
            Err(fault) => Err(fault),
        };
        match result {
            Ok(()) => {
                slot.state = ChannelState::Idle;
                debug!("playback: channel {} idle", channel);
                Ok(())
            }
            Err(fault) => {
                slot.settle_from_pipeline();
                error!("playback: channel {} termination failed: {}", channel, fault);
                Err(PlaybackError::TerminationFailed { channel })
            }
        }
    }

    /// Handle end of stream on a running channel: terminate, reset, go idle.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::TerminationFailed`] if terminate fails (the channel
    /// then takes the state its pipeline reports), or a pipeline error from
    /// the buffer reset.
    pub async fn finish(&mut self, channel: Channel) -> Result<(), PlaybackError> {
        let slot = self.slot_mut(channel);
        slot.state = ChannelState::Finished;
        if let Err(fault) = slot.pipeline.terminate().await {
            slot.settle_from_pipeline();
            error!("playback: channel {} termination failed: {}", channel, fault);
            return Err(PlaybackError::TerminationFailed { channel });
        }
        slot.state = ChannelState::Idle;
        slot.pipeline
            .reset_buffers()
            .map_err(|fault| PlaybackError::Pipeline { channel, fault })
    }

    /// Forward the decoder's format to `channel`'s sink, once per play.
    ///
    /// `announced` is what the notification carried. It may belong to
    /// content that has since been replaced, so the format actually sent is
    /// the one the decoder reports now.
    ///
    /// Returns `Ok(true)` when a format was forwarded, `Ok(false)` when the
    /// channel is not running, the decoder has no format yet, or that format
    /// was already applied.
    pub fn apply_format(&mut self, channel: Channel, announced: SampleFormat) -> Result<bool, PlaybackError> {
        let slot = self.slot_mut(channel);
        if slot.state != ChannelState::Running {
            return Ok(false);
        }
        let Some(current) = slot.pipeline.decoder_format() else {
            trace!("playback: channel {} decoder has no format yet", channel);
            return Ok(false);
        };
        if current != announced {
            debug!("playback: channel {} stale format notification", channel);
        }
        if slot.applied_format == Some(current) {
            return Ok(false);
        }
        slot.pipeline
            .set_sink_format(current)
            .map_err(|fault| PlaybackError::Pipeline { channel, fault })?;
        slot.applied_format = Some(current);
        Ok(true)
    }

    /// Format last forwarded to `channel`'s sink during the current play.
    pub fn applied_format(&self, channel: Channel) -> Option<SampleFormat> {
        self.slot(channel).applied_format
    }

    /// Stop and tear down both channels. Process-shutdown path.
    ///
    /// Both channels are attempted; the first error is returned.
    pub async fn shutdown(&mut self) -> Result<(), PlaybackError> {
        let mut first_error = None;
        for channel in Channel::ALL {
            let result = match self.state(channel) {
                ChannelState::Idle => Ok(()),
                _ => self.stop(channel).await,
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        info!("playback: shut down");
        first_error.map_or(Ok(()), Err)
    }
}
