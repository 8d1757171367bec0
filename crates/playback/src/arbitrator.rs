//! Playback arbitrator: the single consumer of the merged event queue.
//!
//! Input events, engine notifications and direct commands all arrive on one
//! embassy [`Channel`](embassy_sync::channel::Channel). Only this task issues
//! play/stop calls, so the one-running-channel rule is enforced by ordering
//! alone: the other channel is stopped and drained before the requested one
//! starts.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use platform::InputEvent;

use crate::channel::{Channel, ChannelState, PlaybackCommand};
use crate::error::PlaybackError;
use crate::pair::ChannelPipelinePair;
use crate::pipeline::{LifecycleKind, Pipeline, PipelineEvent, PipelineState, Stage};
use crate::volume::OutputDevice;

/// Everything the arbitrator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArbiterEvent {
    /// Deduplicated input change.
    Input(InputEvent),
    /// Engine lifecycle notification.
    Pipeline(PipelineEvent),
    /// Command injected directly (boot ring, shutdown).
    Command(PlaybackCommand),
}

/// Maps input events to playback commands.
pub trait CommandPolicy {
    /// Command for `event`, if any.
    fn on_input(&mut self, event: &InputEvent) -> Option<PlaybackCommand>;
}

/// Event loop owner of the pipeline pair.
pub struct Arbitrator<P, O, Y> {
    pair: ChannelPipelinePair<P, O>,
    policy: Y,
}

impl<P: Pipeline, O: OutputDevice, Y: CommandPolicy> Arbitrator<P, O, Y> {
    /// Take ownership of the pair.
    pub fn new(pair: ChannelPipelinePair<P, O>, policy: Y) -> Self {
        Self { pair, policy }
    }

    /// The pair, for inspection.
    pub fn pair(&self) -> &ChannelPipelinePair<P, O> {
        &self.pair
    }

    /// Consume events forever.
    pub async fn run<M: RawMutex, const N: usize>(
        &mut self,
        events: Receiver<'_, M, ArbiterEvent, N>,
    ) -> ! {
        info!("arbitrator: running");
        loop {
            let event = events.receive().await;
            self.handle(event).await;
        }
    }

    /// Process one event. Failures are logged, never returned.
    pub async fn handle(&mut self, event: ArbiterEvent) {
        match event {
            ArbiterEvent::Input(input) => {
                if let Some(command) = self.policy.on_input(&input) {
                    self.dispatch(command).await;
                }
            }
            ArbiterEvent::Command(command) => self.dispatch(command).await,
            ArbiterEvent::Pipeline(notification) => self.on_pipeline(notification).await,
        }
    }

    async fn dispatch(&mut self, command: PlaybackCommand) {
        if let Err(e) = self.execute(command).await {
            error!("arbitrator: {}", e);
        }
    }

    /// Carry out one command.
    ///
    /// `PlayOnChannel` stops the other channel and waits for it to go idle
    /// before starting; if it does not reach idle the play is refused.
    pub async fn execute(&mut self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        debug!("arbitrator: {}", command);
        match command {
            PlaybackCommand::PlayOnChannel(channel, locator) => {
                let other = channel.other();
                if self.pair.state(other) != ChannelState::Idle {
                    if let Err(e) = self.pair.stop(other).await {
                        error!("arbitrator: could not stop channel {}: {}", other, e);
                    }
                }
                if self.pair.state(other) != ChannelState::Idle {
                    return Err(PlaybackError::ConflictingChannel { channel: other });
                }
                self.pair.play(channel, locator).await
            }
            PlaybackCommand::Stop => {
                let mut first_error = None;
                for channel in Channel::ALL {
                    if let Err(e) = self.pair.stop(channel).await {
                        first_error.get_or_insert(e);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
            PlaybackCommand::StopChannel(channel) => self.pair.stop(channel).await,
        }
    }

    async fn on_pipeline(&mut self, event: PipelineEvent) {
        let channel = event.channel;
        match (event.stage, event.kind) {
            (Stage::Decoder, LifecycleKind::FormatKnown(announced)) => {
                match self.pair.apply_format(channel, announced) {
                    Ok(true) => {
                        if let Some(format) = self.pair.applied_format(channel) {
                            info!(
                                "arbitrator: channel {} format {} Hz {} bit {} ch",
                                channel,
                                format.sample_rate,
                                format.bits,
                                format.channels
                            );
                        }
                    }
                    Ok(false) => trace!("arbitrator: channel {} format not forwarded", channel),
                    Err(e) => error!("arbitrator: {}", e),
                }
            }
            (Stage::Sink, LifecycleKind::StateChanged(PipelineState::Finished)) => {
                // A finish posted before a re-play can arrive after it.
                if self.pair.state(channel) != ChannelState::Running
                    || self.pair.pipeline_state(channel) != PipelineState::Finished
                {
                    debug!("arbitrator: stale finish on channel {}", channel);
                    return;
                }
                info!("arbitrator: channel {} clip finished", channel);
                if let Err(e) = self.pair.finish(channel).await {
                    error!("arbitrator: {}", e);
                }
            }
            _ => trace!("arbitrator: channel {} notification ignored", channel),
        }
    }

    /// Tear both pipelines down and hand the pair back.
    pub async fn shutdown(mut self) -> (ChannelPipelinePair<P, O>, Result<(), PlaybackError>) {
        let result = self.pair.shutdown().await;
        (self.pair, result)
    }
}
