//! Mock pipeline engine for testing
//!
//! Every mock shares one [`Timeline`], which records calls in order and
//! counts engine-level violations: a `run` while another pipeline is still
//! running. Tests also play the engine's part through it: ending a stream
//! or deciding what format a decoder will report.

#![cfg(any(test, feature = "std"))]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::channel::{Channel, ContentLocator};
use crate::pipeline::{
    OutputSubChannel, Pipeline, PipelineBuilder, PipelineFault, PipelineSpec, PipelineState,
    SampleFormat,
};
use crate::volume::{OutputDevice, VolumePercent};

/// One recorded engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Pipeline built.
    Build(PipelineSpec),
    /// `run`.
    Run,
    /// `stop`.
    Stop,
    /// `wait_for_stop`.
    WaitForStop,
    /// `terminate`.
    Terminate,
    /// `reset_buffers`.
    ResetBuffers,
    /// `set_source_locator`.
    SetLocator(ContentLocator),
    /// `set_sink_format`.
    SetSinkFormat(SampleFormat),
    /// Output device volume change.
    SetVolume(OutputSubChannel, VolumePercent),
}

#[derive(Debug, Default)]
struct TimelineState {
    calls: Vec<(Option<Channel>, Call)>,
    running: [bool; 2],
    violations: usize,
    stop_failures: [usize; 2],
    terminate_failures: [usize; 2],
    run_failures: [usize; 2],
    ended: [bool; 2],
    stream_formats: [Option<SampleFormat>; 2],
}

/// Shared call log and fault injector.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    state: Arc<Mutex<TimelineState>>,
}

fn take_failure(counter: &mut [usize; 2], channel: Channel) -> bool {
    match counter.get_mut(channel.index()) {
        Some(n) if *n > 0 => {
            *n = n.saturating_sub(1);
            true
        }
        _ => false,
    }
}

impl Timeline {
    /// Empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, channel: Option<Channel>, call: Call) {
        self.lock().calls.push((channel, call));
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<(Option<Channel>, Call)> {
        self.lock().calls.clone()
    }

    /// Calls made on `channel`'s pipeline.
    pub fn calls_for(&self, channel: Channel) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|(c, _)| *c == Some(channel))
            .map(|(_, call)| *call)
            .collect()
    }

    /// Index of the first `call` on `channel`, if recorded.
    pub fn position(&self, channel: Channel, call: Call) -> Option<usize> {
        self.lock()
            .calls
            .iter()
            .position(|entry| *entry == (Some(channel), call))
    }

    /// Index of the last `call` on `channel`, if recorded.
    pub fn last_position(&self, channel: Channel, call: Call) -> Option<usize> {
        self.lock()
            .calls
            .iter()
            .rposition(|entry| *entry == (Some(channel), call))
    }

    /// Times a pipeline started while another was running.
    pub fn violations(&self) -> usize {
        self.lock().violations
    }

    /// Pipelines currently running, as the engine sees it.
    pub fn running_count(&self) -> usize {
        self.lock().running.iter().filter(|r| **r).count()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// Fail the next `count` `stop` calls on `channel`.
    pub fn fail_stop(&self, channel: Channel, count: usize) {
        if let Some(slot) = self.lock().stop_failures.get_mut(channel.index()) {
            *slot = count;
        }
    }

    /// Fail the next `count` `terminate` calls on `channel`.
    pub fn fail_terminate(&self, channel: Channel, count: usize) {
        if let Some(slot) = self.lock().terminate_failures.get_mut(channel.index()) {
            *slot = count;
        }
    }

    /// Fail the next `count` `run` calls on `channel`.
    pub fn fail_run(&self, channel: Channel, count: usize) {
        if let Some(slot) = self.lock().run_failures.get_mut(channel.index()) {
            *slot = count;
        }
    }

    /// The running pipeline on `channel` reaches end of stream: it reports
    /// `Finished` until it is run again. No effect unless it is running.
    pub fn end_of_stream(&self, channel: Channel) {
        let mut state = self.lock();
        let idx = channel.index();
        if state.running.get(idx).copied() == Some(true) {
            if let Some(flag) = state.ended.get_mut(idx) {
                *flag = true;
            }
            if let Some(flag) = state.running.get_mut(idx) {
                *flag = false;
            }
        }
    }

    /// Format `channel`'s decoder reports while its pipeline runs.
    pub fn set_stream_format(&self, channel: Channel, format: SampleFormat) {
        if let Some(slot) = self.lock().stream_formats.get_mut(channel.index()) {
            *slot = Some(format);
        }
    }

    fn ended(&self, channel: Channel) -> bool {
        self.lock().ended.get(channel.index()).copied().unwrap_or(false)
    }

    fn stream_format(&self, channel: Channel) -> Option<SampleFormat> {
        self.lock().stream_formats.get(channel.index()).copied().flatten()
    }
}

/// Engine pipeline stand-in.
#[derive(Debug)]
pub struct MockPipeline {
    channel: Channel,
    timeline: Timeline,
    state: PipelineState,
}

impl MockPipeline {
    /// Pipeline for `channel` logging into `timeline`.
    pub fn new(channel: Channel, timeline: Timeline) -> Self {
        Self {
            channel,
            timeline,
            state: PipelineState::Init,
        }
    }

    fn set_running(&self, running: bool) {
        let mut state = self.timeline.lock();
        let idx = self.channel.index();
        if let Some(flag) = state.running.get_mut(idx) {
            *flag = running;
        }
        if let Some(flag) = state.ended.get_mut(idx) {
            *flag = false;
        }
    }
}

impl Pipeline for MockPipeline {
    async fn run(&mut self) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::Run);
        {
            let mut state = self.timeline.lock();
            if take_failure(&mut state.run_failures, self.channel) {
                return Err(PipelineFault::Rejected);
            }
            let other = state.running.get(self.channel.other().index()).copied();
            if other == Some(true) {
                state.violations = state.violations.saturating_add(1);
            }
        }
        self.set_running(true);
        self.state = PipelineState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::Stop);
        if take_failure(&mut self.timeline.lock().stop_failures, self.channel) {
            return Err(PipelineFault::Timeout);
        }
        self.state = PipelineState::Paused;
        Ok(())
    }

    async fn wait_for_stop(&mut self) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::WaitForStop);
        // Draining takes at least one scheduler turn.
        embassy_futures::yield_now().await;
        self.set_running(false);
        self.state = PipelineState::Stopped;
        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::Terminate);
        if take_failure(&mut self.timeline.lock().terminate_failures, self.channel) {
            return Err(PipelineFault::Rejected);
        }
        self.set_running(false);
        self.state = PipelineState::Init;
        Ok(())
    }

    fn reset_buffers(&mut self) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::ResetBuffers);
        Ok(())
    }

    fn set_source_locator(&mut self, locator: ContentLocator) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::SetLocator(locator));
        Ok(())
    }

    fn set_sink_format(&mut self, format: SampleFormat) -> Result<(), PipelineFault> {
        self.timeline.record(Some(self.channel), Call::SetSinkFormat(format));
        Ok(())
    }

    fn decoder_format(&self) -> Option<SampleFormat> {
        match self.state() {
            PipelineState::Running => self.timeline.stream_format(self.channel),
            _ => None,
        }
    }

    fn state(&self) -> PipelineState {
        match self.state {
            PipelineState::Running if self.timeline.ended(self.channel) => PipelineState::Finished,
            state => state,
        }
    }
}

/// Builds [`MockPipeline`]s on a shared timeline.
#[derive(Debug, Clone, Default)]
pub struct MockBuilder {
    timeline: Timeline,
    fail_builds: usize,
}

impl MockBuilder {
    /// Builder logging into `timeline`.
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            fail_builds: 0,
        }
    }

    /// Fail the next `count` builds.
    #[must_use]
    pub fn failing(mut self, count: usize) -> Self {
        self.fail_builds = count;
        self
    }
}

impl PipelineBuilder for MockBuilder {
    type Pipeline = MockPipeline;

    fn build(&mut self, spec: PipelineSpec) -> Result<MockPipeline, PipelineFault> {
        self.timeline.record(Some(spec.channel), Call::Build(spec));
        if self.fail_builds > 0 {
            self.fail_builds = self.fail_builds.saturating_sub(1);
            return Err(PipelineFault::Io);
        }
        Ok(MockPipeline::new(spec.channel, self.timeline.clone()))
    }
}

/// Output device that records volume changes.
#[derive(Debug, Clone, Default)]
pub struct MockOutput {
    timeline: Timeline,
}

impl MockOutput {
    /// Output logging into `timeline`.
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl OutputDevice for MockOutput {
    async fn set_volume(
        &mut self,
        output: OutputSubChannel,
        volume: VolumePercent,
    ) -> Result<(), PipelineFault> {
        self.timeline.record(None, Call::SetVolume(output, volume));
        Ok(())
    }
}
