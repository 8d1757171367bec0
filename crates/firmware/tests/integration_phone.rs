//! End-to-end phone scenarios on the mock bus and mock pipeline engine.
//!
//! Each test wires the real expander driver, input sources, application
//! policy and arbitrator together; only the I2C controller and the pipeline
//! engine are mocks.
//!
//! Run with: cargo test -p firmware --test integration_phone

#![allow(clippy::unwrap_used)]
#![allow(clippy::arithmetic_side_effects)]

use embassy_futures::select::{select, select3, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel as Queue;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use firmware::config::{
    capture_register, expander_config, matrix_layout, pair_config, CALLER_CLIP,
    INTERRUPT_READ_ATTEMPTS, REC_LINE, RINGTONE,
};
use firmware::{
    arbitrator_task, bring_up, input_task, send_command, AppConfig, EventQueue, PhoneApp,
};
use platform::mocks::MockI2c;
use platform::{
    ExpanderConfig, GpioExpander, InputSource, InterruptInput, LineId, MatrixLayout, PollMode,
    PollingInput, Register, SharedI2cBus, SignalEdges,
};
use playback::mocks::{Call, MockBuilder, MockOutput, MockPipeline, Timeline};
use playback::{
    ArbiterEvent, Arbitrator, Channel, ChannelPipelinePair, ChannelState, CommandPolicy,
    PlaybackCommand,
};

type Bus = SharedI2cBus<NoopRawMutex, MockI2c>;
type PhoneArbitrator = Arbitrator<MockPipeline, MockOutput, PhoneApp>;

fn fast_config() -> ExpanderConfig {
    expander_config()
        .with_settle(Duration::from_ticks(0))
        .with_retry_backoff(Duration::from_ticks(0))
}

fn arbitrator(timeline: &Timeline, app: PhoneApp) -> PhoneArbitrator {
    let mut builder = MockBuilder::new(timeline.clone());
    let pair =
        ChannelPipelinePair::build(&mut builder, MockOutput::new(timeline.clone()), pair_config())
            .unwrap();
    Arbitrator::new(pair, app)
}

fn runs(timeline: &Timeline, channel: Channel) -> usize {
    timeline
        .calls_for(channel)
        .iter()
        .filter(|call| **call == Call::Run)
        .count()
}

/// Wait for the next event, giving up after `ms`.
async fn next_within<S: InputSource>(source: &mut S, ms: u64) -> Option<platform::InputEvent> {
    match select(source.next_event(), Timer::after(Duration::from_millis(ms))).await {
        Either::First(event) => Some(event),
        Either::Second(()) => None,
    }
}

// ─── REC line, interrupt strategy ────────────────────────────────────────────

#[tokio::test]
async fn test_rec_rise_plays_caller_once() {
    let mock = MockI2c::default();
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());
    assert!(bring_up(&expander).await);

    let edges: Signal<NoopRawMutex, LineId> = Signal::new();
    let mut input = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    mock.script_reads(Register::Intcap0, &[0x08, 0x08, 0x08]);

    let timeline = Timeline::new();
    let mut arbitrator = arbitrator(&timeline, PhoneApp::default());
    let mut app = PhoneApp::default();
    let mut commands = Vec::new();

    for _ in 0..3 {
        edges.signal(REC_LINE);
        if let Some(event) = next_within(&mut input, 50).await {
            if let Some(command) = app.on_input(&event) {
                commands.push(command);
            }
            arbitrator.handle(ArbiterEvent::Input(event)).await;
        }
    }

    assert_eq!(commands, vec![PlaybackCommand::PlayOnChannel(Channel::B, CALLER_CLIP)]);
    assert_eq!(runs(&timeline, Channel::B), 1);
    assert_eq!(runs(&timeline, Channel::A), 0);
    assert_eq!(arbitrator.pair().state(Channel::B), ChannelState::Running);
    assert_eq!(input.snapshot().value(), 0x08);
}

#[tokio::test]
async fn test_rec_release_stops_caller() {
    let mock = MockI2c::default();
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());
    assert!(bring_up(&expander).await);

    let edges: Signal<NoopRawMutex, LineId> = Signal::new();
    let mut input = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    mock.script_reads(Register::Intcap0, &[0x08, 0x00]);

    let timeline = Timeline::new();
    let mut arbitrator = arbitrator(&timeline, PhoneApp::default());

    for _ in 0..2 {
        edges.signal(REC_LINE);
        let event = next_within(&mut input, 50).await.unwrap();
        arbitrator.handle(ArbiterEvent::Input(event)).await;
    }

    assert_eq!(runs(&timeline, Channel::B), 1);
    assert!(timeline.position(Channel::B, Call::Terminate).is_some());
    assert_eq!(arbitrator.pair().running_channel(), None);
}

#[tokio::test]
async fn test_flaky_capture_read_still_delivers() {
    let mock = MockI2c::default();
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());
    assert!(bring_up(&expander).await);
    let resets_after_bring_up = mock.fifo_resets();

    let edges: Signal<NoopRawMutex, LineId> = Signal::new();
    let mut input = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    mock.set_register(Register::Intcap0, 0x08);
    mock.fail_next_reads(3);

    edges.signal(REC_LINE);
    let event = next_within(&mut input, 50).await.unwrap();

    assert_eq!(event.value, 0x08);
    assert_eq!(mock.fifo_resets(), resets_after_bring_up);
}

// ─── Switch matrix, polling strategy ─────────────────────────────────────────

#[tokio::test]
async fn test_matrix_close_rings_on_a() {
    let mock = MockI2c::default();
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());
    assert!(bring_up(&expander).await);

    let layout = MatrixLayout {
        settle: Duration::from_ticks(0),
        ..matrix_layout()
    };
    mock.set_matrix(layout.drive, layout.sense, &[(0x40, 0x03)]);
    let mut input = PollingInput::new(
        &expander,
        PollMode::Matrix(layout),
        Duration::from_millis(5),
        0x00,
    );

    let timeline = Timeline::new();
    let mut arbitrator = arbitrator(&timeline, PhoneApp::default());

    assert_eq!(input.poll_once().await, 1);
    let event = input.next_event().await;
    arbitrator.handle(ArbiterEvent::Input(event)).await;

    assert_eq!(arbitrator.pair().state(Channel::A), ChannelState::Running);
    assert_eq!(arbitrator.pair().locator(Channel::A), Some(RINGTONE));

    // Same closure on the next scan: nothing new.
    assert_eq!(input.poll_once().await, 0);
    assert_eq!(runs(&timeline, Channel::A), 1);
}

// ─── Bring-up ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_bring_up_disables_playback() {
    // Device answers at a different address: the ping is not acknowledged.
    let mock = MockI2c::new(0x27);
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());

    let ready = bring_up(&expander).await;
    assert!(!ready);

    let app = PhoneApp::with_readiness(AppConfig::DEFAULT, ready);
    assert_eq!(app.boot_command(), None);

    let edges: Signal<NoopRawMutex, LineId> = Signal::new();
    let mut input = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    edges.signal(REC_LINE);
    // Every read fails fast while uninitialized, so the edge is dropped.
    assert!(next_within(&mut input, 20).await.is_none());

    let timeline = Timeline::new();
    let mut arbitrator = arbitrator(&timeline, app);
    arbitrator
        .handle(ArbiterEvent::Input(platform::InputEvent {
            origin: platform::InputOrigin::Line(REC_LINE),
            changed: true,
            value: 0x08,
            previous: 0x00,
            timestamp: embassy_time::Instant::from_ticks(0),
        }))
        .await;
    assert_eq!(runs(&timeline, Channel::A) + runs(&timeline, Channel::B), 0);
}

// ─── Task wiring ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tasks_ring_on_boot_then_hand_over_to_caller() {
    let mock = MockI2c::default();
    let bus = Bus::new(mock.clone());
    let expander = GpioExpander::new(&bus, fast_config());
    let app = PhoneApp::with_readiness(AppConfig::DEFAULT, bring_up(&expander).await);

    let edges: Signal<NoopRawMutex, LineId> = Signal::new();
    let input = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    mock.set_register(Register::Intcap0, 0x08);

    let timeline = Timeline::new();
    let mut arbitrator = arbitrator(&timeline, app);
    let queue: EventQueue<NoopRawMutex> = Queue::new();

    let script = async {
        if let Some(command) = app.boot_command() {
            assert!(send_command(&queue.sender(), command));
        }
        Timer::after(Duration::from_millis(20)).await;
        edges.signal(REC_LINE);
        Timer::after(Duration::from_millis(20)).await;
    };
    select3(
        input_task(input, queue.sender()),
        arbitrator_task(&mut arbitrator, queue.receiver()),
        script,
    )
    .await;

    // A rang first, then was torn down before B started.
    let a_terminated = timeline.last_position(Channel::A, Call::Terminate).unwrap();
    let b_run = timeline.position(Channel::B, Call::Run).unwrap();
    assert!(timeline.position(Channel::A, Call::Run).unwrap() < a_terminated);
    assert!(a_terminated < b_run);
    assert_eq!(timeline.violations(), 0);
    assert_eq!(arbitrator.pair().running_channel(), Some(Channel::B));

    let (_pair, result) = arbitrator.shutdown().await;
    assert!(result.is_ok());
    assert_eq!(timeline.running_count(), 0);
}
