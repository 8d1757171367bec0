//! Desktop phone simulator
//!
//! Runs the real input, application and arbitrator code against the mock
//! expander and mock pipeline engine, then plays a short script:
//!
//! 1. boot ring on channel A
//! 2. the matrix closes (ring again)
//! 3. REC goes active: A is torn down, the caller clip starts on B
//! 4. B's sink reports end of stream
//! 5. REC is released
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p firmware --example phone_sim --features emulator
//! ```

use embassy_futures::select::select4;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel as Queue;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use tracing_subscriber::EnvFilter;

use firmware::config::{
    capture_register, expander_config, matrix_layout, pair_config, INTERRUPT_READ_ATTEMPTS,
    POLL_PERIOD, REC_LINE,
};
use firmware::{
    arbitrator_task, bring_up, input_task, notify_pipeline, send_command, AppConfig, EventQueue,
    PhoneApp,
};
use platform::mocks::MockI2c;
use platform::{
    GpioExpander, InterruptInput, LineId, PollMode, PollingInput, Register, SharedI2cBus,
    SignalEdges,
};
use playback::mocks::{MockBuilder, MockOutput, Timeline};
use playback::{
    Arbitrator, Channel, ChannelPipelinePair, LifecycleKind, PipelineEvent, PipelineState, Stage,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Phone toy simulator");

    // Mock expander: REC capture on INTCAP0, matrix columns on GP1 / lines on GP0.
    let mock = MockI2c::default();
    let bus: SharedI2cBus<NoopRawMutex, MockI2c> = SharedI2cBus::new(mock.clone());
    let expander = GpioExpander::new(&bus, expander_config());
    let layout = matrix_layout();

    let app = PhoneApp::with_readiness(AppConfig::DEFAULT, bring_up(&expander).await);

    let timeline = Timeline::new();
    let mut builder = MockBuilder::new(timeline.clone());
    let pair = ChannelPipelinePair::build(&mut builder, MockOutput::new(timeline.clone()), pair_config())?;
    let mut arbitrator = Arbitrator::new(pair, app);

    let queue: EventQueue<NoopRawMutex> = Queue::new();
    let edges: Signal<NoopRawMutex, LineId> = Signal::new();

    let rec = InterruptInput::new(
        &expander,
        SignalEdges::new(&edges),
        REC_LINE,
        capture_register(),
        INTERRUPT_READ_ATTEMPTS,
        0x00,
    );
    let matrix = PollingInput::new(&expander, PollMode::Matrix(layout), POLL_PERIOD, 0x00);

    let script = async {
        if let Some(command) = app.boot_command() {
            send_command(&queue.sender(), command);
        }
        Timer::after(Duration::from_millis(300)).await;

        tracing::info!("script: matrix closes");
        mock.set_matrix(layout.drive, layout.sense, &[(0x40, 0x01)]);
        Timer::after(Duration::from_millis(500)).await;

        tracing::info!("script: REC active");
        mock.set_register(Register::Intcap0, REC_LINE.mask());
        edges.signal(REC_LINE);
        Timer::after(Duration::from_millis(300)).await;

        tracing::info!("script: caller clip ends");
        timeline.end_of_stream(Channel::B);
        notify_pipeline(
            &queue.sender(),
            PipelineEvent {
                channel: Channel::B,
                stage: Stage::Sink,
                kind: LifecycleKind::StateChanged(PipelineState::Finished),
            },
        );
        Timer::after(Duration::from_millis(100)).await;

        tracing::info!("script: REC released");
        mock.set_register(Register::Intcap0, 0x00);
        edges.signal(REC_LINE);
        Timer::after(Duration::from_millis(300)).await;
    };

    select4(
        input_task(rec, queue.sender()),
        input_task(matrix, queue.sender()),
        arbitrator_task(&mut arbitrator, queue.receiver()),
        script,
    )
    .await;

    let (_pair, result) = arbitrator.shutdown().await;
    result?;

    tracing::info!(
        "done: {} engine calls, {} bus transactions, {} FIFO resets, {} exclusivity violations",
        timeline.calls().len(),
        mock.transactions(),
        mock.fifo_resets(),
        timeline.violations()
    );
    Ok(())
}
