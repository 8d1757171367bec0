//! Task bodies: the input producer and the arbitrator consumer.
//!
//! # Architecture
//!
//! One [`EventQueue`] carries input events, pipeline notifications and
//! injected commands to the arbitrator. Producers never block on it:
//! [`try_send_event`] drops the event with a warning when the queue is full,
//! so a stalled arbitrator cannot wedge the input task or the engine's
//! callback context. [`EVENT_QUEUE_DEPTH`] controls how many events may
//! queue before drops begin.
//!
//! The functions here are plain `async fn`s generic over the mutex flavour
//! and the input strategy. Board code wraps them in concrete executor tasks.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use platform::InputSource;
use playback::{
    ArbiterEvent, Arbitrator, CommandPolicy, OutputDevice, Pipeline, PipelineEvent,
    PlaybackCommand,
};

pub use crate::config::EVENT_QUEUE_DEPTH;

/// The merged arbitrator queue.
pub type EventQueue<M> = Channel<M, ArbiterEvent, EVENT_QUEUE_DEPTH>;

/// Producer end of an [`EventQueue`].
pub type EventSender<'a, M> = Sender<'a, M, ArbiterEvent, EVENT_QUEUE_DEPTH>;

/// Consumer end of an [`EventQueue`].
pub type EventReceiver<'a, M> = Receiver<'a, M, ArbiterEvent, EVENT_QUEUE_DEPTH>;

/// Queue `event` without waiting.
///
/// Returns `false` if the queue was full and the event was dropped.
pub fn try_send_event<M: RawMutex>(sender: &EventSender<'_, M>, event: ArbiterEvent) -> bool {
    match sender.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_dropped)) => {
            warn!("tasks: event queue full ({} deep), event dropped", EVENT_QUEUE_DEPTH);
            false
        }
    }
}

/// Forward an engine lifecycle notification.
pub fn notify_pipeline<M: RawMutex>(sender: &EventSender<'_, M>, event: PipelineEvent) -> bool {
    try_send_event(sender, ArbiterEvent::Pipeline(event))
}

/// Inject a command as if it came from the application.
pub fn send_command<M: RawMutex>(sender: &EventSender<'_, M>, command: PlaybackCommand) -> bool {
    try_send_event(sender, ArbiterEvent::Command(command))
}

/// Pull events from `source` forever and queue them for the arbitrator.
pub async fn input_task<M: RawMutex, S: InputSource>(mut source: S, sender: EventSender<'_, M>) -> ! {
    info!("tasks: input task running");
    loop {
        let event = source.next_event().await;
        trace!("tasks: input {} -> {}", event.previous, event.value);
        try_send_event(&sender, ArbiterEvent::Input(event));
    }
}

/// Run the arbitrator loop forever.
pub async fn arbitrator_task<M, P, O, Y>(
    arbitrator: &mut Arbitrator<P, O, Y>,
    receiver: EventReceiver<'_, M>,
) -> !
where
    M: RawMutex,
    P: Pipeline,
    O: OutputDevice,
    Y: CommandPolicy,
{
    arbitrator.run(receiver).await
}
