//! Interrupt-driven input: read the capture register after each edge.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;

use super::{InputEvent, InputOrigin, InputSnapshot, InputSource, LineId};
use crate::expander::{GpioExpander, Register};
use crate::i2c_bus::BusController;

/// Something that reports which line raised the expander's INT output.
pub trait EdgeSource {
    /// Wait for the next edge.
    fn wait_for_edge(&mut self) -> impl core::future::Future<Output = LineId>;

    /// Forget an edge that arrived but was not yet consumed.
    fn discard_pending(&mut self) {}
}

/// [`EdgeSource`] fed from an interrupt handler through a [`Signal`].
///
/// The handler calls `signal.signal(line)`; back-to-back edges before the
/// task wakes collapse into one, which the capture read covers anyway.
pub struct SignalEdges<'a, M: RawMutex> {
    signal: &'a Signal<M, LineId>,
}

impl<'a, M: RawMutex> SignalEdges<'a, M> {
    /// Listen on `signal`.
    pub fn new(signal: &'a Signal<M, LineId>) -> Self {
        Self { signal }
    }
}

impl<M: RawMutex> EdgeSource for SignalEdges<'_, M> {
    async fn wait_for_edge(&mut self) -> LineId {
        self.signal.wait().await
    }

    fn discard_pending(&mut self) {
        self.signal.reset();
    }
}

/// Edge-triggered input for one logical line.
///
/// Edges on other lines are ignored. The capture register is read with
/// bounded retry; an exhausted read drops the edge.
pub struct InterruptInput<'a, M: RawMutex, C, E> {
    expander: &'a GpioExpander<'a, M, C>,
    edges: E,
    line: LineId,
    capture: Register,
    attempts: u8,
    snapshot: InputSnapshot,
}

impl<'a, M: RawMutex, C: BusController, E: EdgeSource> InterruptInput<'a, M, C, E> {
    /// Watch `line`, reading `capture` with up to `attempts` tries per edge.
    pub fn new(
        expander: &'a GpioExpander<'a, M, C>,
        edges: E,
        line: LineId,
        capture: Register,
        attempts: u8,
        baseline: u8,
    ) -> Self {
        Self {
            expander,
            edges,
            line,
            capture,
            attempts,
            snapshot: InputSnapshot::new(baseline),
        }
    }

    /// Last observed capture value.
    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }
}

impl<M: RawMutex, C: BusController, E: EdgeSource> InputSource for InterruptInput<'_, M, C, E> {
    async fn next_event(&mut self) -> InputEvent {
        loop {
            let line = self.edges.wait_for_edge().await;
            if line != self.line {
                trace!("input: edge on line {} ignored", line.bit());
                continue;
            }
            match self
                .expander
                .read_register_with_retry(self.capture, self.attempts)
                .await
            {
                Ok(value) => {
                    let event = self
                        .snapshot
                        .observe(InputOrigin::Line(line), value, Instant::now());
                    if event.changed {
                        return event;
                    }
                    trace!("input: duplicate capture {} suppressed", value);
                }
                Err(e) => warn!("input: capture read after edge skipped: {}", e),
            }
        }
    }

    fn restart(&mut self) {
        self.edges.discard_pending();
    }
}
