//! Mock bus controller for testing
//!
//! [`MockI2c`] emulates a single expander on the bus: a register file behind
//! the select-then-access protocol, plus fault injection and a wire log.
//! Clones share state, so a test keeps one clone for inspection and moves
//! another into the [`SharedI2cBus`](crate::i2c_bus::SharedI2cBus).

#![cfg(any(test, feature = "std"))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};

use crate::expander::{address_byte, Register};
use crate::i2c_bus::BusController;

/// Error returned by [`MockI2c`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockI2cError(pub ErrorKind);

impl embedded_hal::i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct MockState {
    device_address: u8,
    registers: [u8; 12],
    selected: u8,
    fail_reads: usize,
    fail_any: usize,
    fault: ErrorKind,
    scripted: HashMap<u8, VecDeque<u8>>,
    matrix: Option<(Register, Register, Vec<(u8, u8)>)>,
    wire_log: Vec<Vec<u8>>,
    writes: Vec<(u8, u8)>,
    transactions: usize,
    fifo_resets: usize,
    in_flight: bool,
    overlaps: usize,
}

/// Scriptable single-device I2C controller.
#[derive(Debug, Clone)]
pub struct MockI2c {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new(crate::expander::DEFAULT_ADDRESS)
    }
}

impl MockI2c {
    /// Mock a device answering at `device_address`. Every other address NACKs.
    pub fn new(device_address: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                device_address,
                registers: [0; 12],
                selected: 0,
                fail_reads: 0,
                fail_any: 0,
                fault: ErrorKind::Bus,
                scripted: HashMap::new(),
                matrix: None,
                wire_log: Vec::new(),
                writes: Vec::new(),
                transactions: 0,
                fifo_resets: 0,
                in_flight: false,
                overlaps: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `count` transactions that contain a read phase.
    pub fn fail_next_reads(&self, count: usize) {
        self.lock().fail_reads = count;
    }

    /// Fail the next `count` transactions of any kind.
    pub fn fail_next(&self, count: usize) {
        self.lock().fail_any = count;
    }

    /// Error kind injected failures report (default [`ErrorKind::Bus`]).
    pub fn set_fault(&self, kind: ErrorKind) {
        self.lock().fault = kind;
    }

    /// Preload a register value.
    pub fn set_register(&self, register: Register, value: u8) {
        if let Some(slot) = self.lock().registers.get_mut(usize::from(register.addr())) {
            *slot = value;
        }
    }

    /// Current register value.
    pub fn register(&self, register: Register) -> u8 {
        self.lock()
            .registers
            .get(usize::from(register.addr()))
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot of the whole register file.
    pub fn registers(&self) -> [u8; 12] {
        self.lock().registers
    }

    /// Queue values returned by successive reads of `register`. Once drained,
    /// reads fall back to the register file.
    pub fn script_reads(&self, register: Register, values: &[u8]) {
        self.lock()
            .scripted
            .entry(register.addr())
            .or_default()
            .extend(values.iter().copied());
    }

    /// Emulate a switch matrix: reading `sense` returns the lines listed for
    /// the column mask currently latched in `drive`, or 0.
    pub fn set_matrix(&self, drive: Register, sense: Register, closed: &[(u8, u8)]) {
        self.lock().matrix = Some((drive, sense, closed.to_vec()));
    }

    /// Bytes seen on the wire, one entry per transaction, address bytes
    /// included (`[addr<<1|W, reg, value]`, `[addr<<1|W, reg, addr<<1|R, data]`).
    pub fn wire_log(&self) -> Vec<Vec<u8>> {
        self.lock().wire_log.clone()
    }

    /// Successful `(register, value)` writes, in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.lock().writes.clone()
    }

    /// Forget the wire log and the write history.
    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.wire_log.clear();
        state.writes.clear();
    }

    /// Transactions attempted, failed ones included.
    pub fn transactions(&self) -> usize {
        self.lock().transactions
    }

    /// Calls to `reset_fifos`.
    pub fn fifo_resets(&self) -> usize {
        self.lock().fifo_resets
    }

    /// Transactions that started while another was still in flight.
    pub fn overlaps(&self) -> usize {
        self.lock().overlaps
    }

    fn begin(&self) {
        let mut state = self.lock();
        if state.in_flight {
            state.overlaps = state.overlaps.saturating_add(1);
        }
        state.in_flight = true;
        state.transactions = state.transactions.saturating_add(1);
    }

    fn end(&self) {
        self.lock().in_flight = false;
    }
}

impl MockState {
    fn execute(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), MockI2cError> {
        if address != self.device_address {
            return Err(MockI2cError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
        }
        if self.fail_any > 0 {
            self.fail_any = self.fail_any.saturating_sub(1);
            return Err(MockI2cError(self.fault));
        }
        let has_read = operations.iter().any(|op| matches!(op, Operation::Read(_)));
        if has_read && self.fail_reads > 0 {
            self.fail_reads = self.fail_reads.saturating_sub(1);
            return Err(MockI2cError(self.fault));
        }

        let mut wire = Vec::new();
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    wire.push(address_byte(address, false));
                    wire.extend_from_slice(bytes);
                    if let Some(&register) = bytes.first() {
                        self.selected = register;
                    }
                    if let Some(&value) = bytes.get(1) {
                        if let Some(slot) = self.registers.get_mut(usize::from(self.selected)) {
                            *slot = value;
                        }
                        self.writes.push((self.selected, value));
                    }
                }
                Operation::Read(buf) => {
                    wire.push(address_byte(address, true));
                    for byte in buf.iter_mut() {
                        *byte = self.next_read();
                        wire.push(*byte);
                    }
                }
            }
        }
        self.wire_log.push(wire);
        Ok(())
    }

    fn next_read(&mut self) -> u8 {
        let selected = self.selected;
        if let Some(value) = self.scripted.get_mut(&selected).and_then(VecDeque::pop_front) {
            return value;
        }
        if let Some((drive, sense, closed)) = &self.matrix {
            if sense.addr() == selected {
                let column = self
                    .registers
                    .get(usize::from(drive.addr()))
                    .copied()
                    .unwrap_or(0);
                return closed
                    .iter()
                    .find(|(mask, _)| *mask == column)
                    .map_or(0, |(_, lines)| *lines);
            }
        }
        self.registers.get(usize::from(selected)).copied().unwrap_or(0)
    }
}

impl embedded_hal_async::i2c::ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl embedded_hal_async::i2c::I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.begin();
        // Let any other task run mid-transaction so unserialized access would
        // show up as an overlap.
        embassy_futures::yield_now().await;
        let result = self.lock().execute(address, operations);
        self.end();
        result
    }
}

impl BusController for MockI2c {
    fn reset_fifos(&mut self) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.fifo_resets = state.fifo_resets.saturating_add(1);
        Ok(())
    }
}
