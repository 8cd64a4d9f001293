//! Recording transport shared by the unit tests

extern crate std;

use std::vec::Vec;

use crate::spi::{opcodes, StatusRegister};
use crate::transport::BitbangTransport;

/// One transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Clock(u8),
    FunctionSelect(bool),
    Begin,
    Byte(u8),
    Delay8,
    Go,
    DelayUs(u32),
}

/// Transport that records every call and answers status/ID reads
///
/// It does not model flash contents; the emulator crate does that.
pub struct RecordingTransport {
    events: Vec<Event>,
    opcode: Option<u8>,
    status: u8,
    busy_reads: u32,
    id: u32,
    status_reads: u32,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            opcode: None,
            status: 0,
            busy_reads: 0,
            id: 0,
            status_reads: 0,
        }
    }

    /// Report BUSY for the next `reads` status reads
    pub fn with_busy_reads(mut self, reads: u32) -> Self {
        self.busy_reads = reads;
        self
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    /// Bytes clocked in each transaction, split at `Begin`
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        let mut out: Vec<Vec<u8>> = Vec::new();
        for event in &self.events {
            match event {
                Event::Begin => out.push(Vec::new()),
                Event::Byte(b) => {
                    if let Some(last) = out.last_mut() {
                        last.push(*b);
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Transactions that started with `opcode`, without the opcode byte
    pub fn payloads(&self, opcode: u8) -> Vec<Vec<u8>> {
        self.transactions()
            .into_iter()
            .filter(|tx| tx.first() == Some(&opcode))
            .map(|tx| tx[1..].to_vec())
            .collect()
    }
}

impl BitbangTransport for RecordingTransport {
    fn set_clock_divisor(&mut self, divisor: u8) {
        self.events.push(Event::Clock(divisor));
    }

    fn set_function_select(&mut self, enabled: bool) {
        self.events.push(Event::FunctionSelect(enabled));
    }

    fn begin(&mut self) {
        self.opcode = None;
        self.events.push(Event::Begin);
    }

    fn write_byte(&mut self, byte: u8) {
        if self.opcode.is_none() {
            self.opcode = Some(byte);
        }
        self.events.push(Event::Byte(byte));
    }

    fn delay_8(&mut self) {
        self.events.push(Event::Delay8);
    }

    fn go(&mut self) {
        self.events.push(Event::Go);
    }

    fn read_data(&mut self) -> u32 {
        match self.opcode {
            Some(opcodes::RDSR) => {
                self.status_reads += 1;
                if self.busy_reads > 0 {
                    self.busy_reads -= 1;
                    (self.status | StatusRegister::BUSY.bits()) as u32
                } else {
                    self.status as u32
                }
            }
            Some(opcodes::RDID) => self.id,
            _ => 0,
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(Event::DelayUs(us));
    }
}
