use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::bridge::geometry::width_mask;
use crate::core::{Component, NativePort, PortResponder};

/// Timing knobs of the memory model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTiming {
    /// Steps between read command acceptance and its data becoming valid (min 1).
    pub read_latency: u32,
    /// `cmd.ready`/`wdata.ready` are asserted one step out of every `ready_period`.
    pub ready_period: u32,
}

impl Default for MemoryTiming {
    fn default() -> Self {
        Self {
            read_latency: 1,
            ready_period: 1,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingRead {
    addr: u64,
    data: u64,
    ready_at: u64,
}

/// Word-addressed storage answering the native port.
///
/// Accepts one command per fired `cmd` handshake. Write commands carry
/// their data beat in the same step; read commands queue a response that
/// is returned on `rdata` after `read_latency` steps. Responses leave the
/// queue strictly in command order. Storage is sparse and unwritten words
/// read as zero.
pub struct NativeMemory {
    data_width: u32,
    timing: MemoryTiming,
    words: BTreeMap<u64, u64>,
    pending: VecDeque<PendingRead>,
    cycle: u64,
}

impl NativeMemory {
    pub fn new(data_width: u32, timing: MemoryTiming) -> Self {
        Self {
            data_width,
            timing,
            words: BTreeMap::new(),
            pending: VecDeque::new(),
            cycle: 0,
        }
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn timing(&self) -> MemoryTiming {
        self.timing
    }

    /// Steps elapsed since construction.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn read_word(&self, addr: u64) -> u64 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    pub fn write_word(&mut self, addr: u64, data: u64) {
        self.words.insert(addr, data & width_mask(self.data_width));
    }

    /// Write only the byte lanes enabled in `we`.
    pub fn write_masked(&mut self, addr: u64, data: u64, we: u8) {
        let mut mask = 0u64;
        for lane in 0..self.data_width / 8 {
            if we & (1 << lane) != 0 {
                mask |= 0xFF << (lane * 8);
            }
        }
        let merged = (self.read_word(addr) & !mask) | (data & mask);
        self.write_word(addr, merged);
    }

    /// Preload storage, e.g. from a saved image.
    pub fn load(&mut self, image: &[(u64, u64)]) {
        for &(addr, data) in image {
            self.write_word(addr, data);
        }
    }

    /// All written words in address order.
    pub fn words(&self) -> &BTreeMap<u64, u64> {
        &self.words
    }

    /// Read responses queued but not yet delivered.
    pub fn pending_reads(&self) -> usize {
        self.pending.len()
    }

    /// Drop read responses that have not been delivered.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    fn ready_this_step(&self) -> bool {
        self.cycle % self.timing.ready_period.max(1) as u64 == 0
    }
}

impl PortResponder for NativeMemory {
    fn drive(&mut self, port: &mut NativePort) {
        port.clear_responses();
        let ready = self.ready_this_step();
        port.cmd.ready = ready;
        port.wdata.ready = ready;

        if let Some(head) = self.pending.front()
            && head.ready_at <= self.cycle
        {
            port.rdata.valid = true;
            port.rdata.data = head.data;
        }
    }

    fn sample(&mut self, port: &NativePort) {
        if port.cmd.fire() {
            let addr = port.cmd.addr;
            if !port.cmd.we {
                let data = self.read_word(addr);
                trace!(addr, data, "memory read queued");
                self.pending.push_back(PendingRead {
                    addr,
                    data,
                    ready_at: self.cycle + self.timing.read_latency.max(1) as u64,
                });
            } else if port.wdata.fire() {
                trace!(addr, data = port.wdata.data, we = port.wdata.we, "memory write");
                self.write_masked(addr, port.wdata.data, port.wdata.we);
            } else {
                warn!(addr, "write command accepted without its data beat");
            }
        }

        if port.rdata.fire()
            && let Some(done) = self.pending.pop_front()
        {
            trace!(addr = done.addr, data = done.data, "memory read delivered");
        }
    }

    fn reset(&mut self) {
        if !self.pending.is_empty() {
            debug!(dropped = self.pending.len(), "pending reads discarded");
        }
        self.clear_pending();
    }
}

impl Component for NativeMemory {
    /// Advance the memory clock. Returns true when a read response is due.
    fn tick(&mut self) -> bool {
        self.cycle += 1;
        self.pending
            .front()
            .is_some_and(|head| head.ready_at <= self.cycle)
    }
}
