use beatbridge_core::core::{Component, NativePort, PortResponder};
use beatbridge_core::device::{MemoryTiming, NativeMemory};

/// A native command that fired, with the write beat that came with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredCommand {
    pub step: u64,
    pub addr: u64,
    pub we: bool,
    pub data: u64,
    pub mask: u8,
}

/// NativeMemory that records every fired handshake.
pub struct RecordingMemory {
    pub inner: NativeMemory,
    pub commands: Vec<FiredCommand>,
    pub read_beats: Vec<(u64, u64)>, // (step, data)
    step: u64,
}

impl RecordingMemory {
    pub fn new(data_width: u32, timing: MemoryTiming) -> Self {
        Self {
            inner: NativeMemory::new(data_width, timing),
            commands: Vec::new(),
            read_beats: Vec::new(),
            step: 0,
        }
    }

    pub fn writes(&self) -> Vec<(u64, u64)> {
        self.commands
            .iter()
            .filter(|c| c.we)
            .map(|c| (c.addr, c.data))
            .collect()
    }

    pub fn read_addresses(&self) -> Vec<u64> {
        self.commands
            .iter()
            .filter(|c| !c.we)
            .map(|c| c.addr)
            .collect()
    }
}

impl PortResponder for RecordingMemory {
    fn drive(&mut self, port: &mut NativePort) {
        self.inner.drive(port);
    }

    fn sample(&mut self, port: &NativePort) {
        if port.cmd.fire() {
            self.commands.push(FiredCommand {
                step: self.step,
                addr: port.cmd.addr,
                we: port.cmd.we,
                data: if port.cmd.we { port.wdata.data } else { 0 },
                mask: if port.cmd.we { port.wdata.we } else { 0 },
            });
        }
        if port.rdata.fire() {
            self.read_beats.push((self.step, port.rdata.data));
        }
        self.inner.sample(port);
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Component for RecordingMemory {
    fn tick(&mut self) -> bool {
        self.step += 1;
        self.inner.tick()
    }
}
