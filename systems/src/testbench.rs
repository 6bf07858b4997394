use beatbridge_core::bridge::{Bridge, BridgeConfig};
use beatbridge_core::core::{
    Component, HostBus, HostBusMaster, NativePort, PortBridge, PortResponder,
};
use beatbridge_core::device::{HostCompletion, HostMaster, HostTransaction, MemoryTiming, NativeMemory};
use beatbridge_core::error::ConfigError;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Steps a single transaction may take before it is reported as stalled.
pub const DEFAULT_STEP_LIMIT: u64 = 10_000;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid bridge configuration: {0}")]
    Config(#[from] ConfigError),

    /// The bridge never acknowledged; the responder stopped answering.
    #[error("transaction at host address 0x{address:X} stalled after {cycles} steps")]
    Stalled { address: u64, cycles: u64 },

    #[error("readback mismatch at host address 0x{address:X}: wrote 0x{expected:X}, read 0x{actual:X}")]
    ReadbackMismatch {
        address: u64,
        expected: u64,
        actual: u64,
    },
}

/// Host master, bridge and a native port responder stepped together.
///
/// Each [`step`](Self::step) runs one cycle in a fixed order:
///
/// 1. responder drives its ready/valid outputs (from its own state only)
/// 2. host master drives the request
/// 3. bridge runs its state transition
/// 4. responder consumes fired handshakes, then advances its clock
///    ([`Component::tick`])
/// 5. host master samples `ack`/`dat_r`
///
/// Stall detection lives here rather than in the bridge, which has no
/// notion of timeouts.
pub struct Testbench<R = NativeMemory> {
    host: HostBus,
    port: NativePort,
    master: HostMaster,
    bridge: Bridge,
    responder: R,
    config: BridgeConfig,
    cycle: u64,
    step_limit: u64,
}

impl Testbench<NativeMemory> {
    /// Bridge in front of a fresh [`NativeMemory`] with the given timing.
    pub fn new(config: BridgeConfig, timing: MemoryTiming) -> Result<Self, ConfigError> {
        let memory = NativeMemory::new(config.native_data_width, timing);
        Self::with_responder(config, memory)
    }

    pub fn memory(&self) -> &NativeMemory {
        &self.responder
    }

    pub fn memory_mut(&mut self) -> &mut NativeMemory {
        &mut self.responder
    }
}

impl<R: PortResponder + Component> Testbench<R> {
    pub fn with_responder(config: BridgeConfig, responder: R) -> Result<Self, ConfigError> {
        let bridge = Bridge::new(config)?;
        Ok(Self {
            host: HostBus::new(config.host_data_width),
            port: NativePort::new(config.native_address_width, config.native_data_width),
            master: HostMaster::new(),
            bridge,
            responder,
            config,
            cycle: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Run one cycle. Returns true if the host saw an acknowledge.
    pub fn step(&mut self) -> bool {
        self.responder.drive(&mut self.port);
        self.master.drive(&mut self.host);
        self.bridge.tick_with_buses(&mut self.host, &mut self.port);
        self.responder.sample(&self.port);
        if self.responder.tick() {
            trace!(cycle = self.cycle, "read response due");
        }
        self.cycle += 1;
        self.master.observe(&self.host)
    }

    /// Queue a transaction without stepping.
    pub fn submit(&mut self, transaction: HostTransaction) {
        self.master.submit(transaction);
    }

    /// Step until every queued transaction has been acknowledged.
    pub fn run_until_idle(&mut self) -> Result<Vec<HostCompletion>, SimError> {
        let mut since_progress = 0;
        while self.master.is_busy() {
            if self.step() {
                since_progress = 0;
                continue;
            }
            since_progress += 1;
            if since_progress >= self.step_limit {
                let address = self.master.current().map_or(0, |tx| tx.address);
                warn!(address, cycles = since_progress, "transaction stalled");
                return Err(SimError::Stalled {
                    address,
                    cycles: since_progress,
                });
            }
        }
        Ok(self.master.take_completions())
    }

    /// Run one transaction to completion.
    pub fn run(&mut self, transaction: HostTransaction) -> Result<HostCompletion, SimError> {
        self.submit(transaction);
        let completions = self.run_until_idle()?;
        let address = transaction.address;
        completions.last().copied().ok_or(SimError::Stalled { address, cycles: 0 })
    }

    pub fn write(&mut self, address: u64, data: u64) -> Result<(), SimError> {
        self.run(HostTransaction::write(address, data)).map(|_| ())
    }

    pub fn write_masked(&mut self, address: u64, data: u64, select: u8) -> Result<(), SimError> {
        self.run(HostTransaction::write_masked(address, data, select)).map(|_| ())
    }

    pub fn read(&mut self, address: u64) -> Result<u64, SimError> {
        let done = self.run(HostTransaction::read(address))?;
        Ok(done.read_data.unwrap_or_default())
    }

    /// Write each entry then read it back, failing on the first mismatch.
    pub fn run_pattern(&mut self, pattern: &[(u64, u64)]) -> Result<(), SimError> {
        let word_mask = self.bridge.geometry().host_word_mask();
        for &(address, data) in pattern {
            self.write(address, data)?;
            let actual = self.read(address)?;
            let expected = data & word_mask;
            if actual != expected {
                return Err(SimError::ReadbackMismatch {
                    address,
                    expected,
                    actual,
                });
            }
        }
        debug!(entries = pattern.len(), cycles = self.cycle, "pattern read back");
        Ok(())
    }

    /// Return bus, bridge and in-flight responder state to power-on.
    /// Responder storage is kept.
    pub fn reset(&mut self) {
        self.bridge.reset();
        self.master.reset();
        self.responder.reset();
        self.host = HostBus::new(self.config.host_data_width);
        self.port = NativePort::new(self.config.native_address_width, self.config.native_data_width);
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut R {
        &mut self.responder
    }

    pub fn host(&self) -> &HostBus {
        &self.host
    }

    pub fn port(&self) -> &NativePort {
        &self.port
    }

    /// Steps run since construction.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}
