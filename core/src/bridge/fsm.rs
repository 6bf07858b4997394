use tracing::{debug, trace};

use super::geometry::{BridgeConfig, BridgeGeometry};
use crate::core::{HostBus, NativePort, PortBridge};
use crate::error::ConfigError;

/// Host bus to native port bridge.
///
/// Each host transaction is drained as `ratio` strictly sequential native
/// beats. Beat `i + 1` is never presented before beat `i` is accepted
/// (writes) or its read data has returned (reads), since the responder
/// returns data in command order and nothing tags the beats.
///
/// # States
///
/// | State                 | Drives                                  | Leaves when                     |
/// |-----------------------|-----------------------------------------|---------------------------------|
/// | `Idle`                | nothing                                 | `cyc && stb` sampled            |
/// | `Active(Issue)`       | `cmd` (+ `wdata` for writes)            | command (+ data) accepted       |
/// | `Active(AwaitRead)`   | `rdata.ready`                           | read beat delivered             |
///
/// After the last beat, `ack` is asserted for that one step (with the merged
/// word on `dat_r` for reads) and the machine returns to `Idle`. The host
/// request is not sampled again until the following step, and dropping
/// `cyc`/`stb` while active does not cancel the transaction.
pub struct Bridge {
    geometry: BridgeGeometry,
    state: BridgeState,
    beat_index: u32,
    latched: Latched,
    accumulator: Vec<u64>, // one native slice per beat
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Active(BeatPhase),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeatPhase {
    /// Command (and write data) presented for the current beat.
    Issue,
    /// Read command accepted, waiting for its data beat.
    AwaitRead,
}

/// Host request captured when leaving `Idle`.
#[derive(Clone, Copy, Debug, Default)]
struct Latched {
    address: u64,
    we: bool,
    data: u64,
    sel: u8,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigError> {
        let geometry = BridgeGeometry::new(&config)?;
        debug!(
            host_width = geometry.host_data_width(),
            native_width = geometry.native_data_width(),
            ratio = geometry.ratio(),
            base_word_offset = geometry.base_word_offset(),
            "bridge configured"
        );
        Ok(Self {
            geometry,
            state: BridgeState::Idle,
            beat_index: 0,
            latched: Latched::default(),
            accumulator: vec![0; geometry.ratio() as usize],
        })
    }

    /// Build a bridge matching the widths of two existing bus bundles.
    pub fn for_interfaces(
        host: &HostBus,
        port: &NativePort,
        base_address: u64,
    ) -> Result<Self, ConfigError> {
        Self::new(
            BridgeConfig::new(host.data_width(), port.address_width(), port.data_width())
                .with_base_address(base_address),
        )
    }

    pub fn geometry(&self) -> &BridgeGeometry {
        &self.geometry
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == BridgeState::Idle
    }

    /// Beat currently being issued (0 while idle).
    pub fn beat_index(&self) -> u32 {
        self.beat_index
    }

    /// Abandon any transaction in flight and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = BridgeState::Idle;
        self.beat_index = 0;
        self.latched = Latched::default();
        self.accumulator.fill(0);
    }

    fn start(&mut self, host: &HostBus) {
        self.latched = Latched {
            address: host.adr,
            we: host.we,
            data: host.dat_w & self.geometry.host_word_mask(),
            sel: host.sel & host.full_select(),
        };
        self.beat_index = 0;
        self.accumulator.fill(0);
        self.state = BridgeState::Active(BeatPhase::Issue);
        debug!(
            address = self.latched.address,
            write = self.latched.we,
            "host transaction started"
        );
    }

    fn issue(&mut self, port: &mut NativePort) -> bool {
        let beat = self.beat_index;
        port.cmd.addr = self.geometry.native_address(self.latched.address, beat);
        port.cmd.we = self.latched.we;

        if self.latched.we {
            port.wdata.data = self.geometry.slice(self.latched.data, beat);
            port.wdata.we = self.geometry.select_slice(self.latched.sel, beat);
            // Command and data are accepted together or not at all.
            port.cmd.valid = port.wdata.ready;
            port.wdata.valid = port.cmd.ready;
            let accepted = port.cmd.fire() && port.wdata.fire();
            if accepted {
                trace!(beat, addr = port.cmd.addr, data = port.wdata.data, "write beat accepted");
            }
            accepted
        } else {
            port.cmd.valid = true;
            if port.cmd.fire() {
                trace!(beat, addr = port.cmd.addr, "read command accepted");
                self.state = BridgeState::Active(BeatPhase::AwaitRead);
            }
            false
        }
    }

    fn await_read(&mut self, port: &mut NativePort) -> bool {
        port.rdata.ready = true;
        if !port.rdata.fire() {
            return false;
        }
        let beat = self.beat_index;
        self.accumulator[beat as usize] = port.rdata.data;
        trace!(beat, data = port.rdata.data, "read beat returned");
        true
    }

    /// Count an accepted beat; acknowledge the host after the last one.
    fn advance(&mut self, host: &mut HostBus) -> bool {
        self.beat_index += 1;
        if self.beat_index < self.geometry.ratio() {
            self.state = BridgeState::Active(BeatPhase::Issue);
            return false;
        }

        if !self.latched.we {
            host.dat_r = self.geometry.merge(&self.accumulator);
        }
        host.ack = true;
        let data = if self.latched.we { self.latched.data } else { host.dat_r };
        debug!(
            address = self.latched.address,
            write = self.latched.we,
            data,
            "host transaction acknowledged"
        );
        self.state = BridgeState::Idle;
        self.beat_index = 0;
        true
    }
}

impl PortBridge for Bridge {
    fn tick_with_buses(&mut self, host: &mut HostBus, port: &mut NativePort) -> bool {
        port.clear_requests();
        host.ack = false;

        let beat_done = match self.state {
            BridgeState::Idle => {
                if host.request() {
                    self.start(host);
                }
                false
            }
            BridgeState::Active(BeatPhase::Issue) => self.issue(port),
            BridgeState::Active(BeatPhase::AwaitRead) => self.await_read(port),
        };

        beat_done && self.advance(host)
    }
}
