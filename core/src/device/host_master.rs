use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::{HostBus, HostBusMaster};

/// What a host transaction does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Read,
    Write { data: u64, select: u8 },
}

/// One logical host access, word-granular in host data-width units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTransaction {
    pub address: u64,
    pub kind: TransactionKind,
}

impl HostTransaction {
    pub fn read(address: u64) -> Self {
        Self {
            address,
            kind: TransactionKind::Read,
        }
    }

    /// Full-word write (every byte lane selected).
    pub fn write(address: u64, data: u64) -> Self {
        Self::write_masked(address, data, 0xFF)
    }

    pub fn write_masked(address: u64, data: u64, select: u8) -> Self {
        Self {
            address,
            kind: TransactionKind::Write { data, select },
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self.kind, TransactionKind::Write { .. })
    }
}

/// A transaction the bridge has acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostCompletion {
    pub transaction: HostTransaction,
    /// Word returned on `dat_r`; `None` for writes.
    pub read_data: Option<u64>,
    /// Steps from first assertion of `stb` to `ack`, inclusive.
    pub cycles: u64,
}

/// Classic-handshake bus master issuing queued transactions one at a time.
///
/// Holds `cyc`/`stb` and the request fields steady until `ack` is seen,
/// releases the bus for the following step, then moves on to the next
/// queued transaction.
pub struct HostMaster {
    queue: VecDeque<HostTransaction>,
    current: Option<HostTransaction>,
    elapsed: u64,
    ack_seen: bool,
    completions: Vec<HostCompletion>,
}

impl HostMaster {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            elapsed: 0,
            ack_seen: false,
            completions: Vec::new(),
        }
    }

    pub fn submit(&mut self, transaction: HostTransaction) {
        self.queue.push_back(transaction);
    }

    /// True while a transaction is on the bus or queued.
    pub fn is_busy(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    /// Transaction currently driven on the bus.
    pub fn current(&self) -> Option<&HostTransaction> {
        self.current.as_ref()
    }

    pub fn completions(&self) -> &[HostCompletion] {
        &self.completions
    }

    pub fn take_completions(&mut self) -> Vec<HostCompletion> {
        std::mem::take(&mut self.completions)
    }

    /// Drop queued and in-flight transactions.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current = None;
        self.elapsed = 0;
        self.ack_seen = false;
    }

    fn release(bus: &mut HostBus) {
        bus.cyc = false;
        bus.stb = false;
        bus.we = false;
    }
}

impl Default for HostMaster {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBusMaster for HostMaster {
    fn drive(&mut self, bus: &mut HostBus) {
        // One idle step after every ack
        if self.ack_seen {
            self.ack_seen = false;
            Self::release(bus);
            return;
        }

        if self.current.is_none() {
            self.current = self.queue.pop_front();
            self.elapsed = 0;
        }

        match self.current {
            Some(tx) => {
                bus.cyc = true;
                bus.stb = true;
                bus.adr = tx.address;
                match tx.kind {
                    TransactionKind::Read => {
                        bus.we = false;
                        bus.sel = bus.full_select();
                    }
                    TransactionKind::Write { data, select } => {
                        bus.we = true;
                        bus.dat_w = data;
                        bus.sel = select & bus.full_select();
                    }
                }
            }
            None => Self::release(bus),
        }
    }

    fn observe(&mut self, bus: &HostBus) -> bool {
        let Some(tx) = self.current else {
            return false;
        };
        self.elapsed += 1;
        if !bus.ack {
            return false;
        }

        self.completions.push(HostCompletion {
            transaction: tx,
            read_data: (!tx.is_write()).then_some(bus.dat_r),
            cycles: self.elapsed,
        });
        self.current = None;
        self.ack_seen = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_master_releases_bus() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(32);
        bus.cyc = true;
        bus.stb = true;
        master.drive(&mut bus);
        assert!(!bus.request());
        assert!(!master.is_busy());
    }

    #[test]
    fn write_is_held_until_ack() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(16);
        master.submit(HostTransaction::write(9, 0x1234));

        for _ in 0..3 {
            master.drive(&mut bus);
            assert!(bus.request() && bus.we);
            assert_eq!((bus.adr, bus.dat_w, bus.sel), (9, 0x1234, 0x03));
            assert!(!master.observe(&bus));
        }

        bus.ack = true;
        assert!(master.observe(&bus));
        let done = master.completions()[0];
        assert_eq!(done.read_data, None);
        assert_eq!(done.cycles, 4);
    }

    #[test]
    fn read_captures_dat_r() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(8);
        master.submit(HostTransaction::read(5));
        master.drive(&mut bus);
        assert!(!bus.we);
        bus.ack = true;
        bus.dat_r = 0x7A;
        assert!(master.observe(&bus));
        assert_eq!(master.take_completions()[0].read_data, Some(0x7A));
        assert!(master.completions().is_empty());
    }

    #[test]
    fn next_transaction_follows_ack() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(8);
        master.submit(HostTransaction::write(1, 1));
        master.submit(HostTransaction::read(1));

        master.drive(&mut bus);
        bus.ack = true;
        master.observe(&bus);
        bus.ack = false;

        master.drive(&mut bus);
        assert!(!bus.request());
        assert!(master.is_busy());
        assert!(!master.observe(&bus));

        master.drive(&mut bus);
        assert!(bus.request());
        assert!(!bus.we);
        assert_eq!(master.current(), Some(&HostTransaction::read(1)));
    }

    #[test]
    fn bus_released_after_last_ack() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(8);
        master.submit(HostTransaction::read(3));
        master.drive(&mut bus);
        bus.ack = true;
        master.observe(&bus);
        bus.ack = false;

        master.drive(&mut bus);
        assert!(!bus.request());
        assert!(!master.is_busy());
    }

    #[test]
    fn select_limited_to_bus_lanes() {
        let mut master = HostMaster::new();
        let mut bus = HostBus::new(32);
        master.submit(HostTransaction::write_masked(0, 0, 0xF6));
        master.drive(&mut bus);
        assert_eq!(bus.sel, 0x06);
    }
}
