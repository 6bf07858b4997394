use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use beatbridge_core::bridge::{BridgeConfig, BridgeGeometry};
use beatbridge_core::core::{Component, NativePort, PortResponder};
use beatbridge_core::device::{HostTransaction, MemoryTiming, NativeMemory, TransactionKind};
use beatbridge_core::error::ConfigError;
use beatbridge_systems::Testbench;
use beatbridge_systems::reference::{read_addresses, write_beats};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Recorded vectors, relative to this crate's manifest directory.
pub const PATTERN_DIR: &str = "test_data/patterns";

/// Where `gen_pattern_tests` writes vectors and the replay test reads them,
/// independent of the working directory.
pub fn pattern_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(PATTERN_DIR)
}

// --- TracingMemory: native memory with beat-by-beat recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatOp {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatRecord {
    pub addr: u64,
    pub data: u64,
    pub mask: u8,
    pub op: BeatOp,
}

pub struct TracingMemory {
    pub memory: NativeMemory,
    pub beats: Vec<BeatRecord>,
    reads_in_flight: VecDeque<u64>,
}

impl TracingMemory {
    pub fn new(data_width: u32, timing: MemoryTiming) -> Self {
        Self {
            memory: NativeMemory::new(data_width, timing),
            beats: Vec::new(),
            reads_in_flight: VecDeque::new(),
        }
    }

    pub fn clear_beats(&mut self) {
        self.beats.clear();
    }
}

impl PortResponder for TracingMemory {
    fn drive(&mut self, port: &mut NativePort) {
        self.memory.drive(port);
    }

    fn sample(&mut self, port: &NativePort) {
        if port.cmd.fire() {
            if port.cmd.we {
                self.beats.push(BeatRecord {
                    addr: port.cmd.addr,
                    data: port.wdata.data,
                    mask: port.wdata.we,
                    op: BeatOp::Write,
                });
            } else {
                self.reads_in_flight.push_back(port.cmd.addr);
            }
        }
        if port.rdata.fire()
            && let Some(addr) = self.reads_in_flight.pop_front()
        {
            self.beats.push(BeatRecord {
                addr,
                data: port.rdata.data,
                mask: 0,
                op: BeatOp::Read,
            });
        }
        self.memory.sample(port);
    }

    fn reset(&mut self) {
        self.reads_in_flight.clear();
        self.memory.reset();
    }
}

impl Component for TracingMemory {
    fn tick(&mut self) -> bool {
        self.memory.tick()
    }
}

// --- JSON test vector types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCase {
    pub name: String,
    pub config: BridgeConfig,
    #[serde(default)]
    pub timing: MemoryTiming,
    pub accesses: Vec<HostTransaction>,
    /// Data returned by each read access, in order.
    pub expected_reads: Vec<u64>,
    pub expected_beats: Vec<BeatRecord>,
    pub expected_memory: Vec<(u64, u64)>,
}

// --- Generation against the reference model ---

fn byte_mask(lanes: u8, native_bytes: u32) -> u64 {
    (0..native_bytes)
        .filter(|lane| lanes & (1 << lane) != 0)
        .fold(0u64, |mask, lane| mask | (0xFF << (lane * 8)))
}

/// Build `count` random accesses for `config` and record the native beats,
/// read data and final memory the reference model predicts for them.
pub fn generate_case(
    rng: &mut impl Rng,
    name: &str,
    config: BridgeConfig,
    count: usize,
) -> Result<PatternCase, ConfigError> {
    let geometry = BridgeGeometry::new(&config)?;
    let timing = MemoryTiming {
        read_latency: rng.gen_range(1..=4),
        ready_period: rng.gen_range(1..=3),
    };
    let full_select = ((1u16 << geometry.host_byte_width()) - 1) as u8;
    let native_bytes = geometry.native_byte_width();
    let origin = geometry.base_word_offset();

    let mut image: BTreeMap<u64, u64> = BTreeMap::new();
    let mut accesses = Vec::with_capacity(count);
    let mut expected_reads = Vec::new();
    let mut expected_beats = Vec::new();

    // Small address window so reads usually hit earlier writes
    let mut written: Vec<u64> = Vec::new();
    for _ in 0..count {
        let read = !written.is_empty() && rng.gen_bool(0.4);
        let address = if read && rng.gen_bool(0.8) {
            written[rng.gen_range(0..written.len())]
        } else {
            origin + rng.gen_range(0..32u64)
        };

        let access = if read {
            HostTransaction::read(address)
        } else if rng.gen_bool(0.25) {
            HostTransaction::write_masked(address, rng.r#gen(), rng.r#gen::<u8>() & full_select)
        } else {
            HostTransaction::write(address, rng.r#gen())
        };

        match access.kind {
            TransactionKind::Read => {
                let mut slices = Vec::with_capacity(geometry.ratio() as usize);
                for addr in read_addresses(&geometry, address) {
                    let data = image.get(&addr).copied().unwrap_or(0);
                    slices.push(data);
                    expected_beats.push(BeatRecord {
                        addr,
                        data,
                        mask: 0,
                        op: BeatOp::Read,
                    });
                }
                expected_reads.push(geometry.merge(&slices));
            }
            TransactionKind::Write { data, select } => {
                for beat in write_beats(&geometry, address, data, select & full_select) {
                    let lanes = byte_mask(beat.mask, native_bytes);
                    let old = image.get(&beat.addr).copied().unwrap_or(0);
                    image.insert(beat.addr, (old & !lanes) | (beat.data & lanes));
                    expected_beats.push(BeatRecord {
                        addr: beat.addr,
                        data: beat.data,
                        mask: beat.mask,
                        op: BeatOp::Write,
                    });
                }
                written.push(address);
            }
        }
        accesses.push(access);
    }

    Ok(PatternCase {
        name: name.to_string(),
        config,
        timing,
        accesses,
        expected_reads,
        expected_beats,
        expected_memory: image.into_iter().collect(),
    })
}

// --- Replay through the stepped bridge ---

/// Run `case` through a fresh testbench and compare every observable.
pub fn replay_case(case: &PatternCase) -> Result<(), String> {
    let memory = TracingMemory::new(case.config.native_data_width, case.timing);
    let mut tb = Testbench::with_responder(case.config, memory)
        .map_err(|e| format!("{}: {e}", case.name))?;

    for &access in &case.accesses {
        tb.submit(access);
    }
    let completions = tb.run_until_idle().map_err(|e| format!("{}: {e}", case.name))?;

    if completions.len() != case.accesses.len() {
        return Err(format!(
            "{}: {} completions for {} accesses",
            case.name,
            completions.len(),
            case.accesses.len()
        ));
    }

    let reads: Vec<u64> = completions.iter().filter_map(|c| c.read_data).collect();
    if reads != case.expected_reads {
        return Err(format!(
            "{}: read data (got {:X?} expected {:X?})",
            case.name, reads, case.expected_reads
        ));
    }

    let beats = &tb.responder().beats;
    if beats.len() != case.expected_beats.len() {
        return Err(format!(
            "{}: beat count (got {} expected {})",
            case.name,
            beats.len(),
            case.expected_beats.len()
        ));
    }
    for (i, (got, expected)) in beats.iter().zip(&case.expected_beats).enumerate() {
        if got != expected {
            return Err(format!("{}: beat {i} (got {got:?} expected {expected:?})", case.name));
        }
    }

    let memory: Vec<(u64, u64)> = tb
        .responder()
        .memory
        .words()
        .iter()
        .map(|(&addr, &data)| (addr, data))
        .collect();
    if memory != case.expected_memory {
        return Err(format!("{}: final memory differs", case.name));
    }
    Ok(())
}
