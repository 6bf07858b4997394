use std::path::PathBuf;

use beatbridge_core::bridge::BridgeGeometry;
use beatbridge_core::error::ConfigError;
use beatbridge_systems::registry::PresetEntry;
use beatbridge_systems::{SimError, Testbench};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use crate::config::RunConfig;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("unknown preset `{0}` (available: {1})")]
    UnknownPreset(String, String),
    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Bridge(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// What a run did, for printing.
#[derive(Debug)]
pub struct RunReport {
    pub preset: &'static str,
    pub ratio: u32,
    pub pattern_entries: usize,
    pub pattern_cycles: u64,
    pub random_entries: usize,
    pub random_cycles: u64,
    pub words: Vec<(u64, u64)>,
}

/// Random `(address, data)` pairs in a window just above the base offset.
fn random_pattern(rng: &mut impl Rng, origin: u64, count: usize) -> Vec<(u64, u64)> {
    (0..count)
        .map(|_| (origin + rng.gen_range(0..256u64), rng.r#gen()))
        .collect()
}

/// Run a preset's read-back pattern, then `count` random write/read-back pairs.
pub fn run_preset(
    entry: &PresetEntry,
    config: &RunConfig,
    count: usize,
    seed: u64,
) -> Result<RunReport, RunError> {
    let preset = (entry.create)();
    let bridge = config.bridge.unwrap_or(preset.config);
    let geometry = BridgeGeometry::new(&bridge)?;

    let mut tb = Testbench::new(bridge, config.timing)?.with_step_limit(config.step_limit);
    info!(
        preset = entry.name,
        host = bridge.host_data_width,
        native = bridge.native_data_width,
        ratio = geometry.ratio(),
        "running preset"
    );

    tb.run_pattern(&preset.pattern)?;
    let pattern_cycles = tb.cycle();

    let mut rng = StdRng::seed_from_u64(seed);
    let random = random_pattern(&mut rng, geometry.base_word_offset(), count);
    tb.run_pattern(&random)?;
    let random_cycles = tb.cycle() - pattern_cycles;

    Ok(RunReport {
        preset: entry.name,
        ratio: geometry.ratio(),
        pattern_entries: preset.pattern.len(),
        pattern_cycles,
        random_entries: random.len(),
        random_cycles,
        words: tb.memory().words().iter().map(|(&a, &d)| (a, d)).collect(),
    })
}
