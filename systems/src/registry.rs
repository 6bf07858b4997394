//! Preset registry for automatic front-end discovery.
//!
//! Each preset self-registers via [`inventory::submit!`] with a
//! [`PresetEntry`] containing its CLI name, a one-line description and a
//! factory. The front-end discovers available presets at runtime without
//! any central list.

use beatbridge_core::bridge::BridgeConfig;

/// A bridge configuration plus the write/read-back pattern that exercises it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub config: BridgeConfig,
    /// `(host word address, data)` pairs.
    pub pattern: Vec<(u64, u64)>,
}

/// Describes a front-end-selectable preset.
pub struct PresetEntry {
    /// CLI name used to select this preset (e.g., "wishbone-32bit").
    pub name: &'static str,
    pub description: &'static str,
    /// Factory: build the preset.
    pub create: fn() -> Preset,
}

impl PresetEntry {
    pub const fn new(name: &'static str, description: &'static str, create: fn() -> Preset) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(PresetEntry);

/// Return all registered presets, sorted by name.
pub fn all() -> Vec<&'static PresetEntry> {
    let mut entries: Vec<_> = inventory::iter::<PresetEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a preset by its CLI name.
pub fn find(name: &str) -> Option<&'static PresetEntry> {
    inventory::iter::<PresetEntry>
        .into_iter()
        .find(|e| e.name == name)
}
