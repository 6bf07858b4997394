//! Readback presets: each pairs a bus width combination with a pattern of
//! writes whose read-back must return the written words.

use beatbridge_core::bridge::BridgeConfig;

use crate::registry::{Preset, PresetEntry};

/// Native port address width used by every preset.
pub const ADDRESS_WIDTH: u32 = 30;

/// Byte origin used by the base-address presets.
pub const ORIGIN: u64 = 0x1000_0000;

// Addresses are deliberately out of order so translation bugs show up as
// overwritten neighbours.
const PATTERN_8BIT: [(u64, u64); 8] = [
    (0x00, 0b0000_1111),
    (0x05, 0b0011_1100),
    (0x01, 0b1111_0000),
    (0x02, 0b1111_1111),
    (0x04, 0b1100_0011),
    (0x03, 0b1001_1001),
    (0x07, 0b0101_0101),
    (0x06, 0b1010_1010),
];

const PATTERN_32BIT: [(u64, u64); 8] = [
    (0x00, 0x0DDF_00DD),
    (0x05, 0xCAFE_FADE),
    (0x01, 0xBAAD_F00D),
    (0x02, 0xBEEF_CAFE),
    (0x04, 0xFACE_FEED),
    (0x03, 0xDEAD_BEEF),
    (0x07, 0x1234_5678),
    (0x06, 0x0BAD_C0DE),
];

const PATTERN_64BIT: [(u64, u64); 8] = [
    (0x00, 0x0DDF_00DD_CAFE_FADE),
    (0x05, 0xBAAD_F00D_BEEF_CAFE),
    (0x01, 0xFACE_FEED_DEAD_BEEF),
    (0x02, 0x1234_5678_0BAD_C0DE),
    (0x04, 0x1122_3344_5566_7788),
    (0x03, 0x0123_4567_89AB_CDEF),
    (0x07, 0xFEDC_BA98_7654_3210),
    (0x06, 0xA5A5_5A5A_C3C3_3C3C),
];

/// Shift pattern addresses by `origin` bytes expressed in host words.
pub fn offset_pattern(pattern: &[(u64, u64)], origin: u64, host_data_width: u32) -> Vec<(u64, u64)> {
    let offset = origin / (host_data_width / 8) as u64;
    pattern.iter().map(|&(adr, data)| (adr + offset, data)).collect()
}

fn preset(host: u32, native: u32, base_address: u64, pattern: &[(u64, u64)]) -> Preset {
    let config = BridgeConfig::new(host, ADDRESS_WIDTH, native).with_base_address(base_address);
    Preset {
        config,
        pattern: offset_pattern(pattern, base_address, host),
    }
}

fn wishbone_8bit() -> Preset {
    preset(8, 8, 0, &PATTERN_8BIT)
}

fn wishbone_32bit() -> Preset {
    preset(32, 32, 0, &PATTERN_32BIT)
}

fn wishbone_64bit() -> Preset {
    preset(64, 64, 0, &PATTERN_64BIT)
}

fn wishbone_64bit_to_32bit() -> Preset {
    preset(64, 32, 0, &PATTERN_64BIT)
}

fn wishbone_32bit_to_8bit() -> Preset {
    preset(32, 8, 0, &PATTERN_32BIT)
}

fn wishbone_32bit_base_address() -> Preset {
    preset(32, 32, ORIGIN, &PATTERN_32BIT)
}

fn wishbone_64bit_to_32bit_base_address() -> Preset {
    preset(64, 32, ORIGIN, &PATTERN_64BIT)
}

fn wishbone_32bit_to_8bit_base_address() -> Preset {
    preset(32, 8, ORIGIN, &PATTERN_32BIT)
}

inventory::submit! {
    PresetEntry::new("wishbone-8bit", "8-bit host, 8-bit port (passthrough)", wishbone_8bit)
}

inventory::submit! {
    PresetEntry::new("wishbone-32bit", "32-bit host, 32-bit port (passthrough)", wishbone_32bit)
}

inventory::submit! {
    PresetEntry::new("wishbone-64bit", "64-bit host, 64-bit port (passthrough)", wishbone_64bit)
}

inventory::submit! {
    PresetEntry::new(
        "wishbone-64bit-to-32bit",
        "64-bit host, 32-bit port (2 beats)",
        wishbone_64bit_to_32bit
    )
}

inventory::submit! {
    PresetEntry::new(
        "wishbone-32bit-to-8bit",
        "32-bit host, 8-bit port (4 beats)",
        wishbone_32bit_to_8bit
    )
}

inventory::submit! {
    PresetEntry::new(
        "wishbone-32bit-base-address",
        "32-bit host, 32-bit port, base 0x10000000",
        wishbone_32bit_base_address
    )
}

inventory::submit! {
    PresetEntry::new(
        "wishbone-64bit-to-32bit-base-address",
        "64-bit host, 32-bit port, base 0x10000000",
        wishbone_64bit_to_32bit_base_address
    )
}

inventory::submit! {
    PresetEntry::new(
        "wishbone-32bit-to-8bit-base-address",
        "32-bit host, 8-bit port, base 0x10000000",
        wishbone_32bit_to_8bit_base_address
    )
}
