//! Pure reference model of the bridge's address and data translation.
//!
//! Computes what the native port should see for a host access without
//! stepping any handshake. Used to derive expected memory images and
//! native beat traces.

use std::collections::BTreeMap;

use beatbridge_core::bridge::{BridgeConfig, BridgeGeometry};
use beatbridge_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One native write beat: address, data slice and byte enables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBeat {
    pub addr: u64,
    pub data: u64,
    pub mask: u8,
}

/// Native beats of a host write, in issue order.
pub fn write_beats(geometry: &BridgeGeometry, address: u64, data: u64, select: u8) -> Vec<NativeBeat> {
    (0..geometry.ratio())
        .map(|beat| NativeBeat {
            addr: geometry.native_address(address, beat),
            data: geometry.slice(data & geometry.host_word_mask(), beat),
            mask: geometry.select_slice(select, beat),
        })
        .collect()
}

/// Native addresses read for a host read, in issue order.
pub fn read_addresses(geometry: &BridgeGeometry, address: u64) -> Vec<u64> {
    (0..geometry.ratio())
        .map(|beat| geometry.native_address(address, beat))
        .collect()
}

/// Memory contents after writing every `(address, data)` of `pattern` in order.
pub fn memory_image(config: &BridgeConfig, pattern: &[(u64, u64)]) -> Result<BTreeMap<u64, u64>, ConfigError> {
    let geometry = BridgeGeometry::new(config)?;
    let mut image = BTreeMap::new();
    for &(address, data) in pattern {
        for beat in write_beats(&geometry, address, data, 0xFF) {
            image.insert(beat.addr, beat.data);
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_write_splits_low_slice_first() {
        let g = BridgeGeometry::new(&BridgeConfig::new(64, 30, 32)).unwrap();
        let beats = write_beats(&g, 0, 0x1122_3344_5566_7788, 0xFF);
        assert_eq!(
            beats,
            vec![
                NativeBeat { addr: 0, data: 0x5566_7788, mask: 0xF },
                NativeBeat { addr: 1, data: 0x1122_3344, mask: 0xF },
            ]
        );
    }

    #[test]
    fn read_addresses_follow_base_offset() {
        let config = BridgeConfig::new(32, 30, 8).with_base_address(0x1000_0000);
        let g = BridgeGeometry::new(&config).unwrap();
        assert_eq!(read_addresses(&g, 0x0400_0002), vec![8, 9, 10, 11]);
    }

    #[test]
    fn later_writes_win_in_image() {
        let config = BridgeConfig::new(16, 30, 8);
        let image = memory_image(&config, &[(1, 0xAAAA), (1, 0x1234)]).unwrap();
        assert_eq!(image.get(&2), Some(&0x34));
        assert_eq!(image.get(&3), Some(&0x12));
        assert_eq!(image.len(), 2);
    }
}
