use serde::{Deserialize, Serialize};

use crate::core::bus::lane_mask;
use crate::error::ConfigError;

/// Construction parameters of a bridge. Not mutable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub host_data_width: u32,
    pub native_address_width: u32,
    pub native_data_width: u32,
    /// Byte offset subtracted from host addresses; must be host-word aligned.
    #[serde(default)]
    pub base_address: u64,
}

impl BridgeConfig {
    pub fn new(host_data_width: u32, native_address_width: u32, native_data_width: u32) -> Self {
        Self {
            host_data_width,
            native_address_width,
            native_data_width,
            base_address: 0,
        }
    }

    pub fn with_base_address(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn host_byte_width(&self) -> u32 {
        self.host_data_width / 8
    }
}

/// Width/depth parameters derived once from a [`BridgeConfig`].
///
/// `ratio` native beats make up one host word. Beat 0 is the
/// least-significant `native_data_width` slice of the host word; beat `i`
/// covers bits `[i * native_data_width, (i + 1) * native_data_width)`.
///
/// Host addresses are word-granular in host data-width units. The base
/// address is converted to a host word count (`base_word_offset`) and
/// subtracted before expansion:
///
/// ```text
/// native_address = ((host_address - base_word_offset) * ratio + beat) & address_mask
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeGeometry {
    host_data_width: u32,
    native_data_width: u32,
    native_address_width: u32,
    ratio: u32,
    base_word_offset: u64,
    address_mask: u64,
}

impl BridgeGeometry {
    /// Validate `config` and derive the beat ratio and base word offset.
    pub fn new(config: &BridgeConfig) -> Result<Self, ConfigError> {
        check_data_width("host", config.host_data_width)?;
        check_data_width("native", config.native_data_width)?;
        if !(1..=64).contains(&config.native_address_width) {
            return Err(ConfigError::InvalidAddressWidth(config.native_address_width));
        }

        let host = config.host_data_width;
        let native = config.native_data_width;
        if host < native {
            return Err(ConfigError::HostNarrowerThanNative { host, native });
        }
        if host % native != 0 {
            return Err(ConfigError::NonIntegerRatio { host, native });
        }

        let host_bytes = config.host_byte_width();
        if config.base_address % host_bytes as u64 != 0 {
            return Err(ConfigError::MisalignedBaseAddress {
                base_address: config.base_address,
                host_bytes,
            });
        }

        Ok(Self {
            host_data_width: host,
            native_data_width: native,
            native_address_width: config.native_address_width,
            ratio: host / native,
            base_word_offset: config.base_address / host_bytes as u64,
            address_mask: width_mask(config.native_address_width),
        })
    }

    /// Native beats per host transaction (1 = passthrough).
    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    /// Base address expressed in host data words.
    pub fn base_word_offset(&self) -> u64 {
        self.base_word_offset
    }

    pub fn host_data_width(&self) -> u32 {
        self.host_data_width
    }

    pub fn native_data_width(&self) -> u32 {
        self.native_data_width
    }

    pub fn native_address_width(&self) -> u32 {
        self.native_address_width
    }

    pub fn host_byte_width(&self) -> u32 {
        self.host_data_width / 8
    }

    pub fn native_byte_width(&self) -> u32 {
        self.native_data_width / 8
    }

    pub fn address_mask(&self) -> u64 {
        self.address_mask
    }

    /// Mask covering one host data word.
    pub fn host_word_mask(&self) -> u64 {
        width_mask(self.host_data_width)
    }

    /// Native port address of `beat` for a host word address.
    ///
    /// Uses wrapping arithmetic: a host address below the base offset wraps
    /// and is truncated to the native address width like the port would.
    pub fn native_address(&self, host_address: u64, beat: u32) -> u64 {
        host_address
            .wrapping_sub(self.base_word_offset)
            .wrapping_mul(self.ratio as u64)
            .wrapping_add(beat as u64)
            & self.address_mask
    }

    /// Slice of a host data word carried by `beat`.
    pub fn slice(&self, word: u64, beat: u32) -> u64 {
        debug_assert!(beat < self.ratio);
        (word >> (beat * self.native_data_width)) & width_mask(self.native_data_width)
    }

    /// Byte-enable lanes of `sel` that belong to `beat`.
    pub fn select_slice(&self, sel: u8, beat: u32) -> u8 {
        debug_assert!(beat < self.ratio);
        let lanes = self.native_byte_width();
        ((sel as u16 >> (beat * lanes)) as u8) & lane_mask(lanes)
    }

    /// Reassemble a host word from beats, beat 0 least significant.
    pub fn merge(&self, beats: &[u64]) -> u64 {
        let slice_mask = width_mask(self.native_data_width);
        beats
            .iter()
            .take(self.ratio as usize)
            .enumerate()
            .fold(0, |word, (beat, &data)| {
                word | ((data & slice_mask) << (beat as u32 * self.native_data_width))
            })
    }
}

fn check_data_width(bus: &'static str, width: u32) -> Result<(), ConfigError> {
    if (8..=64).contains(&width) && width % 8 == 0 {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedDataWidth { bus, width })
    }
}

/// Mask with the low `bits` bits set.
pub(crate) fn width_mask(bits: u32) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}
