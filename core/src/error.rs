use thiserror::Error;

/// Bridge configuration rejected at construction.
///
/// Every variant is fatal: the beat ratio and address translation are
/// derived once and never revisited, so a bad configuration must keep the
/// bridge from existing at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Data width is not a whole number of bytes between 8 and 64 bits.
    #[error("{bus} data width {width} is not a whole number of bytes in 8..=64")]
    UnsupportedDataWidth { bus: &'static str, width: u32 },

    /// Native address width outside 1..=64 bits.
    #[error("native address width {0} is outside 1..=64")]
    InvalidAddressWidth(u32),

    /// The host bus is narrower than the native port (upsizing unsupported).
    #[error("host data width {host} is narrower than native data width {native}")]
    HostNarrowerThanNative { host: u32, native: u32 },

    /// Host width is not an integer multiple of the native width.
    #[error("host data width {host} is not a multiple of native data width {native}")]
    NonIntegerRatio { host: u32, native: u32 },

    /// Base address does not fall on a host data word boundary.
    #[error("base address 0x{base_address:X} is not aligned to {host_bytes}-byte host words")]
    MisalignedBaseAddress { base_address: u64, host_bytes: u32 },
}
