pub mod bridge;
pub mod core;
pub mod device;
pub mod error;

pub mod prelude {
    pub use crate::bridge::{Bridge, BridgeConfig, BridgeGeometry, BridgeState};
    pub use crate::core::{HostBus, HostBusMaster, NativePort, PortBridge, PortResponder};
    pub use crate::device::{HostMaster, HostTransaction, MemoryTiming, NativeMemory};
    pub use crate::error::ConfigError;
}
