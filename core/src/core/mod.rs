pub mod bus;
pub mod component;

pub use bus::{CommandChannel, HostBus, NativePort, ReadDataChannel, WriteDataChannel};
pub use component::{Component, HostBusMaster, PortBridge, PortResponder};
