pub mod host_master;
pub mod native_memory;

pub use host_master::{HostCompletion, HostMaster, HostTransaction, TransactionKind};
pub use native_memory::{MemoryTiming, NativeMemory};
