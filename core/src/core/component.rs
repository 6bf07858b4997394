use super::bus::{HostBus, NativePort};

/// Anything that advances by discrete steps in the shared synchronous domain.
pub trait Component {
    /// Advance one step. Returns true if a "significant event" occurred.
    fn tick(&mut self) -> bool;
}

/// Master side of the host bus (CPU, test driver).
pub trait HostBusMaster {
    /// Set the request signals for the coming step.
    fn drive(&mut self, bus: &mut HostBus);

    /// Sample `ack`/`dat_r` after the step. Returns true when a transaction completed.
    fn observe(&mut self, bus: &HostBus) -> bool;
}

/// A converter sitting between a host bus and a native port.
pub trait PortBridge {
    /// The single state-transition function, invoked once per step.
    /// Returns true on the step the host is acknowledged.
    fn tick_with_buses(&mut self, host: &mut HostBus, port: &mut NativePort) -> bool;
}

/// Responder side of the native port (memory controller, storage model).
///
/// `drive` must derive its outputs from responder state alone, never from
/// the bridge signals of the current step.
pub trait PortResponder {
    /// Set `cmd.ready`, `wdata.ready`, `rdata.valid` and `rdata.data`.
    fn drive(&mut self, port: &mut NativePort);

    /// Consume the handshakes that fired during the step.
    fn sample(&mut self, port: &NativePort);

    /// Abandon in-flight commands. Stored contents survive.
    fn reset(&mut self) {}
}
