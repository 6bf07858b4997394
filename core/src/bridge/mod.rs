pub mod fsm;
pub mod geometry;

pub use fsm::{BeatPhase, Bridge, BridgeState};
pub use geometry::{BridgeConfig, BridgeGeometry};
