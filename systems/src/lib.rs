pub mod presets;
pub mod reference;
pub mod registry;
pub mod testbench;

pub use testbench::{SimError, Testbench};
