pub mod monitor;

pub use monitor::{run_monitor, LiveState};
