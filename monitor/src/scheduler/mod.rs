pub mod cadence;
pub mod monitor;
pub mod supervisor;

pub use cadence::status_due;
pub use monitor::{CycleOutcome, Monitor, MonitorSettings, MonitorState};
pub use supervisor::supervise;
