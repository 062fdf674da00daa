pub mod alert;
pub mod classify;
pub mod clock;
pub mod config;
pub mod notifier;
pub mod report;
pub mod scheduler;
pub mod stats;

pub mod error;
