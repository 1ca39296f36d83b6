//! Buffer instrumentation: interval counters, periodic reports, status light

pub mod counters;
pub mod stats;
pub mod status;

pub use counters::{IntervalCounters, SharedCounters};
pub use stats::{SharedSnapshot, StatsMonitor, StatsSnapshot};
pub use status::{fail_stop, LogIndicator, StatusIndicator};
