#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

/// the server's alarm format and what the controller keeps of it
pub mod alarm;
pub mod config;
pub mod control_loop;
pub mod execution;
pub mod hardware;
pub mod intensity;
pub mod recurrence;
pub mod scheduler;
pub mod source;
pub mod trigger;

pub use alarm::{Alarm, ControlPoint, CurveShape, IntensityCurve, RecurrencePattern};
pub use config::Config;
pub use control_loop::{ControlLoop, CycleOutcome};
pub use execution::{AlarmRunner, RunOutcome};
pub use scheduler::Scheduler;
pub use trigger::{next_trigger, RecurrenceDay};
