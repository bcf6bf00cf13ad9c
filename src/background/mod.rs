//! Periodic work that runs while the process is alive: pushing steps and
//! delivering reminders.

mod registry;
pub mod tasks;

pub use registry::{
    Registration, TaskFuture, TaskHandler, TaskOutcome, TaskRegistry, DEFAULT_TICK_TIMEOUT,
};
