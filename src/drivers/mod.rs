//! Platform helpers: task creation and stack monitoring.

pub mod task_pin;
