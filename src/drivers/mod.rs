//! Hardware drivers: raw GPIO, edge detection, and task spawning.

pub mod hw_init;
pub mod input;
pub mod task_pin;
