//! Thread-per-job [`TaskSpawner`].
//!
//! Each feedback or reset job gets its own short-lived FreeRTOS task,
//! pinned to the application core so LED timing never competes with
//! the WiFi stack.

use crate::app::ports::{Job, TaskSpawner};
use crate::drivers::task_pin::{self, Core};
use crate::error::SpawnError;

pub struct ThreadSpawner {
    core: Core,
    priority: u8,
    stack_kb: usize,
}

impl ThreadSpawner {
    pub fn new(priority: u8, stack_kb: usize) -> Self {
        Self {
            core: Core::App,
            priority,
            stack_kb,
        }
    }
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, name: &'static str, job: Job) -> Result<(), SpawnError> {
        task_pin::spawn_detached(self.core, self.priority, self.stack_kb, name, job)
    }
}
