//! Background work driven by the job scheduler.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig};
