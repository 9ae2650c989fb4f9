//! droid-schedule: cron-triggered crew runs
//!
//! Entries name a crew, fixed inputs and a priority used to order crews
//! that fall due at the same instant.

mod config;
mod error;
mod scheduler;

pub use config::{ScheduleConfig, ScheduleEntry, DEFAULT_SCHEDULE_PATH};
pub use error::{Result, ScheduleError};
pub use scheduler::{Scheduler, SchedulerHandle};
