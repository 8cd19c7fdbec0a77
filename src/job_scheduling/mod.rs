//! Job scheduling subsystem for showtrack
//!
//! The system is built around three components:
//! - `Scheduler`: cron timetable, manual triggers, timeouts and status
//! - `JobGuard`: non-blocking single-flight lock per job kind
//! - `types`: job kinds, timetable entries and status snapshots

pub mod job_guard;
pub mod job_scheduler;
pub mod types;

pub use job_guard::{JobGuard, JobPermit};
pub use job_scheduler::Scheduler;
pub use types::*;
