//! Utility modules for showtrack

pub mod cron_helper;
