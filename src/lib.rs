pub mod config;
pub mod correction;
pub mod database;
pub mod entities;
pub mod errors;
pub mod job_scheduling;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod utils;
