//! On-demand background work with durable status records

pub mod task_manager;

pub use task_manager::TaskManager;
