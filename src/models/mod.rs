//! Domain models shared by the orchestration core and the persistence layer.

pub mod episode;
pub mod show;
pub mod task;

pub use episode::Episode;
pub use show::Show;
pub use task::{Task, TaskKind, TaskStatus};
