//! Repository contracts and the in-memory implementations

pub mod memory;
pub mod traits;

pub use memory::{InMemoryEpisodeRepository, InMemoryShowRepository, InMemoryTaskRepository};
pub use traits::{EpisodeRepository, ShowRepository, TaskRepository};
