//! Storage contracts the orchestration core depends on
//!
//! The core never talks to a database directly. Anything that can list
//! shows, read episodes and persist task records can back it: the SeaORM
//! repositories in `crate::database::repositories` or the in-memory ones in
//! `super::memory`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{Episode, Show, Task};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShowRepository: Send + Sync {
    /// Every show in the catalog, in repository order
    async fn list_all(&self) -> RepositoryResult<Vec<Show>>;

    /// Fails with `RecordNotFound` for unknown ids
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Show>;

    async fn update(&self, show: &Show) -> RepositoryResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    /// Episodes of one show; ordering is unspecified
    async fn get_by_show_id(&self, show_id: Uuid) -> RepositoryResult<Vec<Episode>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> RepositoryResult<()>;

    async fn update(&self, task: &Task) -> RepositoryResult<()>;

    /// Fails with `RecordNotFound` for unknown ids
    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task>;
}
