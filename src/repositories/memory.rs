//! In-memory repositories
//!
//! Backed by `tokio::sync::RwLock` maps. Useful for embedding the engine
//! without a database and as the default fixture in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{EpisodeRepository, ShowRepository, TaskRepository};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Episode, Show, Task};

/// Shows in insertion order
#[derive(Debug, Default)]
pub struct InMemoryShowRepository {
    shows: RwLock<Vec<Show>>,
}

impl InMemoryShowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, show: Show) {
        self.shows.write().await.push(show);
    }
}

#[async_trait]
impl ShowRepository for InMemoryShowRepository {
    async fn list_all(&self) -> RepositoryResult<Vec<Show>> {
        Ok(self.shows.read().await.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Show> {
        self.shows
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("shows", id))
    }

    async fn update(&self, show: &Show) -> RepositoryResult<()> {
        let mut shows = self.shows.write().await;
        let existing = shows
            .iter_mut()
            .find(|s| s.id == show.id)
            .ok_or_else(|| RepositoryError::not_found("shows", show.id))?;
        *existing = show.clone();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEpisodeRepository {
    episodes: RwLock<HashMap<Uuid, Vec<Episode>>>,
}

impl InMemoryEpisodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, episode: Episode) {
        self.episodes
            .write()
            .await
            .entry(episode.show_id)
            .or_default()
            .push(episode);
    }

    pub async fn insert_many(&self, episodes: impl IntoIterator<Item = Episode>) {
        let mut map = self.episodes.write().await;
        for episode in episodes {
            map.entry(episode.show_id).or_default().push(episode);
        }
    }
}

#[async_trait]
impl EpisodeRepository for InMemoryEpisodeRepository {
    async fn get_by_show_id(&self, show_id: Uuid) -> RepositoryResult<Vec<Episode>> {
        Ok(self
            .episodes
            .read()
            .await
            .get(&show_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored task, oldest first
    pub async fn all(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> RepositoryResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(RepositoryError::ConstraintViolation {
                constraint: "crawl_tasks_pkey".to_string(),
                message: format!("task {} already exists", task.id),
            });
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> RepositoryResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("crawl_tasks", task.id)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("crawl_tasks", id))
    }
}
