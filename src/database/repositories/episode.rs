//! SeaORM-based episode repository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{episodes, prelude::Episodes};
use crate::errors::RepositoryResult;
use crate::models::Episode;
use crate::repositories::EpisodeRepository;

#[derive(Clone)]
pub struct EpisodeSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl EpisodeSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn to_active_model(episode: &Episode) -> episodes::ActiveModel {
        episodes::ActiveModel {
            id: Set(episode.id),
            show_id: Set(episode.show_id),
            season_number: Set(episode.season_number),
            episode_number: Set(episode.episode_number),
            name: Set(episode.name.clone()),
            air_date: Set(episode.air_date),
        }
    }

    pub async fn create(&self, episode: &Episode) -> RepositoryResult<()> {
        Episodes::insert(Self::to_active_model(episode))
            .exec(&*self.connection)
            .await?;
        Ok(())
    }

    /// Insert a batch of episodes in one statement
    pub async fn insert_many(&self, episodes: &[Episode]) -> RepositoryResult<usize> {
        if episodes.is_empty() {
            return Ok(0);
        }

        Episodes::insert_many(episodes.iter().map(Self::to_active_model))
            .exec(&*self.connection)
            .await?;
        Ok(episodes.len())
    }
}

impl From<episodes::Model> for Episode {
    fn from(model: episodes::Model) -> Self {
        Self {
            id: model.id,
            show_id: model.show_id,
            season_number: model.season_number,
            episode_number: model.episode_number,
            name: model.name,
            air_date: model.air_date,
        }
    }
}

#[async_trait]
impl EpisodeRepository for EpisodeSeaOrmRepository {
    async fn get_by_show_id(&self, show_id: Uuid) -> RepositoryResult<Vec<Episode>> {
        let models = Episodes::find()
            .filter(episodes::Column::ShowId.eq(show_id))
            .order_by_asc(episodes::Column::SeasonNumber)
            .order_by_asc(episodes::Column::EpisodeNumber)
            .all(&*self.connection)
            .await?;

        Ok(models.into_iter().map(Episode::from).collect())
    }
}
