//! SeaORM-based show repository

use async_trait::async_trait;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{prelude::Shows, shows};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::Show;
use crate::repositories::ShowRepository;

#[derive(Clone)]
pub struct ShowSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl ShowSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Insert a new show
    pub async fn create(&self, show: &Show) -> RepositoryResult<()> {
        let active_model = shows::ActiveModel {
            id: Set(show.id),
            external_id: Set(show.external_id),
            name: Set(show.name.clone()),
            status: Set(show.status.clone()),
            refresh_threshold_override: Set(threshold_to_db(show)?),
            stale_detected_at: Set(show.stale_detected_at),
            last_correction_result: Set(show.last_correction_result.clone()),
            created_at: Set(show.created_at),
            updated_at: Set(show.updated_at),
        };
        active_model.insert(&*self.connection).await?;
        Ok(())
    }

    fn model_to_domain(model: shows::Model) -> RepositoryResult<Show> {
        let refresh_threshold_override = model
            .refresh_threshold_override
            .map(|days| {
                u32::try_from(days).map_err(|_| RepositoryError::InvalidValue {
                    table: "shows".to_string(),
                    field: "refresh_threshold_override".to_string(),
                    value: days.to_string(),
                })
            })
            .transpose()?;

        Ok(Show {
            id: model.id,
            external_id: model.external_id,
            name: model.name,
            status: model.status,
            refresh_threshold_override,
            stale_detected_at: model.stale_detected_at,
            last_correction_result: model.last_correction_result,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn threshold_to_db(show: &Show) -> RepositoryResult<Option<i32>> {
    show.refresh_threshold_override
        .map(|days| {
            i32::try_from(days).map_err(|_| RepositoryError::InvalidValue {
                table: "shows".to_string(),
                field: "refresh_threshold_override".to_string(),
                value: days.to_string(),
            })
        })
        .transpose()
}

#[async_trait]
impl ShowRepository for ShowSeaOrmRepository {
    async fn list_all(&self) -> RepositoryResult<Vec<Show>> {
        let models = Shows::find()
            .order_by_asc(shows::Column::Name)
            .all(&*self.connection)
            .await?;

        models.into_iter().map(Self::model_to_domain).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Show> {
        let model = Shows::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("shows", id))?;
        Self::model_to_domain(model)
    }

    async fn update(&self, show: &Show) -> RepositoryResult<()> {
        let active_model = shows::ActiveModel {
            id: Unchanged(show.id),
            external_id: Set(show.external_id),
            name: Set(show.name.clone()),
            status: Set(show.status.clone()),
            refresh_threshold_override: Set(threshold_to_db(show)?),
            stale_detected_at: Set(show.stale_detected_at),
            last_correction_result: Set(show.last_correction_result.clone()),
            created_at: Unchanged(show.created_at),
            updated_at: Set(show.updated_at),
        };

        match active_model.update(&*self.connection).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::not_found("shows", show.id)),
            Err(e) => Err(e.into()),
        }
    }
}
