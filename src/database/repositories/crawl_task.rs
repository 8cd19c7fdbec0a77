//! SeaORM-based task record repository

use async_trait::async_trait;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{crawl_tasks, prelude::CrawlTasks};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::Task;
use crate::repositories::TaskRepository;

#[derive(Clone)]
pub struct TaskSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl TaskSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn model_to_domain(model: crawl_tasks::Model) -> RepositoryResult<Task> {
        let invalid = |field: &str, value: &str| RepositoryError::InvalidValue {
            table: "crawl_tasks".to_string(),
            field: field.to_string(),
            value: value.to_string(),
        };

        Ok(Task {
            id: model.id,
            kind: model
                .kind
                .parse()
                .map_err(|_| invalid("kind", &model.kind))?,
            status: model
                .status
                .parse()
                .map_err(|_| invalid("status", &model.status))?,
            parameters: model.parameters,
            error: model.error,
            started_at: model.started_at,
            finished_at: model.finished_at,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl TaskRepository for TaskSeaOrmRepository {
    async fn create(&self, task: &Task) -> RepositoryResult<()> {
        let active_model = crawl_tasks::ActiveModel {
            id: Set(task.id),
            kind: Set(task.kind.to_string()),
            status: Set(task.status.to_string()),
            parameters: Set(task.parameters.clone()),
            error: Set(task.error.clone()),
            started_at: Set(task.started_at),
            finished_at: Set(task.finished_at),
            created_at: Set(task.created_at),
        };

        match active_model.insert(&*self.connection).await {
            Ok(_) => Ok(()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(message)) => {
                    Err(RepositoryError::ConstraintViolation {
                        constraint: "crawl_tasks.id".to_string(),
                        message,
                    })
                }
                _ => Err(e.into()),
            },
        }
    }

    async fn update(&self, task: &Task) -> RepositoryResult<()> {
        let active_model = crawl_tasks::ActiveModel {
            id: Unchanged(task.id),
            kind: Set(task.kind.to_string()),
            status: Set(task.status.to_string()),
            parameters: Set(task.parameters.clone()),
            error: Set(task.error.clone()),
            started_at: Set(task.started_at),
            finished_at: Set(task.finished_at),
            created_at: Unchanged(task.created_at),
        };

        match active_model.update(&*self.connection).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => {
                Err(RepositoryError::not_found("crawl_tasks", task.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task> {
        let model = CrawlTasks::find_by_id(id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("crawl_tasks", id))?;
        Self::model_to_domain(model)
    }
}
