//! Tracked background tasks
//!
//! Every submission is persisted as a `queued` [`Task`] before the work is
//! spawned, so callers get a record they can poll straight away. The
//! background unit then walks the record through `running` into a terminal
//! state. Work is spawned on a [`TaskTracker`] so shutdown can drain it.

use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Task, TaskKind};
use crate::repositories::TaskRepository;
use crate::services::Crawler;

pub struct TaskManager {
    tasks: Arc<dyn TaskRepository>,
    crawler: Arc<dyn Crawler>,
    tracker: TaskTracker,
}

impl TaskManager {
    pub fn new(tasks: Arc<dyn TaskRepository>, crawler: Arc<dyn Crawler>) -> Self {
        Self {
            tasks,
            crawler,
            tracker: TaskTracker::new(),
        }
    }

    /// Persist a `queued` record for `work` and run it in the background.
    ///
    /// Returns once the record is stored; the caller never waits for the work.
    /// `parameters` are stored as JSON, or as an empty string when absent.
    pub async fn start<P, F>(&self, kind: TaskKind, parameters: Option<&P>, work: F) -> AppResult<Task>
    where
        P: Serialize + ?Sized,
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        if self.tracker.is_closed() {
            return Err(AppError::internal("task manager is shutting down"));
        }

        let parameters = match parameters {
            Some(p) => serde_json::to_string(p)?,
            None => String::new(),
        };

        let task = Task::queued(kind, parameters);
        self.tasks.create(&task).await?;
        info!("Queued {} task {}", task.kind, task.id);

        let tasks = Arc::clone(&self.tasks);
        let mut record = task.clone();
        self.tracker.spawn(async move {
            record.mark_running(Utc::now());
            if let Err(e) = tasks.update(&record).await {
                error!("Failed to mark task {} running: {}", record.id, e);
            }

            // A panicking job must still leave a terminal record behind
            let outcome = match tokio::spawn(work).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(join_error) => Err(format!("task aborted: {join_error}")),
            };

            match &outcome {
                Ok(()) => info!("{} task {} succeeded", record.kind, record.id),
                Err(message) => warn!("{} task {} failed: {}", record.kind, record.id, message),
            }

            record.mark_finished(Utc::now(), outcome);
            if let Err(e) = tasks.update(&record).await {
                error!("Failed to record outcome of task {}: {}", record.id, e);
            }
        });

        Ok(task)
    }

    pub async fn start_refresh_all(&self) -> AppResult<Task> {
        let crawler = Arc::clone(&self.crawler);
        self.start::<(), _>(TaskKind::RefreshAll, None, async move {
            crawler.refresh_all().await
        })
        .await
    }

    pub async fn start_crawl_by_status(&self, status: &str) -> AppResult<Task> {
        if status.trim().is_empty() {
            return Err(AppError::validation("status must not be empty"));
        }

        let crawler = Arc::clone(&self.crawler);
        let owned_status = status.to_string();
        self.start(
            TaskKind::CrawlByStatus,
            Some(&serde_json::json!({ "status": status })),
            async move { crawler.crawl_by_status(&owned_status).await },
        )
        .await
    }

    pub async fn get_task(&self, id: Uuid) -> AppResult<Task> {
        Ok(self.tasks.get_by_id(id).await?)
    }

    /// Number of background units still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting submissions and wait for in-flight work to finish
    pub async fn shutdown(&self) {
        self.tracker.close();
        let in_flight = self.in_flight();
        if in_flight > 0 {
            info!("Waiting for {} background tasks to finish", in_flight);
        }
        self.tracker.wait().await;
    }
}
