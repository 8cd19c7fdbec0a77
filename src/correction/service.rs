//! Catalog-wide staleness detection and correction bookkeeping

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::detector::{Detector, StaleShowInfo};
use crate::errors::{AppError, AppResult};
use crate::models::{Show, Task, TaskKind, episode::sorted_air_dates};
use crate::repositories::{EpisodeRepository, ShowRepository, TaskRepository};
use crate::services::Crawler;

pub const MIN_CUSTOM_THRESHOLD_DAYS: u32 = 1;
pub const MAX_CUSTOM_THRESHOLD_DAYS: u32 = 365;

/// Summary of one detection pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub total_shows_analyzed: usize,
    /// Shows the detector judged stale, whether or not bookkeeping succeeded
    pub stale_shows_found: usize,
    /// Stale shows that were stamped and received a correction task
    pub tasks_created: usize,
    #[serde(with = "crate::config::duration_serde::duration")]
    pub duration: Duration,
    pub stale_shows: Vec<StaleShowInfo>,
}

pub struct CorrectionService {
    shows: Arc<dyn ShowRepository>,
    episodes: Arc<dyn EpisodeRepository>,
    tasks: Arc<dyn TaskRepository>,
    crawler: Arc<dyn Crawler>,
    detector: Detector,
    last_result: RwLock<Option<Arc<DetectionResult>>>,
}

impl CorrectionService {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        episodes: Arc<dyn EpisodeRepository>,
        tasks: Arc<dyn TaskRepository>,
        crawler: Arc<dyn Crawler>,
        detector: Detector,
    ) -> Self {
        Self {
            shows,
            episodes,
            tasks,
            crawler,
            detector,
            last_result: RwLock::new(None),
        }
    }

    /// Analyze every show, stamp the stale ones and queue a correction task
    /// for each. Only a failure to list the catalog aborts the pass.
    pub async fn run_detection(&self) -> AppResult<Arc<DetectionResult>> {
        let started = Instant::now();
        let shows = self.shows.list_all().await?;
        let today = self.detector.today();

        info!("Running staleness detection over {} shows", shows.len());

        let mut stale_shows = Vec::new();
        for show in &shows {
            let episodes = match self.episodes.get_by_show_id(show.id).await {
                Ok(episodes) => episodes,
                Err(e) => {
                    warn!("Skipping show {} ({}): failed to load episodes: {}", show.name, show.id, e);
                    continue;
                }
            };

            let dates = sorted_air_dates(&episodes);
            if let Some(stale) = self.detector.detect_on(
                show.id,
                show.external_id,
                &show.name,
                &dates,
                show.refresh_threshold_override,
                today,
            ) {
                debug!(
                    "Show {} is {} days overdue (normal interval {} days)",
                    stale.show_name, stale.days_overdue, stale.normal_interval_days
                );
                stale_shows.push(stale);
            }
        }

        let mut tasks_created = 0;
        for stale in &stale_shows {
            match self.record_stale_show(stale).await {
                Ok(()) => tasks_created += 1,
                Err(e) => warn!(
                    "Failed to record correction for show {} ({}): {}",
                    stale.show_name, stale.show_id, e
                ),
            }
        }

        let result = Arc::new(DetectionResult {
            total_shows_analyzed: shows.len(),
            stale_shows_found: stale_shows.len(),
            tasks_created,
            duration: started.elapsed(),
            stale_shows,
        });

        *self.last_result.write().await = Some(Arc::clone(&result));

        info!(
            "Detection finished in {:?}: {} analyzed, {} stale, {} tasks created",
            result.duration, result.total_shows_analyzed, result.stale_shows_found, result.tasks_created
        );
        Ok(result)
    }

    /// Stamp the show and queue its correction task
    async fn record_stale_show(&self, stale: &StaleShowInfo) -> AppResult<()> {
        let now = Utc::now();

        // Re-read so concurrent edits made during the pass are not overwritten
        let mut show = self.shows.get_by_id(stale.show_id).await?;
        show.mark_stale(now, stale.days_overdue);
        self.shows.update(&show).await?;

        let parameters = json!({
            "show_id": stale.show_id,
            "external_id": stale.external_id,
        });
        let task = Task::queued(TaskKind::Correction, parameters.to_string());
        self.tasks.create(&task).await?;
        Ok(())
    }

    pub async fn get_last_detection_result(&self) -> Option<Arc<DetectionResult>> {
        self.last_result.read().await.clone()
    }

    /// Stale shows from the last pass, empty before the first one
    pub async fn stale_shows(&self) -> Vec<StaleShowInfo> {
        self.last_result
            .read()
            .await
            .as_ref()
            .map(|result| result.stale_shows.clone())
            .unwrap_or_default()
    }

    /// Crawl one show right away
    pub async fn refresh_show(&self, show_id: Uuid, external_id: i64) -> AppResult<()> {
        info!("Refreshing show {} (external id {})", show_id, external_id);
        self.crawler.crawl_show(external_id).await
    }

    pub async fn clear_stale_flag(&self, show_id: Uuid) -> AppResult<Show> {
        let mut show = self.shows.get_by_id(show_id).await?;
        show.clear_stale();
        self.shows.update(&show).await?;
        Ok(show)
    }

    /// Override the computed threshold for one show
    pub async fn set_custom_threshold(&self, show_id: Uuid, days: u32) -> AppResult<Show> {
        if !(MIN_CUSTOM_THRESHOLD_DAYS..=MAX_CUSTOM_THRESHOLD_DAYS).contains(&days) {
            return Err(AppError::validation(format!(
                "threshold must be between {MIN_CUSTOM_THRESHOLD_DAYS} and {MAX_CUSTOM_THRESHOLD_DAYS} days, got {days}"
            )));
        }

        let mut show = self.shows.get_by_id(show_id).await?;
        show.refresh_threshold_override = Some(days);
        show.updated_at = Utc::now();
        self.shows.update(&show).await?;
        Ok(show)
    }
}
