//! Collaborator contracts consumed by the orchestration core
//!
//! The upstream metadata client and the publishing pipeline live outside
//! this crate. The scheduler, the task manager and the correction service
//! only see them through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppResult;

/// Outcome of crawling one show as part of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub external_id: i64,
    pub success: bool,
    pub error: Option<String>,
    #[serde(with = "crate::config::duration_serde::duration")]
    pub duration: Duration,
}

/// Fetches show metadata from the upstream source and stores it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Refresh a single show and its episodes
    async fn crawl_show(&self, external_id: i64) -> AppResult<()>;

    /// Refresh every show in the catalog
    async fn refresh_all(&self) -> AppResult<()>;

    /// Refresh the shows whose upstream status matches `status`
    async fn crawl_by_status(&self, status: &str) -> AppResult<()>;

    /// Crawl each show in turn. A failing show is recorded in its result and
    /// never aborts the rest of the batch.
    async fn batch_crawl(&self, external_ids: &[i64]) -> Vec<CrawlResult> {
        let mut results = Vec::with_capacity(external_ids.len());
        for &external_id in external_ids {
            let started = Instant::now();
            let outcome = self.crawl_show(external_id).await;
            if let Err(e) = &outcome {
                warn!("Batch crawl of show {} failed: {}", external_id, e);
            }
            results.push(CrawlResult {
                external_id,
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
                duration: started.elapsed(),
            });
        }
        results
    }
}

/// Result of rendering and publishing an update page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    /// `false` means nothing was published, e.g. no episodes aired today
    pub success: bool,
    pub url: Option<String>,
    pub title: Option<String>,
    pub shows_count: usize,
    pub episodes_count: usize,
    /// Why publishing was skipped when `success` is false
    pub error: Option<String>,
}

impl PublishResult {
    pub fn published(url: impl Into<String>, shows_count: usize, episodes_count: usize) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            shows_count,
            episodes_count,
            ..Self::default()
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_today(&self) -> AppResult<PublishResult>;

    async fn publish_weekly(&self) -> AppResult<PublishResult>;

    async fn publish_show(&self, show_id: Uuid) -> AppResult<PublishResult>;
}
