//! Placeholder collaborators for builds without an upstream integration
//!
//! The binary wires these in when no crawler or publisher is available, so
//! the scheduler, detection and task bookkeeping still run and every job
//! that needs the upstream fails with a clear error instead.

use async_trait::async_trait;
use uuid::Uuid;

use super::traits::{Crawler, PublishResult, Publisher};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredUpstream;

impl UnconfiguredUpstream {
    fn error(service: &str) -> AppError {
        AppError::upstream(service, "upstream not configured")
    }
}

#[async_trait]
impl Crawler for UnconfiguredUpstream {
    async fn crawl_show(&self, _external_id: i64) -> AppResult<()> {
        Err(Self::error("crawler"))
    }

    async fn refresh_all(&self) -> AppResult<()> {
        Err(Self::error("crawler"))
    }

    async fn crawl_by_status(&self, _status: &str) -> AppResult<()> {
        Err(Self::error("crawler"))
    }
}

#[async_trait]
impl Publisher for UnconfiguredUpstream {
    async fn publish_today(&self) -> AppResult<PublishResult> {
        Err(Self::error("publisher"))
    }

    async fn publish_weekly(&self) -> AppResult<PublishResult> {
        Err(Self::error("publisher"))
    }

    async fn publish_show(&self, _show_id: Uuid) -> AppResult<PublishResult> {
        Err(Self::error("publisher"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_reports_missing_upstream() {
        let upstream = UnconfiguredUpstream;
        let err = upstream.refresh_all().await.unwrap_err();
        assert!(err.to_string().contains("upstream not configured"));

        let results = upstream.batch_crawl(&[7, 8]).await;
        assert!(results.iter().all(|r| !r.success));

        assert!(upstream.publish_show(Uuid::new_v4()).await.is_err());
    }
}
