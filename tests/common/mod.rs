//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use showtrack::errors::{AppError, AppResult};
use showtrack::services::{Crawler, PublishResult, Publisher};

/// Counts calls and sleeps for `delay` on every catalog-wide crawl
#[derive(Default)]
pub struct RecordingCrawler {
    pub delay: Duration,
    pub refresh_calls: AtomicUsize,
    pub crawled: Mutex<Vec<i64>>,
    pub fail_status: Option<String>,
}

impl RecordingCrawler {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn crawled(&self) -> Vec<i64> {
        self.crawled.lock().unwrap().clone()
    }
}

#[async_trait]
impl Crawler for RecordingCrawler {
    async fn crawl_show(&self, external_id: i64) -> AppResult<()> {
        self.crawled.lock().unwrap().push(external_id);
        Ok(())
    }

    async fn refresh_all(&self) -> AppResult<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn crawl_by_status(&self, status: &str) -> AppResult<()> {
        if self.fail_status.as_deref() == Some(status) {
            return Err(AppError::upstream("crawler", format!("status '{status}' rejected")));
        }
        Ok(())
    }
}

/// Publishes successfully unless `nothing_to_publish` is set
#[derive(Default)]
pub struct StubPublisher {
    pub nothing_to_publish: bool,
    pub calls: AtomicUsize,
}

impl StubPublisher {
    fn result(&self) -> PublishResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.nothing_to_publish {
            PublishResult::skipped("no episodes air today")
        } else {
            PublishResult::published("https://example.org/post/1", 3, 5)
        }
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish_today(&self) -> AppResult<PublishResult> {
        Ok(self.result())
    }

    async fn publish_weekly(&self) -> AppResult<PublishResult> {
        Ok(self.result())
    }

    async fn publish_show(&self, _show_id: Uuid) -> AppResult<PublishResult> {
        Ok(self.result())
    }
}
