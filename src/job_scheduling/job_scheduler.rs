//! Cron-driven scheduler for crawl, publish and correction jobs
//!
//! A single timer task walks the timetable and spawns each fired job on its
//! own task. Every execution, scheduled or manual, goes through
//! [`Shared::run_guarded`], which enforces one in-flight job per
//! [`JobKind`] and applies the per-kind timeout.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::job_guard::JobGuard;
use super::types::{
    JobKind, JobKindStatus, JobTimeouts, NextRun, SchedulerStatus, TimetableEntry, TimetableJob,
};
use crate::config::SchedulerConfig;
use crate::correction::{CorrectionService, DetectionResult};
use crate::errors::{AppError, AppResult};
use crate::services::{Crawler, PublishResult, Publisher};
use crate::utils::cron_helper;

pub struct Scheduler {
    shared: Arc<Shared>,
    timer: Mutex<Option<Timer>>,
}

struct Timer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Shared {
    crawler: Arc<dyn Crawler>,
    publisher: Arc<dyn Publisher>,
    correction: Arc<CorrectionService>,
    timetable: Vec<TimetableEntry>,
    timezone: Tz,
    crawl_guard: Arc<JobGuard>,
    publish_guard: Arc<JobGuard>,
    correction_guard: Arc<JobGuard>,
    last_success: RwLock<HashMap<JobKind, DateTime<Utc>>>,
    timeouts: RwLock<JobTimeouts>,
}

impl Scheduler {
    /// Validate the timetable and timezone from `config`. Nothing runs until
    /// [`Scheduler::start`] is called; manual triggers work either way.
    pub fn new(
        config: &SchedulerConfig,
        crawler: Arc<dyn Crawler>,
        publisher: Arc<dyn Publisher>,
        correction: Arc<CorrectionService>,
    ) -> AppResult<Self> {
        let timezone = config.tz()?;
        let timetable = TimetableJob::ALL
            .iter()
            .map(|&job| {
                let spec = job.spec(config);
                Ok(TimetableEntry {
                    job,
                    spec: spec.to_string(),
                    schedule: cron_helper::parse_schedule(spec)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let timeouts = JobTimeouts::from(config);
        validate_timeouts(&timeouts)?;

        Ok(Self {
            shared: Arc::new(Shared {
                crawler,
                publisher,
                correction,
                timetable,
                timezone,
                crawl_guard: JobGuard::new(),
                publish_guard: JobGuard::new(),
                correction_guard: JobGuard::new(),
                last_success: RwLock::new(HashMap::new()),
                timeouts: RwLock::new(timeouts),
            }),
            timer: Mutex::new(None),
        })
    }

    /// Start the cron timer
    pub async fn start(&self) -> AppResult<()> {
        let mut timer = self.timer.lock().await;
        if timer.is_some() {
            return Err(AppError::SchedulerAlreadyRunning);
        }

        for entry in &self.shared.timetable {
            debug!("Registered {} ({})", entry.job.label(), entry.spec);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_timer(Arc::clone(&self.shared), token.clone()));
        *timer = Some(Timer { token, handle });

        info!(
            "Scheduler started with {} jobs in {}",
            self.shared.timetable.len(),
            self.shared.timezone
        );
        Ok(())
    }

    /// Stop future firings. Jobs already running are left to finish.
    pub async fn stop(&self) {
        let Some(timer) = self.timer.lock().await.take() else {
            return;
        };

        timer.token.cancel();
        if let Err(e) = timer.handle.await {
            warn!("Scheduler timer ended abnormally: {}", e);
        }
        info!("Scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    pub async fn run_crawl_now(&self) -> AppResult<()> {
        let shared = Arc::clone(&self.shared);
        self.shared
            .run_guarded(JobKind::Crawl, "manual crawl", async move { shared.crawl().await })
            .await
    }

    pub async fn run_publish_now(&self) -> AppResult<PublishResult> {
        let shared = Arc::clone(&self.shared);
        self.shared
            .run_guarded(JobKind::Publish, "manual publish", async move {
                shared.publish("manual publish", false).await
            })
            .await
    }

    pub async fn run_correction_now(&self) -> AppResult<Arc<DetectionResult>> {
        let shared = Arc::clone(&self.shared);
        self.shared
            .run_guarded(JobKind::Correction, "manual correction", async move {
                shared.correct().await
            })
            .await
    }

    /// Crawl one show immediately, bypassing the crawl guard
    pub async fn run_manual_crawl(&self, external_id: i64) -> AppResult<()> {
        info!("Running manual crawl for show {}", external_id);
        self.shared.crawler.crawl_show(external_id).await?;
        info!("Manual crawl completed for show {}", external_id);
        Ok(())
    }

    /// Publish one show immediately, bypassing the publish guard
    pub async fn run_manual_publish(&self, show_id: Uuid) -> AppResult<PublishResult> {
        info!("Running manual publish for show {}", show_id);
        let result = self.shared.publisher.publish_show(show_id).await?;
        self.shared.note_publish("manual publish", &result).await;
        Ok(result)
    }

    pub async fn get_status(&self) -> SchedulerStatus {
        let running = self.is_running().await;
        let last_success = self.shared.last_success.read().await;
        let now = Utc::now();

        let jobs = JobKind::ALL
            .iter()
            .map(|&kind| {
                let last_success_at = last_success.get(&kind).copied();
                JobKindStatus {
                    kind,
                    in_flight: self.shared.guard(kind).is_busy(),
                    last_success_at,
                    time_since_last_success: last_success_at
                        .and_then(|at| (now - at).to_std().ok())
                        .map(|elapsed| {
                            humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
                                .to_string()
                        }),
                }
            })
            .collect();

        SchedulerStatus { running, jobs }
    }

    /// Next fire time of every timetable entry, soonest first
    pub fn get_next_run_times(&self) -> Vec<NextRun> {
        let now = Utc::now();
        let mut runs: Vec<NextRun> = self
            .shared
            .timetable
            .iter()
            .map(|entry| NextRun {
                job: entry.job,
                spec: entry.spec.clone(),
                next_run: cron_helper::next_fire_after(&entry.schedule, &self.shared.timezone, now),
            })
            .collect();
        runs.sort_by_key(|run| run.next_run);
        runs
    }

    pub async fn get_timeouts(&self) -> JobTimeouts {
        *self.shared.timeouts.read().await
    }

    /// Applies to executions started after the call
    pub async fn set_timeouts(&self, timeouts: JobTimeouts) -> AppResult<()> {
        validate_timeouts(&timeouts)?;
        *self.shared.timeouts.write().await = timeouts;
        info!(
            "Job timeouts set: crawl {:?}, publish {:?}, correction {:?}",
            timeouts.crawl, timeouts.publish, timeouts.correction
        );
        Ok(())
    }
}

impl Shared {
    fn guard(&self, kind: JobKind) -> &Arc<JobGuard> {
        match kind {
            JobKind::Crawl => &self.crawl_guard,
            JobKind::Publish => &self.publish_guard,
            JobKind::Correction => &self.correction_guard,
        }
    }

    async fn record_success(&self, kind: JobKind) {
        self.last_success.write().await.insert(kind, Utc::now());
    }

    async fn crawl(&self) -> AppResult<()> {
        self.crawler.refresh_all().await?;
        self.record_success(JobKind::Crawl).await;
        Ok(())
    }

    async fn publish(&self, label: &str, weekly: bool) -> AppResult<PublishResult> {
        let result = if weekly {
            self.publisher.publish_weekly().await?
        } else {
            self.publisher.publish_today().await?
        };
        self.note_publish(label, &result).await;
        Ok(result)
    }

    /// A publisher that had nothing to publish is not a successful run
    async fn note_publish(&self, label: &str, result: &PublishResult) {
        if result.success {
            self.record_success(JobKind::Publish).await;
            info!(
                "{} published {} ({} shows, {} episodes)",
                label,
                result.url.as_deref().unwrap_or("-"),
                result.shows_count,
                result.episodes_count
            );
        } else {
            warn!(
                "{} skipped: {}",
                label,
                result.error.as_deref().unwrap_or("nothing to publish")
            );
        }
    }

    async fn correct(&self) -> AppResult<Arc<DetectionResult>> {
        let result = self.correction.run_detection().await?;
        self.record_success(JobKind::Correction).await;
        Ok(result)
    }

    fn job_work(self: &Arc<Self>, job: TimetableJob) -> BoxFuture<'static, AppResult<()>> {
        let shared = Arc::clone(self);
        match job {
            TimetableJob::DailyCrawl | TimetableJob::WeeklyCrawl => {
                async move { shared.crawl().await }.boxed()
            }
            TimetableJob::DailyPublish => {
                async move { shared.publish(job.label(), false).await.map(|_| ()) }.boxed()
            }
            TimetableJob::WeeklyPublish => {
                async move { shared.publish(job.label(), true).await.map(|_| ()) }.boxed()
            }
            TimetableJob::DailyCorrection => {
                async move { shared.correct().await.map(|_| ()) }.boxed()
            }
        }
    }

    async fn run_scheduled(self: Arc<Self>, job: TimetableJob) {
        let work = self.job_work(job);
        // Outcomes are already logged by run_guarded
        if let Err(AppError::OperationInProgress { .. }) =
            self.run_guarded(job.kind(), job.label(), work).await
        {
            warn!("{} already running, skipping", job.label());
        }
    }

    /// Run `work` under the guard of `kind` with that kind's timeout.
    ///
    /// The job runs on its own task and owns the guard permit, so when the
    /// caller times out the job keeps running and the guard stays held until
    /// it actually ends.
    async fn run_guarded<T, F>(&self, kind: JobKind, label: &str, work: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: Future<Output = AppResult<T>> + Send + 'static,
    {
        let Some(permit) = self.guard(kind).try_acquire() else {
            return Err(AppError::operation_in_progress(label, kind.to_string()));
        };

        let timeout = self.timeouts.read().await.for_kind(kind);
        info!("Starting {} (timeout: {:?})", label, timeout);
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            work.await
        });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(value))) => {
                info!("{} completed in {:?}", label, started.elapsed());
                Ok(value)
            }
            Ok(Ok(Err(e))) => {
                error!("{} failed after {:?}: {}", label, started.elapsed(), e);
                Err(e)
            }
            Ok(Err(join_error)) => {
                error!("{} aborted after {:?}: {}", label, started.elapsed(), join_error);
                Err(AppError::internal(format!("{label} aborted: {join_error}")))
            }
            Err(_) => {
                error!(
                    "{} timed out after {:?} (limit: {:?}), leaving it running",
                    label,
                    started.elapsed(),
                    timeout
                );
                Err(AppError::Timeout {
                    job: label.to_string(),
                    after: timeout,
                })
            }
        }
    }

    /// Earliest fire time strictly after `after`, with every job due then
    fn next_due(&self, after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<TimetableJob>)> {
        let mut earliest: Option<(DateTime<Utc>, Vec<TimetableJob>)> = None;
        for entry in &self.timetable {
            let Some(at) = cron_helper::next_fire_after(&entry.schedule, &self.timezone, after)
            else {
                continue;
            };

            let sooner = match &earliest {
                Some((best, _)) => at < *best,
                None => true,
            };
            if sooner {
                earliest = Some((at, vec![entry.job]));
            } else if let Some((best, jobs)) = earliest.as_mut()
                && at == *best
            {
                jobs.push(entry.job);
            }
        }
        earliest
    }
}

async fn run_timer(shared: Arc<Shared>, token: CancellationToken) {
    let mut cursor = Utc::now();
    loop {
        let Some((fire_at, due)) = shared.next_due(cursor) else {
            warn!("Timetable has no upcoming runs, scheduler timer exiting");
            break;
        };

        let wait = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        debug!("Next scheduler firing at {} ({} jobs)", fire_at, due.len());

        tokio::select! {
            _ = token.cancelled() => {
                debug!("Scheduler timer received cancellation signal");
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        for job in due {
            tokio::spawn(Arc::clone(&shared).run_scheduled(job));
        }
        cursor = resume_cursor(fire_at, Utc::now());
    }
}

/// Where the timer looks for its next firing after dispatching the slot at
/// `fire_at`. Slots that passed while the timer was late are skipped, never
/// replayed.
fn resume_cursor(fire_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > fire_at {
        debug!("Scheduler timer woke late for {}, skipping slots up to {}", fire_at, now);
    }
    fire_at.max(now)
}

fn validate_timeouts(timeouts: &JobTimeouts) -> AppResult<()> {
    for kind in JobKind::ALL {
        if timeouts.for_kind(kind).is_zero() {
            return Err(AppError::validation(format!(
                "{kind} timeout must be greater than zero"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::Detector;
    use crate::repositories::{
        InMemoryEpisodeRepository, InMemoryShowRepository, InMemoryTaskRepository,
    };
    use crate::services::UnconfiguredUpstream;
    use crate::services::traits::MockPublisher;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts `refresh_all` calls, each taking `delay`
    struct SlowCrawler {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl SlowCrawler {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl Crawler for SlowCrawler {
        async fn crawl_show(&self, _external_id: i64) -> AppResult<()> {
            Ok(())
        }

        async fn refresh_all(&self) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn crawl_by_status(&self, _status: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn correction() -> Arc<CorrectionService> {
        Arc::new(CorrectionService::new(
            Arc::new(InMemoryShowRepository::new()),
            Arc::new(InMemoryEpisodeRepository::new()),
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(UnconfiguredUpstream),
            Detector::default(),
        ))
    }

    fn scheduler_with(
        config: &SchedulerConfig,
        crawler: Arc<dyn Crawler>,
        publisher: Arc<dyn Publisher>,
    ) -> Scheduler {
        Scheduler::new(config, crawler, publisher, correction()).unwrap()
    }

    fn scheduler(crawler: Arc<dyn Crawler>) -> Scheduler {
        scheduler_with(
            &SchedulerConfig::default(),
            crawler,
            Arc::new(UnconfiguredUpstream),
        )
    }

    #[test]
    fn test_invalid_spec_is_rejected_at_construction() {
        let config = SchedulerConfig {
            weekly_publish: "0 7 * * 1".to_string(),
            ..SchedulerConfig::default()
        };
        let result = Scheduler::new(
            &config,
            Arc::new(UnconfiguredUpstream),
            Arc::new(UnconfiguredUpstream),
            correction(),
        );
        assert!(matches!(result, Err(AppError::InvalidCronSpec { .. })));
    }

    #[tokio::test]
    async fn test_start_twice_fails_and_stop_is_idempotent() {
        let scheduler = scheduler(Arc::new(UnconfiguredUpstream));

        scheduler.stop().await;
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running().await);
        assert!(matches!(
            scheduler.start().await,
            Err(AppError::SchedulerAlreadyRunning)
        ));

        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.get_status().await.running);

        scheduler.start().await.unwrap();
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_manual_crawls_run_exactly_once() {
        let crawler = SlowCrawler::new(Duration::from_millis(100));
        let scheduler = scheduler(crawler.clone());

        let (first, second) = tokio::join!(scheduler.run_crawl_now(), scheduler.run_crawl_now());

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::OperationInProgress { .. }))));
        assert_eq!(crawler.calls.load(Ordering::SeqCst), 1);

        let status = scheduler.get_status().await;
        let crawl = status.job(JobKind::Crawl).unwrap();
        assert!(!crawl.in_flight);
        assert!(crawl.last_success_at.is_some());
        assert!(crawl.time_since_last_success.is_some());
    }

    #[tokio::test]
    async fn test_timed_out_job_keeps_running_and_holding_the_guard() {
        let crawler = SlowCrawler::new(Duration::from_millis(300));
        let scheduler = scheduler(crawler.clone());
        let mut timeouts = scheduler.get_timeouts().await;
        timeouts.crawl = Duration::from_millis(30);
        scheduler.set_timeouts(timeouts).await.unwrap();

        let err = scheduler.run_crawl_now().await.unwrap_err();
        assert!(err.is_timeout());

        let status = scheduler.get_status().await;
        assert!(status.job(JobKind::Crawl).unwrap().in_flight);
        assert!(matches!(
            scheduler.run_crawl_now().await,
            Err(AppError::OperationInProgress { .. })
        ));

        tokio::time::sleep(Duration::from_millis(500)).await;
        let status = scheduler.get_status().await;
        let crawl = status.job(JobKind::Crawl).unwrap();
        assert!(!crawl.in_flight);
        assert!(crawl.last_success_at.is_some());
        assert_eq!(crawler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skipped_publish_is_not_a_success() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish_today()
            .times(1)
            .returning(|| Ok(PublishResult::skipped("no episodes today")));
        publisher
            .expect_publish_show()
            .times(1)
            .returning(|_| Ok(PublishResult::published("https://telegra.ph/show", 1, 3)));

        let scheduler = scheduler_with(
            &SchedulerConfig::default(),
            Arc::new(UnconfiguredUpstream),
            Arc::new(publisher),
        );

        let skipped = scheduler.run_publish_now().await.unwrap();
        assert!(!skipped.success);
        let status = scheduler.get_status().await;
        assert!(status.job(JobKind::Publish).unwrap().last_success_at.is_none());

        let published = scheduler.run_manual_publish(Uuid::new_v4()).await.unwrap();
        assert!(published.success);
        let status = scheduler.get_status().await;
        assert!(status.job(JobKind::Publish).unwrap().last_success_at.is_some());
    }

    #[tokio::test]
    async fn test_manual_crawl_propagates_failure() {
        let scheduler = scheduler(Arc::new(UnconfiguredUpstream));
        let err = scheduler.run_manual_crawl(1399).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_correction_now_records_success() {
        let scheduler = scheduler(Arc::new(UnconfiguredUpstream));
        let result = scheduler.run_correction_now().await.unwrap();
        assert_eq!(result.total_shows_analyzed, 0);

        let status = scheduler.get_status().await;
        assert!(status.job(JobKind::Correction).unwrap().last_success_at.is_some());
    }

    #[tokio::test]
    async fn test_zero_timeout_is_rejected() {
        let scheduler = scheduler(Arc::new(UnconfiguredUpstream));
        let mut timeouts = scheduler.get_timeouts().await;
        timeouts.publish = Duration::ZERO;
        assert!(matches!(
            scheduler.set_timeouts(timeouts).await,
            Err(AppError::Validation { .. })
        ));
        assert_eq!(scheduler.get_timeouts().await.publish, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_next_run_times_cover_the_timetable() {
        let scheduler = scheduler(Arc::new(UnconfiguredUpstream));
        let runs = scheduler.get_next_run_times();

        assert_eq!(runs.len(), 5);
        let now = Utc::now();
        assert!(runs.iter().all(|r| r.next_run.is_some_and(|at| at > now)));
        assert!(runs.windows(2).all(|w| w[0].next_run <= w[1].next_run));
    }

    #[test]
    fn test_late_wakeup_does_not_replay_missed_slots() {
        let config = SchedulerConfig {
            daily_correction: "0 * * * * *".to_string(),
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_with(
            &config,
            Arc::new(UnconfiguredUpstream),
            Arc::new(UnconfiguredUpstream),
        );
        let shared = &scheduler.shared;

        // The timer slept through ten minutes of per-minute slots
        let now = Utc::now();
        let (fire_at, due) = shared.next_due(now - chrono::Duration::minutes(10)).unwrap();
        assert!(fire_at < now);
        assert!(due.contains(&TimetableJob::DailyCorrection));

        let mut cursor = resume_cursor(fire_at, now);
        let mut immediate = 0;
        for _ in 0..5 {
            let (next, _) = shared.next_due(cursor).unwrap();
            if next <= now {
                immediate += 1;
            }
            cursor = resume_cursor(next, now);
        }
        assert_eq!(immediate, 0);
    }

    #[test]
    fn test_on_time_cursor_advances_to_the_fired_slot() {
        let now = Utc::now();
        let ahead = now + chrono::Duration::seconds(30);
        assert_eq!(resume_cursor(ahead, now), ahead);
        assert_eq!(resume_cursor(now - chrono::Duration::minutes(3), now), now);
    }

    #[tokio::test]
    async fn test_timer_fires_due_jobs() {
        let config = SchedulerConfig {
            daily_correction: "* * * * * *".to_string(),
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler_with(
            &config,
            Arc::new(UnconfiguredUpstream),
            Arc::new(UnconfiguredUpstream),
        );
        scheduler.start().await.unwrap();

        let fired = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let status = scheduler.get_status().await;
                if status.job(JobKind::Correction).unwrap().last_success_at.is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        scheduler.stop().await;
        assert!(fired.is_ok(), "correction job never fired");
    }
}
