//! Detection over a real SQLite catalog, from episodes to queued tasks

mod common;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::sync::Arc;

use common::RecordingCrawler;
use showtrack::correction::{CorrectionService, Detector};
use showtrack::database::Database;
use showtrack::database::repositories::{
    EpisodeSeaOrmRepository, ShowSeaOrmRepository, TaskSeaOrmRepository,
};
use showtrack::models::{Episode, Show, TaskKind, TaskStatus};
use showtrack::repositories::{
    InMemoryEpisodeRepository, InMemoryShowRepository, InMemoryTaskRepository, ShowRepository,
};

struct Catalog {
    shows: Arc<ShowSeaOrmRepository>,
    episodes: Arc<EpisodeSeaOrmRepository>,
    crawler: Arc<RecordingCrawler>,
    service: CorrectionService,
}

async fn catalog() -> Catalog {
    let database = Database::in_memory().await.unwrap();
    let shows = Arc::new(ShowSeaOrmRepository::new(database.connection()));
    let episodes = Arc::new(EpisodeSeaOrmRepository::new(database.connection()));
    let tasks = Arc::new(TaskSeaOrmRepository::new(database.connection()));
    let crawler = Arc::new(RecordingCrawler::default());
    let service = CorrectionService::new(
        shows.clone(),
        episodes.clone(),
        tasks,
        crawler.clone(),
        Detector::default(),
    );
    Catalog {
        shows,
        episodes,
        crawler,
        service,
    }
}

/// A show with `count` episodes `step` days apart, the last `last_aired_days_ago` days ago
async fn add_show(
    catalog: &Catalog,
    external_id: i64,
    name: &str,
    step: i64,
    count: i64,
    last_aired_days_ago: i64,
) -> Show {
    let show = Show::new(external_id, name, "Returning Series");
    catalog.shows.create(&show).await.unwrap();

    let today = Utc::now().date_naive();
    let last: NaiveDate = today - Duration::days(last_aired_days_ago);
    let episodes: Vec<Episode> = (0..count)
        .map(|i| {
            let aired = last - Duration::days(step * (count - 1 - i));
            Episode::new(show.id, 1, i as i32 + 1, Some(aired))
        })
        .collect();
    catalog.episodes.insert_many(&episodes).await.unwrap();
    show
}

#[tokio::test]
async fn test_detection_stamps_stale_shows_and_queues_tasks() {
    let catalog = catalog().await;
    let overdue = add_show(&catalog, 100, "Overdue Weekly", 7, 6, 30).await;
    let fresh = add_show(&catalog, 200, "Fresh Weekly", 7, 6, 3).await;
    // Too little history to judge
    add_show(&catalog, 300, "Pilot Only", 7, 2, 90).await;

    let result = catalog.service.run_detection().await.unwrap();
    assert_eq!(result.total_shows_analyzed, 3);
    assert_eq!(result.stale_shows_found, 1);
    assert_eq!(result.tasks_created, 1);

    let stale = &result.stale_shows[0];
    assert_eq!(stale.show_id, overdue.id);
    assert_eq!(stale.normal_interval_days, 7);
    // threshold (7 * 3 + 1) / 2 = 11
    assert_eq!(stale.days_overdue, 19);
    assert_eq!(stale.priority, 19);

    let stored = catalog.shows.get_by_id(overdue.id).await.unwrap();
    assert!(stored.is_stale());
    assert_eq!(stored.last_correction_result, "Detected: 19 days overdue");
    assert!(!catalog.shows.get_by_id(fresh.id).await.unwrap().is_stale());

    let last = catalog.service.get_last_detection_result().await.unwrap();
    assert_eq!(last.stale_shows_found, 1);
    assert_eq!(catalog.service.stale_shows().await.len(), 1);
}

#[tokio::test]
async fn test_correction_task_carries_show_identity() {
    let shows = Arc::new(InMemoryShowRepository::new());
    let episodes = Arc::new(InMemoryEpisodeRepository::new());
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let service = CorrectionService::new(
        shows.clone(),
        episodes.clone(),
        tasks.clone(),
        Arc::new(RecordingCrawler::default()),
        Detector::default(),
    );

    let show = Show::new(4242, "Lapsed", "Returning Series");
    shows.insert(show.clone()).await;
    let last = Utc::now().date_naive() - Duration::days(40);
    let aired = (0..5).map(|i: i32| {
        let date = last - Duration::days(7 * i64::from(4 - i));
        Episode::new(show.id, 2, i + 1, Some(date))
    });
    episodes.insert_many(aired).await;

    let result = service.run_detection().await.unwrap();
    assert_eq!(result.tasks_created, 1);

    let queued = tasks.all().await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, TaskKind::Correction);
    assert_eq!(queued[0].status, TaskStatus::Queued);

    let parameters: Value = serde_json::from_str(&queued[0].parameters).unwrap();
    assert_eq!(parameters["external_id"], 4242);
    assert_eq!(parameters["show_id"], show.id.to_string());
}

#[tokio::test]
async fn test_custom_threshold_changes_the_verdict() {
    let catalog = catalog().await;
    let show = add_show(&catalog, 7, "Slow Burner", 7, 6, 30).await;

    catalog.service.set_custom_threshold(show.id, 60).await.unwrap();
    let result = catalog.service.run_detection().await.unwrap();
    assert_eq!(result.stale_shows_found, 0);

    catalog.service.set_custom_threshold(show.id, 10).await.unwrap();
    let result = catalog.service.run_detection().await.unwrap();
    assert_eq!(result.stale_shows[0].days_overdue, 20);

    assert!(catalog.service.set_custom_threshold(show.id, 0).await.is_err());
    assert!(catalog.service.set_custom_threshold(show.id, 366).await.is_err());
}

#[tokio::test]
async fn test_clear_stale_and_refresh_show() {
    let catalog = catalog().await;
    let show = add_show(&catalog, 55, "Comeback", 7, 6, 30).await;
    catalog.service.run_detection().await.unwrap();
    assert!(catalog.shows.get_by_id(show.id).await.unwrap().is_stale());

    let cleared = catalog.service.clear_stale_flag(show.id).await.unwrap();
    assert!(!cleared.is_stale());
    assert!(!catalog.shows.get_by_id(show.id).await.unwrap().is_stale());

    catalog.service.refresh_show(show.id, show.external_id).await.unwrap();
    assert_eq!(catalog.crawler.crawled(), vec![55]);
}
