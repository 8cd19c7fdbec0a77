use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use showtrack::{
    config::Config,
    correction::{CorrectionService, Detector},
    database::{
        Database,
        repositories::{EpisodeSeaOrmRepository, ShowSeaOrmRepository, TaskSeaOrmRepository},
    },
    job_scheduling::Scheduler,
    services::UnconfiguredUpstream,
    tasks::TaskManager,
};

#[derive(Parser)]
#[command(name = "showtrack")]
#[command(version)]
#[command(about = "Adaptive refresh orchestration for a TV show catalog")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the cron scheduler until interrupted
    Serve,
    /// Run one staleness detection pass and print the result
    Detect,
    /// Print the next fire time of every timetable entry
    NextRuns,
    /// Queue a background refresh of the whole catalog and wait for it
    RefreshAll,
    /// Queue a background crawl of every show with the given status
    CrawlStatus { status: String },
    /// Print a task record
    Task { id: Uuid },
    /// Clear the stale flag of a show
    ClearStale { show_id: Uuid },
    /// Override the refresh threshold of a show, in days
    SetThreshold { show_id: Uuid, days: u32 },
}

struct App {
    scheduler: Scheduler,
    correction: Arc<CorrectionService>,
    task_manager: TaskManager,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("showtrack={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting showtrack v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    config.validate()?;

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let app = build(&config, &database)?;

    match cli.command {
        Command::Serve => serve(&config, &app).await?,
        Command::Detect => print_json(&*app.correction.run_detection().await?)?,
        Command::NextRuns => print_json(&app.scheduler.get_next_run_times())?,
        Command::RefreshAll => {
            let task = app.task_manager.start_refresh_all().await?;
            app.task_manager.shutdown().await;
            print_json(&app.task_manager.get_task(task.id).await?)?;
        }
        Command::CrawlStatus { status } => {
            let task = app.task_manager.start_crawl_by_status(&status).await?;
            app.task_manager.shutdown().await;
            print_json(&app.task_manager.get_task(task.id).await?)?;
        }
        Command::Task { id } => print_json(&app.task_manager.get_task(id).await?)?,
        Command::ClearStale { show_id } => {
            print_json(&app.correction.clear_stale_flag(show_id).await?)?
        }
        Command::SetThreshold { show_id, days } => {
            print_json(&app.correction.set_custom_threshold(show_id, days).await?)?
        }
    }

    Ok(())
}

fn build(config: &Config, database: &Database) -> Result<App> {
    let shows = Arc::new(ShowSeaOrmRepository::new(database.connection()));
    let episodes = Arc::new(EpisodeSeaOrmRepository::new(database.connection()));
    let tasks = Arc::new(TaskSeaOrmRepository::new(database.connection()));
    // No crawler or publisher backend ships with the binary
    let upstream = Arc::new(UnconfiguredUpstream);

    let detector = Detector::new(config.correction_timezone()?);
    let correction = Arc::new(CorrectionService::new(
        shows,
        episodes,
        tasks.clone(),
        upstream.clone(),
        detector,
    ));
    let scheduler = Scheduler::new(
        &config.scheduler,
        upstream.clone(),
        upstream.clone(),
        correction.clone(),
    )?;
    let task_manager = TaskManager::new(tasks, upstream);

    Ok(App {
        scheduler,
        correction,
        task_manager,
    })
}

async fn serve(config: &Config, app: &App) -> Result<()> {
    if config.scheduler.enabled {
        app.scheduler.start().await?;
        for next in app.scheduler.get_next_run_times() {
            info!("{} ({}) next run: {:?}", next.job.name(), next.spec, next.next_run);
        }
    } else {
        warn!("Scheduler disabled in configuration; waiting for shutdown only");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    app.scheduler.stop().await;
    app.task_manager.shutdown().await;
    info!("showtrack stopped");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
