//! SeaORM implementations of the storage contracts

pub mod crawl_task;
pub mod episode;
pub mod show;

pub use crawl_task::TaskSeaOrmRepository;
pub use episode::EpisodeSeaOrmRepository;
pub use show::ShowSeaOrmRepository;
