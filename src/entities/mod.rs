//! SeaORM entities for the tables the orchestration core reads and writes

pub mod crawl_tasks;
pub mod episodes;
pub mod shows;

pub mod prelude {
    pub use super::crawl_tasks::Entity as CrawlTasks;
    pub use super::episodes::Entity as Episodes;
    pub use super::shows::Entity as Shows;
}
