//! External collaborators: the upstream crawler and the publishing pipeline

pub mod traits;
pub mod unconfigured;

pub use traits::{CrawlResult, Crawler, PublishResult, Publisher};
pub use unconfigured::UnconfiguredUpstream;
