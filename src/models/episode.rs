use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single episode; only the air date matters to the orchestration core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub show_id: Uuid,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    /// Unannounced episodes have no air date yet
    pub air_date: Option<NaiveDate>,
}

impl Episode {
    pub fn new(show_id: Uuid, season_number: i32, episode_number: i32, air_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id,
            season_number,
            episode_number,
            name: format!("S{season_number:02}E{episode_number:02}"),
            air_date,
        }
    }
}

/// Known air dates of `episodes`, sorted chronologically.
///
/// Repository ordering is not relied upon.
pub fn sorted_air_dates(episodes: &[Episode]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = episodes.iter().filter_map(|e| e.air_date).collect();
    dates.sort_unstable();
    dates
}
