use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lead time of the pre-race notification.
pub const UPCOMING_LEAD: Duration = Duration::days(2);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Race {
    pub round: u32,
    pub name: String,
    pub circuit: String,
    pub locality: String,
    pub country: String,
    pub start: DateTime<Utc>,
    pub qualifying: Option<DateTime<Utc>>,
    pub sprint: Option<DateTime<Utc>>,
    pub result: Option<RaceResult>,
}

impl Race {
    /// Instant the "this weekend" announcement goes out.
    pub fn upcoming_date(&self) -> DateTime<Utc> {
        self.start - UPCOMING_LEAD
    }

    pub fn has_result(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.entries.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct RaceResult {
    pub entries: Vec<DriverResult>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DriverResult {
    pub driver_id: String,
    pub position: u32,
    pub grid: u32,
    pub laps: u32,
    pub points: f64,
    pub status: String,
}

#[cfg(test)]
impl Race {
    pub(crate) fn sample(round: u32, start: DateTime<Utc>) -> Self {
        Self {
            round,
            name: format!("Grand Prix {round}"),
            circuit: format!("Circuit {round}"),
            locality: "Somewhere".to_owned(),
            country: "Italy".to_owned(),
            start,
            qualifying: None,
            sprint: None,
            result: None,
        }
    }
}
