use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{constructor::Constructor, driver::Driver, race::Race};

/// Everything the bot knows about the current season at one point in time.
///
/// Never mutated after construction; the season store swaps whole snapshots.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub races: Vec<Race>,
    pub drivers: HashMap<String, Driver>,
    pub constructors: Vec<Constructor>,
}

impl Snapshot {
    /// First race (by round) starting after `now`, or the final race once the
    /// season is over.
    pub fn next_race(&self, now: DateTime<Utc>) -> Option<&Race> {
        self.races
            .iter()
            .find(|race| race.start > now)
            .or_else(|| self.races.last())
    }

    pub fn race(&self, round: u32) -> Option<&Race> {
        self.races.iter().find(|race| race.round == round)
    }

    /// Drivers ordered by championship position; unclassified drivers last.
    pub fn driver_standings(&self) -> Vec<&Driver> {
        let mut drivers: Vec<&Driver> = self.drivers.values().collect();
        drivers.sort_by(|a, b| {
            a.position
                .unwrap_or(u32::MAX)
                .cmp(&b.position.unwrap_or(u32::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });
        drivers
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::Snapshot;
    use crate::model::race::Race;

    fn race(round: u32, start: chrono::DateTime<Utc>) -> Race {
        Race::sample(round, start)
    }

    #[test]
    fn next_race_is_first_future_race() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshot = Snapshot {
            races: vec![
                race(1, now - Duration::days(10)),
                race(2, now + Duration::hours(1)),
                race(3, now + Duration::days(14)),
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.next_race(now).map(|r| r.round), Some(2));
    }

    #[test]
    fn next_race_falls_back_to_last_race() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let snapshot = Snapshot {
            races: vec![
                race(1, now - Duration::days(200)),
                race(2, now - Duration::days(20)),
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.next_race(now).map(|r| r.round), Some(2));
    }

    #[test]
    fn race_starting_exactly_now_is_not_next() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshot = Snapshot {
            races: vec![race(1, now), race(2, now + Duration::days(7))],
            ..Default::default()
        };
        assert_eq!(snapshot.next_race(now).map(|r| r.round), Some(2));
    }

    #[test]
    fn empty_calendar_has_no_next_race() {
        assert!(Snapshot::default().next_race(Utc::now()).is_none());
    }
}
