//! Typed views over the four Ergast documents.
//!
//! Ergast encodes every number as a string, so the wire structs keep them as
//! `String` and conversion into the domain model does the parsing.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{Constructor, Driver, DriverResult, Race, RaceResult},
};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<T> {
    #[serde(rename = "MRData")]
    mr_data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RaceTableData {
    race_table: RaceTable,
    #[serde(rename = "limit")]
    limit: Option<String>,
    #[serde(rename = "offset")]
    offset: Option<String>,
    #[serde(rename = "total")]
    total: Option<String>,
}

impl RaceTableData {
    /// Offset of the following page, if the table continues past this one.
    fn next_offset(&self) -> Option<usize> {
        let field = |value: &Option<String>| {
            value.as_deref().and_then(|v| v.trim().parse::<usize>().ok())
        };
        let limit = field(&self.limit)?;
        let next = field(&self.offset)? + limit;
        (limit > 0 && next < field(&self.total)?).then_some(next)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RaceTable {
    #[serde(default)]
    races: Vec<WireRace>,
}

#[derive(Deserialize)]
struct WireRace {
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    #[serde(rename = "Circuit")]
    circuit: Option<WireCircuit>,
    date: String,
    time: Option<String>,
    #[serde(rename = "Qualifying")]
    qualifying: Option<WireSession>,
    #[serde(rename = "Sprint")]
    sprint: Option<WireSession>,
    #[serde(rename = "Results", default)]
    results: Vec<WireResult>,
}

#[derive(Deserialize)]
struct WireCircuit {
    #[serde(rename = "circuitName")]
    circuit_name: String,
    #[serde(rename = "Location")]
    location: Option<WireLocation>,
}

#[derive(Deserialize)]
struct WireLocation {
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct WireSession {
    date: String,
    time: Option<String>,
}

#[derive(Deserialize)]
struct WireResult {
    position: String,
    #[serde(default)]
    points: String,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(default)]
    grid: String,
    #[serde(default)]
    laps: String,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct WireDriver {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(rename = "permanentNumber")]
    permanent_number: Option<String>,
    code: Option<String>,
    #[serde(rename = "givenName")]
    given_name: String,
    #[serde(rename = "familyName")]
    family_name: String,
    #[serde(default)]
    nationality: String,
}

#[derive(Deserialize)]
struct WireConstructor {
    name: String,
    #[serde(default)]
    nationality: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StandingsData {
    standings_table: StandingsTable,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StandingsTable {
    #[serde(default)]
    standings_lists: Vec<StandingsList>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StandingsList {
    #[serde(default)]
    driver_standings: Vec<WireDriverStanding>,
    #[serde(default)]
    constructor_standings: Vec<WireConstructorStanding>,
}

#[derive(Deserialize)]
struct WireDriverStanding {
    position: Option<String>,
    points: String,
    wins: String,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructors", default)]
    constructors: Vec<WireConstructor>,
}

#[derive(Deserialize)]
struct WireConstructorStanding {
    position: Option<String>,
    points: String,
    wins: String,
    #[serde(rename = "Constructor")]
    constructor: WireConstructor,
}

fn number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid(format!("{field}: {value:?} is not a number")))
}

/// Ergast leaves numeric fields empty (or uses "-") for unclassified entries.
fn optional_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

fn instant(date: &str, time: Option<&str>) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Error::invalid(format!("bad date {date:?}")))?;
    let clock = match time {
        Some(time) => {
            let trimmed = time.trim_end_matches('Z');
            NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .map_err(|_| Error::invalid(format!("bad time {time:?}")))?
        },
        None => NaiveTime::default(),
    };
    Ok(day.and_time(clock).and_utc())
}

impl WireDriver {
    fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

/// Season calendar ordered by round. Rounds must be unique and contiguous.
pub fn parse_calendar(body: &[u8]) -> Result<Vec<Race>> {
    let envelope: Envelope<RaceTableData> = serde_json::from_slice(body)?;
    let mut races = envelope
        .mr_data
        .race_table
        .races
        .into_iter()
        .map(|race| {
            let (circuit, locality, country) = match race.circuit {
                Some(circuit) => {
                    let (locality, country) = circuit
                        .location
                        .map(|l| (l.locality, l.country))
                        .unwrap_or_default();
                    (circuit.circuit_name, locality, country)
                },
                None => Default::default(),
            };
            Ok(Race {
                round: number("round", &race.round)?,
                name: race.race_name,
                circuit,
                locality,
                country,
                start: instant(&race.date, race.time.as_deref())?,
                qualifying: race
                    .qualifying
                    .map(|q| instant(&q.date, q.time.as_deref()))
                    .transpose()?,
                sprint: race
                    .sprint
                    .map(|s| instant(&s.date, s.time.as_deref()))
                    .transpose()?,
                result: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    races.sort_by_key(|race| race.round);
    for (expected, race) in (1..).zip(&races) {
        if race.round != expected {
            return Err(Error::invalid(format!(
                "calendar rounds not contiguous: expected round {expected}, found {}",
                race.round
            )));
        }
    }
    Ok(races)
}

/// One page of the results table. The API pages by result row, so a race can
/// be split across two pages.
#[derive(Debug, Default)]
pub struct ResultsPage {
    pub results: HashMap<u32, RaceResult>,
    pub next_offset: Option<usize>,
}

impl ResultsPage {
    /// Folds this page into `into`, joining rows of races split across pages.
    pub fn merge_into(self, into: &mut HashMap<u32, RaceResult>) {
        for (round, result) in self.results {
            let merged = into.entry(round).or_default();
            merged.entries.extend(result.entries);
            merged.entries.sort_by_key(|entry| entry.position);
            merged.entries.dedup_by(|a, b| {
                a.position == b.position && a.driver_id == b.driver_id
            });
        }
    }
}

/// Results keyed by the round they belong to, plus where the next page starts.
pub fn parse_results(body: &[u8]) -> Result<ResultsPage> {
    let envelope: Envelope<RaceTableData> = serde_json::from_slice(body)?;
    let next_offset = envelope.mr_data.next_offset();
    let mut results = HashMap::new();
    for race in envelope.mr_data.race_table.races {
        let round: u32 = number("round", &race.round)?;
        let mut entries = race
            .results
            .into_iter()
            .map(|entry| {
                Ok(DriverResult {
                    driver_id: entry.driver.driver_id,
                    position: number("position", &entry.position)?,
                    grid: optional_number(Some(&entry.grid)).unwrap_or(0),
                    laps: optional_number(Some(&entry.laps)).unwrap_or(0),
                    points: number("points", &entry.points).unwrap_or(0.0),
                    status: entry.status,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.position);
        results
            .entry(round)
            .or_insert_with(RaceResult::default)
            .entries
            .extend(entries);
    }
    Ok(ResultsPage {
        results,
        next_offset,
    })
}

/// Driver standings keyed by driver id. An empty standings list (before the
/// first race) yields an empty map.
pub fn parse_driver_standings(body: &[u8]) -> Result<HashMap<String, Driver>> {
    let envelope: Envelope<StandingsData> = serde_json::from_slice(body)?;
    let Some(list) = envelope.mr_data.standings_table.standings_lists.into_iter().next()
    else {
        return Ok(HashMap::new());
    };

    list.driver_standings
        .into_iter()
        .map(|standing| {
            let driver = standing.driver;
            let constructor = standing
                .constructors
                .into_iter()
                .last()
                .map(|c| c.name)
                .unwrap_or_default();
            Ok((driver.driver_id.clone(), Driver {
                name: driver.full_name(),
                code: driver.code,
                number: optional_number(driver.permanent_number.as_deref()),
                nationality: driver.nationality,
                id: driver.driver_id,
                constructor,
                position: optional_number(standing.position.as_deref()),
                points: number("points", &standing.points)?,
                wins: number("wins", &standing.wins)?,
            }))
        })
        .collect()
}

/// Constructor standings in championship order.
pub fn parse_constructor_standings(body: &[u8]) -> Result<Vec<Constructor>> {
    let envelope: Envelope<StandingsData> = serde_json::from_slice(body)?;
    let Some(list) = envelope.mr_data.standings_table.standings_lists.into_iter().next()
    else {
        return Ok(Vec::new());
    };

    let mut constructors = list
        .constructor_standings
        .into_iter()
        .map(|standing| {
            Ok(Constructor {
                position: optional_number(standing.position.as_deref()),
                name: standing.constructor.name,
                nationality: standing.constructor.nationality,
                points: number("points", &standing.points)?,
                wins: number("wins", &standing.wins)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    constructors.sort_by_key(|c| c.position.unwrap_or(u32::MAX));
    Ok(constructors)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    pub(crate) const CALENDAR: &str =
        include_str!("../../tests/fixtures/calendar.json");
    pub(crate) const RESULTS: &str =
        include_str!("../../tests/fixtures/results.json");
    pub(crate) const DRIVER_STANDINGS: &str =
        include_str!("../../tests/fixtures/driver_standings.json");
    pub(crate) const CONSTRUCTOR_STANDINGS: &str =
        include_str!("../../tests/fixtures/constructor_standings.json");

    #[test]
    fn calendar_is_sorted_and_timed() {
        let races = parse_calendar(CALENDAR.as_bytes()).unwrap();
        assert_eq!(races.iter().map(|r| r.round).collect::<Vec<_>>(), [1, 2, 3]);

        let bahrain = &races[0];
        assert_eq!(bahrain.name, "Bahrain Grand Prix");
        assert_eq!(bahrain.circuit, "Bahrain International Circuit");
        assert_eq!(bahrain.country, "Bahrain");
        assert_eq!(
            bahrain.start,
            Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap()
        );
        assert_eq!(
            bahrain.qualifying,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap())
        );
        assert!(bahrain.sprint.is_none());
        assert!(races[2].sprint.is_some());
    }

    #[test]
    fn calendar_with_gap_is_rejected() {
        let body = r#"{"MRData":{"RaceTable":{"Races":[
            {"round":"1","raceName":"A","date":"2024-03-02","time":"15:00:00Z"},
            {"round":"3","raceName":"C","date":"2024-03-20","time":"15:00:00Z"}
        ]}}}"#;
        assert!(matches!(
            parse_calendar(body.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn calendar_with_duplicate_round_is_rejected() {
        let body = r#"{"MRData":{"RaceTable":{"Races":[
            {"round":"1","raceName":"A","date":"2024-03-02"},
            {"round":"1","raceName":"B","date":"2024-03-09"}
        ]}}}"#;
        assert!(parse_calendar(body.as_bytes()).is_err());
    }

    #[test]
    fn missing_time_defaults_to_midnight() {
        let body = r#"{"MRData":{"RaceTable":{"Races":[
            {"round":"1","raceName":"A","date":"1990-03-11"}
        ]}}}"#;
        let races = parse_calendar(body.as_bytes()).unwrap();
        assert_eq!(
            races[0].start,
            Utc.with_ymd_and_hms(1990, 3, 11, 0, 0, 0).unwrap()
        );
    }

    /// Rows 0..3 of a four-row table; round 2 continues on the next page.
    pub(crate) const RESULTS_PAGE_ONE: &str = r#"{"MRData":{"limit":"3","offset":"0","total":"4","RaceTable":{"Races":[
        {"round":"1","raceName":"A","date":"2024-03-02","Results":[
            {"position":"2","points":"18","Driver":{"driverId":"perez","givenName":"Sergio","familyName":"Perez"},"grid":"5","laps":"57","status":"+22.457"},
            {"position":"1","points":"26","Driver":{"driverId":"max_verstappen","givenName":"Max","familyName":"Verstappen"},"grid":"1","laps":"57","status":"Finished"}
        ]},
        {"round":"2","raceName":"B","date":"2024-03-09","Results":[
            {"position":"1","points":"25","Driver":{"driverId":"max_verstappen","givenName":"Max","familyName":"Verstappen"},"grid":"1","laps":"50","status":"Finished"}
        ]}
    ]}}}"#;
    pub(crate) const RESULTS_PAGE_TWO: &str = r#"{"MRData":{"limit":"3","offset":"3","total":"4","RaceTable":{"Races":[
        {"round":"2","raceName":"B","date":"2024-03-09","Results":[
            {"position":"2","points":"18","Driver":{"driverId":"perez","givenName":"Sergio","familyName":"Perez"},"grid":"3","laps":"50","status":"+13.643"}
        ]}
    ]}}}"#;

    #[test]
    fn results_pages_report_the_next_offset() {
        let first = parse_results(RESULTS_PAGE_ONE.as_bytes()).unwrap();
        assert_eq!(first.next_offset, Some(3));
        let second = parse_results(RESULTS_PAGE_TWO.as_bytes()).unwrap();
        assert_eq!(second.next_offset, None);

        let mut merged = HashMap::new();
        first.merge_into(&mut merged);
        second.merge_into(&mut merged);
        let round_two: Vec<_> =
            merged[&2].entries.iter().map(|e| e.driver_id.as_str()).collect();
        assert_eq!(round_two, ["max_verstappen", "perez"]);
        assert_eq!(merged[&1].entries.len(), 2);
    }

    #[test]
    fn page_without_counts_is_the_last() {
        let body = r#"{"MRData":{"RaceTable":{"Races":[]}}}"#;
        let page = parse_results(body.as_bytes()).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn results_are_keyed_by_round() {
        let page = parse_results(RESULTS.as_bytes()).unwrap();
        assert_eq!(page.next_offset, None);
        let results = page.results;
        assert_eq!(results.len(), 2);
        let round_two = &results[&2].entries;
        assert_eq!(round_two[0].driver_id, "max_verstappen");
        assert_eq!(round_two[0].points, 26.0);
        assert_eq!(round_two[1].status, "+13.643");
    }

    #[test]
    fn driver_standings_map_by_id() {
        let drivers = parse_driver_standings(DRIVER_STANDINGS.as_bytes()).unwrap();
        assert_eq!(drivers.len(), 3);
        let max = &drivers["max_verstappen"];
        assert_eq!(max.name, "Max Verstappen");
        assert_eq!(max.constructor, "Red Bull");
        assert_eq!(max.number, Some(33));
        assert_eq!(max.position, Some(1));
        assert_eq!(max.wins, 2);
    }

    #[test]
    fn empty_standings_list_is_empty() {
        let body = r#"{"MRData":{"StandingsTable":{"StandingsLists":[]}}}"#;
        assert!(parse_driver_standings(body.as_bytes()).unwrap().is_empty());
        assert!(parse_constructor_standings(body.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn constructor_standings_in_order() {
        let constructors =
            parse_constructor_standings(CONSTRUCTOR_STANDINGS.as_bytes()).unwrap();
        let names: Vec<_> = constructors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Red Bull", "Ferrari"]);
        assert_eq!(constructors[0].points, 87.0);
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(
            parse_calendar(b"<html>rate limited</html>"),
            Err(Error::Json(_))
        ));
    }
}
