use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::{
    model::{Constructor, Driver, Race},
    pagination::PageMarker,
};

const COLOUR: u32 = 0xE10600;
const THUMBNAIL_URL: &str = "https://i.imgur.com/7wyu3ng.png";
/// Discord rejects empty field names.
const BLANK: &str = "\u{200b}";

pub const STANDINGS_PAGE_SIZE: usize = 7;
pub const RESULT_PAGE_SIZE: usize = 10;

fn themed() -> CreateEmbed {
    CreateEmbed::new().colour(COLOUR).thumbnail(THUMBNAIL_URL)
}

fn timestamp(at: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{style}>", at.timestamp())
}

/// One decimal at most, no trailing `.0`.
pub fn points(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn flag(code: Option<&str>) -> String {
    match code {
        Some(code) => format!(":flag_{code}:"),
        None => ":checkered_flag:".to_owned(),
    }
}

/// ISO 3166 alpha-2 code for a calendar country name.
fn country_code(country: &str) -> Option<&'static str> {
    Some(match country {
        "Abu Dhabi" | "UAE" | "United Arab Emirates" => "ae",
        "Australia" => "au",
        "Austria" => "at",
        "Azerbaijan" => "az",
        "Bahrain" => "bh",
        "Belgium" => "be",
        "Brazil" => "br",
        "Canada" => "ca",
        "China" => "cn",
        "France" => "fr",
        "Germany" => "de",
        "Hungary" => "hu",
        "Italy" => "it",
        "Japan" => "jp",
        "Mexico" => "mx",
        "Monaco" => "mc",
        "Netherlands" => "nl",
        "Portugal" => "pt",
        "Qatar" => "qa",
        "Russia" => "ru",
        "Saudi Arabia" => "sa",
        "Singapore" => "sg",
        "Spain" => "es",
        "Turkey" => "tr",
        "UK" | "United Kingdom" => "gb",
        "USA" | "United States" => "us",
        "Vietnam" => "vn",
        _ => return None,
    })
}

fn nationality_code(nationality: &str) -> Option<&'static str> {
    Some(match nationality {
        "American" => "us",
        "Argentine" => "ar",
        "Australian" => "au",
        "Austrian" => "at",
        "Belgian" => "be",
        "Brazilian" => "br",
        "British" => "gb",
        "Canadian" => "ca",
        "Chinese" => "cn",
        "Danish" => "dk",
        "Dutch" => "nl",
        "Finnish" => "fi",
        "French" => "fr",
        "German" => "de",
        "Indian" => "in",
        "Italian" => "it",
        "Japanese" => "jp",
        "Mexican" => "mx",
        "Monegasque" => "mc",
        "New Zealander" => "nz",
        "Polish" => "pl",
        "Russian" => "ru",
        "Spanish" => "es",
        "Swedish" => "se",
        "Swiss" => "ch",
        "Thai" => "th",
        _ => return None,
    })
}

fn race_title(race: &Race) -> String {
    format!(
        "#{} {} {}",
        race.round,
        flag(country_code(&race.country)),
        race.name
    )
}

fn race_embed(race: &Race, prefix: &str) -> CreateEmbed {
    let mut embed = themed()
        .title(format!("{prefix}{}", race_title(race)))
        .field(
            "Race:",
            format!("{}\n{}", timestamp(race.start, 'f'), timestamp(race.start, 'R')),
            true,
        );
    if let Some(sprint) = race.sprint {
        embed = embed.field("Sprint:", timestamp(sprint, 'f'), true);
    }
    if let Some(qualifying) = race.qualifying {
        embed = embed.field("Qualifying:", timestamp(qualifying, 'f'), true);
    }
    embed.field(
        "Circuit:",
        format!("{}, {}, {}", race.circuit, race.locality, race.country),
        false,
    )
}

pub fn race(race: &Race) -> CreateEmbed {
    race_embed(race, "")
}

/// The pre-race announcement.
pub fn upcoming(race: &Race) -> CreateEmbed {
    race_embed(race, "This weekend: ")
}

pub fn calendar(races: &[Race], next_round: Option<u32>) -> CreateEmbed {
    races.iter().fold(themed().title("Calendar"), |embed, race| {
        let date = timestamp(race.start, 'D');
        if Some(race.round) == next_round {
            embed.field(format!(">NEXT RACE<\n{}", race_title(race)), date, true)
        } else {
            embed.field(BLANK, format!("{}\n{date}", race_title(race)), true)
        }
    })
}

pub fn driver_standings(drivers: &[&Driver], marker: PageMarker) -> CreateEmbed {
    let embed = themed()
        .title("Driver Standings")
        .field("Driver:", BLANK, true)
        .field("Team:", BLANK, true)
        .field("Points:", BLANK, true);

    marker
        .window(STANDINGS_PAGE_SIZE, drivers.len())
        .map(|i| drivers[i])
        .fold(embed, |embed, driver| {
            embed
                .field(
                    format!(
                        "#{} {}{}",
                        position(driver.position),
                        flag(nationality_code(&driver.nationality)),
                        driver.name
                    ),
                    BLANK,
                    true,
                )
                .field(&driver.constructor, BLANK, true)
                .field(points(driver.points), BLANK, true)
        })
        .footer(CreateEmbedFooter::new(marker.to_string()))
}

pub fn constructor_standings(constructors: &[Constructor]) -> CreateEmbed {
    constructors
        .iter()
        .fold(themed().title("Constructor Standings"), |embed, constructor| {
            embed.field(
                format!(
                    "#{} {} {}",
                    position(constructor.position),
                    flag(nationality_code(&constructor.nationality)),
                    constructor.name
                ),
                format!("Points: {}", points(constructor.points)),
                true,
            )
        })
}

pub fn driver_profile(driver: &Driver) -> CreateEmbed {
    let number = driver
        .number
        .map(|n| format!("#{n} "))
        .unwrap_or_default();
    themed()
        .title(format!(
            "{number}{}{}",
            flag(nationality_code(&driver.nationality)),
            driver.name
        ))
        .field("Team:", &driver.constructor, false)
        .field("Position", format!("#{}", position(driver.position)), true)
        .field("Wins", driver.wins.to_string(), true)
        .field("Points", points(driver.points), true)
}

/// One page of a race result as a fixed-width table.
pub fn race_result(
    race: &Race,
    drivers: &HashMap<String, Driver>,
    marker: PageMarker,
) -> CreateEmbed {
    let entries = race
        .result
        .as_ref()
        .map(|result| result.entries.as_slice())
        .unwrap_or_default();

    let mut table = format!(
        "```{:<4}  {:<16}  {:<7}  {}\n",
        "Pos:", "Driver:", "Points:", "Status:"
    );
    for entry in &entries[marker.window(RESULT_PAGE_SIZE, entries.len())] {
        let name = drivers
            .get(&entry.driver_id)
            .map_or(entry.driver_id.as_str(), |driver| driver.name.as_str());
        table.push_str(&format!(
            "{:<4}  {:<16}  {:<7}  {}\n",
            format!("#{}", entry.position),
            name,
            points(entry.points),
            entry.status
        ));
    }
    table.push_str("```");

    themed()
        .title(race_title(race))
        .field("Result", table, true)
        .footer(CreateEmbedFooter::new(marker.to_string()))
}

fn position(position: Option<u32>) -> String {
    position.map_or_else(|| "-".to_owned(), |p| p.to_string())
}
