//! Buttons attached to paged and tabbed embeds.
//!
//! Custom ids are `<kind>:<action>[:<round>]`. The round travels in the id so
//! a press can be served from the current snapshot alone.

use std::{fmt, result::Result as StdResult, str::FromStr};

use serenity::{
    all::{ButtonStyle, ComponentInteraction, Context},
    builder::{
        CreateActionRow, CreateButton, CreateInteractionResponse,
        CreateInteractionResponseMessage,
    },
};
use tracing::warn;

use crate::{
    embeds::{self, RESULT_PAGE_SIZE, STANDINGS_PAGE_SIZE},
    error::Result,
    pagination::{PageAction, PageMarker, PageTurn, PaginationError, turn},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    DriverStandings(PageAction),
    RaceInfo(u32),
    RaceResult(u32),
    ResultPage(PageAction, u32),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown component id {0:?}")]
pub struct UnknownComponent(pub String);

fn action(text: &str) -> Option<PageAction> {
    match text {
        "prev" => Some(PageAction::Previous),
        "next" => Some(PageAction::Next),
        _ => None,
    }
}

fn action_str(action: PageAction) -> &'static str {
    match action {
        PageAction::Previous => "prev",
        PageAction::Next => "next",
    }
}

impl FromStr for ComponentId {
    type Err = UnknownComponent;

    fn from_str(id: &str) -> StdResult<Self, Self::Err> {
        let unknown = || UnknownComponent(id.to_owned());
        let parts: Vec<&str> = id.split(':').collect();
        let round = |text: &str| text.parse::<u32>().ok().filter(|r| *r > 0);

        let parsed = match parts.as_slice() {
            ["dstandings", act] => action(act).map(Self::DriverStandings),
            ["getrace", "info", r] => round(r).map(Self::RaceInfo),
            ["getrace", "result", r] => round(r).map(Self::RaceResult),
            ["resultpage", act, r] => {
                action(act).zip(round(r)).map(|(a, r)| Self::ResultPage(a, r))
            },
            _ => None,
        };
        parsed.ok_or_else(unknown)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverStandings(a) => write!(f, "dstandings:{}", action_str(*a)),
            Self::RaceInfo(r) => write!(f, "getrace:info:{r}"),
            Self::RaceResult(r) => write!(f, "getrace:result:{r}"),
            Self::ResultPage(a, r) => {
                write!(f, "resultpage:{}:{r}", action_str(*a))
            },
        }
    }
}

fn button(id: ComponentId, label: &str, disabled: bool) -> CreateButton {
    CreateButton::new(id.to_string())
        .label(label)
        .style(ButtonStyle::Danger)
        .disabled(disabled)
}

pub fn standings_row(state: PageTurn) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        button(
            ComponentId::DriverStandings(PageAction::Previous),
            "Previous",
            state.previous_disabled,
        ),
        button(
            ComponentId::DriverStandings(PageAction::Next),
            "Next",
            state.next_disabled,
        ),
    ])
}

/// Info/Result tabs, with the pager appended while the result is shown.
pub fn race_row(round: u32, result_page: Option<PageTurn>) -> CreateActionRow {
    let mut buttons = vec![
        button(ComponentId::RaceInfo(round), "Info", result_page.is_none()),
        button(ComponentId::RaceResult(round), "Result", result_page.is_some()),
    ];
    if let Some(state) = result_page {
        buttons.push(button(
            ComponentId::ResultPage(PageAction::Previous, round),
            "Prev",
            state.previous_disabled,
        ));
        buttons.push(button(
            ComponentId::ResultPage(PageAction::Next, round),
            "Next",
            state.next_disabled,
        ));
    }
    CreateActionRow::Buttons(buttons)
}

fn footer_marker(
    component: &ComponentInteraction,
) -> StdResult<PageMarker, PaginationError> {
    let text = component
        .message
        .embeds
        .first()
        .and_then(|embed| embed.footer.as_ref())
        .map(|footer| footer.text.as_str())
        .unwrap_or_default();
    text.parse()
}

pub async fn handle(
    ctx: &Context,
    component: &ComponentInteraction,
    state: &AppState,
) -> Result {
    let id = match component.data.custom_id.parse::<ComponentId>() {
        Ok(id) => id,
        Err(why) => {
            warn!("ignoring button press: {why}");
            return acknowledge(ctx, component).await;
        },
    };

    let snapshot = state.season.snapshot();
    let update = match id {
        ComponentId::DriverStandings(action) => {
            let drivers = snapshot.driver_standings();
            match footer_marker(component).and_then(|marker| {
                turn(marker, action, STANDINGS_PAGE_SIZE, drivers.len())
            }) {
                Ok(next) => Some(
                    CreateInteractionResponseMessage::new()
                        .embed(embeds::driver_standings(&drivers, next.marker))
                        .components(vec![standings_row(next)]),
                ),
                Err(why) => {
                    warn!(%id, "ignoring page turn: {why}");
                    None
                },
            }
        },
        ComponentId::RaceInfo(round) => snapshot.race(round).map(|race| {
            let row = race.has_result().then(|| race_row(round, None));
            CreateInteractionResponseMessage::new()
                .embed(embeds::race(race))
                .components(row.into_iter().collect())
        }),
        ComponentId::RaceResult(round) => {
            snapshot.race(round).filter(|race| race.has_result()).map(|race| {
                let total = race.result.as_ref().map_or(0, |r| r.entries.len());
                let first = PageMarker::first(RESULT_PAGE_SIZE, total);
                CreateInteractionResponseMessage::new()
                    .embed(embeds::race_result(race, &snapshot.drivers, first))
                    .components(vec![race_row(
                        round,
                        Some(first.turn_state(RESULT_PAGE_SIZE, total)),
                    )])
            })
        },
        ComponentId::ResultPage(action, round) => {
            match snapshot.race(round).filter(|race| race.has_result()) {
                Some(race) => {
                    let total =
                        race.result.as_ref().map_or(0, |r| r.entries.len());
                    match footer_marker(component).and_then(|marker| {
                        turn(marker, action, RESULT_PAGE_SIZE, total)
                    }) {
                        Ok(next) => Some(
                            CreateInteractionResponseMessage::new()
                                .embed(embeds::race_result(
                                    race,
                                    &snapshot.drivers,
                                    next.marker,
                                ))
                                .components(vec![race_row(round, Some(next))]),
                        ),
                        Err(why) => {
                            warn!(%id, "ignoring page turn: {why}");
                            None
                        },
                    }
                },
                None => None,
            }
        },
    };

    match update {
        Some(message) => {
            component
                .create_response(
                    ctx,
                    CreateInteractionResponse::UpdateMessage(message),
                )
                .await?;
            Ok(())
        },
        None => {
            if matches!(id, ComponentId::RaceInfo(_) | ComponentId::RaceResult(_)) {
                warn!(%id, "race no longer in the calendar");
            }
            acknowledge(ctx, component).await
        },
    }
}

/// Answers without touching the message.
async fn acknowledge(ctx: &Context, component: &ComponentInteraction) -> Result {
    component
        .create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;
    Ok(())
}
