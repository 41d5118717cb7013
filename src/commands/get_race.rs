use serenity::{
    all::{CommandInteraction, CommandOptionType, Context, ResolvedValue},
    builder::{CreateCommand, CreateCommandOption, EditInteractionResponse},
};

use super::{components::race_row, deferred_snapshot, edit_text};
use crate::{embeds, error::Result, model::Snapshot, state::AppState};

pub fn register(snapshot: &Snapshot) -> CreateCommand {
    let mut option = CreateCommandOption::new(
        CommandOptionType::Integer,
        "racenumber",
        "Race to get info from",
    )
    .required(true)
    .min_int_value(1);
    if !snapshot.races.is_empty() {
        option = option.max_int_value(snapshot.races.len() as u64);
    }

    CreateCommand::new("getrace")
        .description("Get info about a race this season.")
        .add_option(option)
}

fn round(cmd: &CommandInteraction) -> Option<u32> {
    cmd.data.options().into_iter().find_map(|option| match option.value {
        ResolvedValue::Integer(n) if option.name == "racenumber" => {
            u32::try_from(n).ok()
        },
        _ => None,
    })
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    let Some(race) = round(cmd).and_then(|round| snapshot.race(round)) else {
        return edit_text(ctx, cmd, "There is no race with that number.").await;
    };

    let mut response = EditInteractionResponse::new().embed(embeds::race(race));
    if race.has_result() {
        response = response.components(vec![race_row(race.round, None)]);
    }
    cmd.edit_response(ctx, response).await?;
    Ok(())
}
