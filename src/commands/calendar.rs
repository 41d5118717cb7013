use chrono::Utc;
use serenity::{
    all::{CommandInteraction, Context},
    builder::{CreateCommand, EditInteractionResponse},
};

use super::{deferred_snapshot, edit_text};
use crate::{embeds, error::Result, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("calendar").description("Show this season's calendar.")
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    if snapshot.races.is_empty() {
        return edit_text(ctx, cmd, "No races are scheduled.").await;
    }

    let next = snapshot.next_race(Utc::now()).map(|race| race.round);
    cmd.edit_response(
        ctx,
        EditInteractionResponse::new()
            .embed(embeds::calendar(&snapshot.races, next)),
    )
    .await?;
    Ok(())
}
