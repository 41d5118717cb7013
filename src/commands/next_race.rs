use chrono::Utc;
use serenity::{
    all::{CommandInteraction, Context},
    builder::{CreateCommand, EditInteractionResponse},
};

use super::{deferred_snapshot, edit_text};
use crate::{embeds, error::Result, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("nextrace").description("Get the upcoming race.")
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    let Some(race) = snapshot.next_race(Utc::now()) else {
        return edit_text(ctx, cmd, "No races are scheduled.").await;
    };

    cmd.edit_response(
        ctx,
        EditInteractionResponse::new().embed(embeds::race(race)),
    )
    .await?;
    Ok(())
}
