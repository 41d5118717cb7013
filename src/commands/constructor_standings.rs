use serenity::{
    all::{CommandInteraction, Context},
    builder::{CreateCommand, EditInteractionResponse},
};

use super::{deferred_snapshot, edit_text};
use crate::{embeds, error::Result, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("constructorstandings")
        .description("Show the constructor championship standings.")
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    if snapshot.constructors.is_empty() {
        return edit_text(ctx, cmd, "No standings yet this season.").await;
    }

    cmd.edit_response(
        ctx,
        EditInteractionResponse::new()
            .embed(embeds::constructor_standings(&snapshot.constructors)),
    )
    .await?;
    Ok(())
}
