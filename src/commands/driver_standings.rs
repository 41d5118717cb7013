use serenity::{
    all::{CommandInteraction, Context},
    builder::{CreateCommand, EditInteractionResponse},
};

use super::{components::standings_row, deferred_snapshot, edit_text};
use crate::{
    embeds::{self, STANDINGS_PAGE_SIZE},
    error::Result,
    pagination::PageMarker,
    state::AppState,
};

pub fn register() -> CreateCommand {
    CreateCommand::new("driverstandings")
        .description("Show the driver championship standings.")
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    let drivers = snapshot.driver_standings();
    if drivers.is_empty() {
        return edit_text(ctx, cmd, "No standings yet this season.").await;
    }

    let first = PageMarker::first(STANDINGS_PAGE_SIZE, drivers.len());
    cmd.edit_response(
        ctx,
        EditInteractionResponse::new()
            .embed(embeds::driver_standings(&drivers, first))
            .components(vec![standings_row(
                first.turn_state(STANDINGS_PAGE_SIZE, drivers.len()),
            )]),
    )
    .await?;
    Ok(())
}
