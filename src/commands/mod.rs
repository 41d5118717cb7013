use std::sync::Arc;

use serenity::{
    all::{CommandInteraction, Context},
    builder::{
        CreateCommand, CreateInteractionResponse,
        CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
        EditInteractionResponse,
    },
    http::Http,
    model::application::Command,
};
use tracing::{info, warn};

use crate::{error::Result, model::Snapshot, state::AppState};

pub mod calendar;
pub mod components;
pub mod constructor_standings;
pub mod driver_standings;
pub mod get_driver;
pub mod get_race;
pub mod next_race;
pub mod ping;
pub mod race_ping;
pub mod sync;
pub mod toggle_notifications;

/// Shown to the user whenever a handler fails; the detail goes to the logs.
pub const INTERNAL_ERROR: &str = "Internal error occurred.";

pub fn all(snapshot: &Snapshot) -> Vec<CreateCommand> {
    vec![
        ping::register(),
        next_race::register(),
        get_race::register(snapshot),
        calendar::register(),
        driver_standings::register(),
        constructor_standings::register(),
        get_driver::register(snapshot),
        toggle_notifications::register(),
        race_ping::register(),
        sync::register(),
    ]
}

/// Replaces every global command with the current set.
pub async fn register_all(http: &Http, snapshot: &Snapshot) -> Result {
    let commands = Command::set_global_commands(http, all(snapshot)).await?;
    info!(count = commands.len(), "registered global commands");
    Ok(())
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    match cmd.data.name.as_str() {
        "ping" => ping::run(ctx, cmd).await,
        "nextrace" => next_race::run(ctx, cmd, state).await,
        "getrace" => get_race::run(ctx, cmd, state).await,
        "calendar" => calendar::run(ctx, cmd, state).await,
        "driverstandings" => driver_standings::run(ctx, cmd, state).await,
        "constructorstandings" => {
            constructor_standings::run(ctx, cmd, state).await
        },
        "getdriver" => get_driver::run(ctx, cmd, state).await,
        "togglenotifications" => {
            toggle_notifications::run(ctx, cmd, state).await
        },
        "raceping" => race_ping::run(ctx, cmd, state).await,
        "sync" => sync::run(ctx, cmd, state).await,
        _ => unimplemented(ctx, cmd).await,
    }
}

pub async fn unimplemented(ctx: &Context, cmd: &CommandInteraction) -> Result {
    warn!(command = %cmd.data.name, "unknown command");
    reply_ephemeral(ctx, cmd, "Not implemented!").await
}

/// Tells the user something went wrong, whether or not the interaction was
/// already deferred.
pub async fn report_failure(ctx: &Context, cmd: &CommandInteraction) {
    let initial = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .ephemeral(true)
            .content(INTERNAL_ERROR),
    );
    if cmd.create_response(ctx, initial).await.is_ok() {
        return;
    }
    let followup = CreateInteractionResponseFollowup::new()
        .ephemeral(true)
        .content(INTERNAL_ERROR);
    if let Err(why) = cmd.create_followup(ctx, followup).await {
        warn!("could not report failure to user: {why}");
    }
}

pub async fn reply_ephemeral(
    ctx: &Context,
    cmd: &CommandInteraction,
    content: impl Into<String>,
) -> Result {
    cmd.create_response(
        ctx,
        CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .ephemeral(true)
                .content(content),
        ),
    )
    .await?;
    Ok(())
}

/// Defers the reply and brings the season up to date. A failed refresh is
/// not fatal here; whatever the snapshot still holds is served.
pub async fn deferred_snapshot(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result<Arc<Snapshot>> {
    cmd.defer(ctx).await?;
    if let Err(why) = state.scheduler.refresh_and_reschedule(false).await {
        warn!(command = %cmd.data.name, "refresh before reply failed: {why}");
    }
    Ok(state.season.snapshot())
}

pub async fn edit_text(
    ctx: &Context,
    cmd: &CommandInteraction,
    content: impl Into<String>,
) -> Result {
    cmd.edit_response(ctx, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

pub fn is_admin(cmd: &CommandInteraction) -> bool {
    cmd.member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator())
}
