use serenity::{
    all::{CommandInteraction, Context, Permissions},
    builder::{CreateCommand, EditInteractionResponse},
};
use tracing::{error, info};

use super::{is_admin, register_all, reply_ephemeral};
use crate::{error::Result, runner::TimerState, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("sync")
        .description("Reload season data and re-register commands.")
        .default_member_permissions(Permissions::ADMINISTRATOR)
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    if !is_admin(cmd) {
        return reply_ephemeral(
            ctx,
            cmd,
            "You need administrator permission to do that.",
        )
        .await;
    }
    info!(user = %cmd.user.id, "sync requested");
    cmd.defer_ephemeral(ctx).await?;

    let mut notes = Vec::new();
    match state.scheduler.refresh_and_reschedule(true).await {
        Ok(_) => notes.push("Season data reloaded."),
        Err(why) => {
            error!("forced refresh failed: {why}");
            notes.push("Some season data could not be reloaded.");
        },
    }

    match register_all(&ctx.http, &state.season.snapshot()).await {
        Ok(()) => notes.push("Synced commands!"),
        Err(why) => {
            error!("registering commands: {why}");
            notes.push("Commands could not be registered.");
        },
    }

    let mut lines: Vec<String> = notes.into_iter().map(str::to_owned).collect();
    lines.push(describe("Next announcement", state.scheduler.pre_race_state()));
    lines.push(describe("Next refresh", state.scheduler.refresh_state()));

    cmd.edit_response(ctx, EditInteractionResponse::new().content(lines.join("\n")))
        .await?;
    Ok(())
}

fn describe(label: &str, state: TimerState) -> String {
    match state {
        TimerState::Armed(at) => format!("{label}: <t:{}:R>", at.timestamp()),
        TimerState::Idle => format!("{label}: not armed"),
        TimerState::Fired => format!("{label}: already sent"),
    }
}
