use serenity::{
    all::{CommandInteraction, Context, Permissions},
    builder::CreateCommand,
};
use tracing::info;

use super::{is_admin, reply_ephemeral};
use crate::{error::Result, model::Subscriber, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("togglenotifications")
        .description("Toggle race notifications for this channel.")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .dm_permission(false)
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let Some(guild_id) = cmd.guild_id else {
        return reply_ephemeral(ctx, cmd, "Can only be used in a server.").await;
    };
    if !is_admin(cmd) {
        return reply_ephemeral(
            ctx,
            cmd,
            "You need administrator permission to do that.",
        )
        .await;
    }

    let subscribed = state
        .subscribers
        .toggle(Subscriber::new(cmd.channel_id, guild_id))
        .await?;
    info!(
        channel = %cmd.channel_id,
        subscribed,
        revision = state.subscribers.revision(),
        "notification subscription changed"
    );
    let message = if subscribed {
        "This channel will now get a message before every race."
    } else {
        "This channel will no longer get race notifications."
    };
    reply_ephemeral(ctx, cmd, message).await
}
