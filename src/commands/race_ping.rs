use serenity::{
    all::{CommandInteraction, Context},
    builder::CreateCommand,
};
use tracing::info;

use super::reply_ephemeral;
use crate::{error::Result, state::AppState};

pub fn register() -> CreateCommand {
    CreateCommand::new("raceping")
        .description("Get or drop the role that is pinged before every race.")
        .dm_permission(false)
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let (Some(guild_id), Some(member)) = (cmd.guild_id, cmd.member.as_deref())
    else {
        return reply_ephemeral(ctx, cmd, "Can only be used in a server.").await;
    };

    let roles = guild_id.roles(&ctx.http).await?;
    let Some(role) = roles.values().find(|role| role.name == state.notify_role)
    else {
        return reply_ephemeral(
            ctx,
            cmd,
            format!("This server has no role called `{}`.", state.notify_role),
        )
        .await;
    };

    let message = if member.roles.contains(&role.id) {
        member.remove_role(&ctx.http, role.id).await?;
        format!("Removed the `{}` role.", role.name)
    } else {
        member.add_role(&ctx.http, role.id).await?;
        format!("You now have the `{}` role.", role.name)
    };
    info!(guild = %guild_id, user = %member.user.id, role = %role.name, "race ping toggled");
    reply_ephemeral(ctx, cmd, message).await
}
