use serenity::{
    all::{ActivityData, Interaction, Ready},
    async_trait,
    prelude::{Context, EventHandler},
};
use tracing::{error, info, warn};

use crate::{
    commands::{self, components},
    state::AppState,
};

pub struct BotEvents {
    pub state: AppState,
}

#[async_trait]
impl EventHandler for BotEvents {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected");
        ctx.set_activity(Some(ActivityData::watching("the F1 calendar")));

        let snapshot = self.state.season.snapshot();
        if let Err(why) = commands::register_all(&ctx.http, &snapshot).await {
            error!("registering commands: {why}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(cmd) => {
                if let Err(why) = commands::run(&ctx, &cmd, &self.state).await {
                    error!(command = %cmd.data.name, "command failed: {why}");
                    commands::report_failure(&ctx, &cmd).await;
                }
            },
            Interaction::Component(component) => {
                if let Err(why) =
                    components::handle(&ctx, &component, &self.state).await
                {
                    warn!(
                        id = %component.data.custom_id,
                        "button press failed: {why}"
                    );
                }
            },
            _ => {},
        }
    }
}
