use std::time::Instant;

use serenity::{
    all::{CommandInteraction, Context},
    builder::{
        CreateCommand, CreateInteractionResponse,
        CreateInteractionResponseMessage,
    },
};

use super::edit_text;
use crate::error::Result;

pub fn register() -> CreateCommand {
    CreateCommand::new("ping").description("Check if the bot is running.")
}

pub async fn run(ctx: &Context, cmd: &CommandInteraction) -> Result {
    let started = Instant::now();
    cmd.create_response(
        ctx,
        CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content("Pong!"),
        ),
    )
    .await?;
    let latency = started.elapsed().as_millis();
    edit_text(ctx, cmd, format!("Pong! `{latency} ms`")).await
}
