use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId};

/// A channel that wants the pre-race announcement.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscriber {
    #[serde(rename = "textChannel")]
    pub channel: ChannelId,
    #[serde(rename = "guild")]
    pub guild: GuildId,
}

impl Subscriber {
    pub fn new(channel: ChannelId, guild: GuildId) -> Self {
        Self { channel, guild }
    }
}
