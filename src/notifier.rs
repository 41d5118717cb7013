use std::sync::Arc;

use serenity::{
    async_trait,
    builder::{CreateMessage, EditChannel},
    http::Http,
    model::id::{GuildId, RoleId},
};
use tracing::debug;

use crate::{
    embeds,
    error::Result,
    model::{Race, Subscriber},
};

/// Delivers the pre-race announcement to one subscriber.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn announce(&self, subscriber: &Subscriber, race: &Race) -> Result;

    /// Points the subscriber channel's topic at the next race.
    async fn set_topic(&self, subscriber: &Subscriber, next: Option<&Race>) -> Result;
}

pub fn channel_topic(next: Option<&Race>) -> String {
    match next {
        Some(race) => format!(
            "Everything Formula 1 | Next race: <t:{}:R>",
            race.start.timestamp()
        ),
        None => "Everything Formula 1".to_owned(),
    }
}

pub struct DiscordNotifier {
    http: Arc<Http>,
    role_name: String,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>, role_name: impl Into<String>) -> Self {
        Self {
            http,
            role_name: role_name.into(),
        }
    }

    async fn role(&self, guild: GuildId) -> Result<Option<RoleId>> {
        let roles = guild.roles(&self.http).await?;
        Ok(roles
            .values()
            .find(|role| role.name == self.role_name)
            .map(|role| role.id))
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn announce(&self, subscriber: &Subscriber, race: &Race) -> Result {
        let mut message = CreateMessage::new().embed(embeds::upcoming(race));
        match self.role(subscriber.guild).await {
            Ok(Some(role)) => message = message.content(format!("<@&{role}>")),
            Ok(None) => {},
            Err(why) => {
                debug!(guild = %subscriber.guild, "role lookup failed: {why}");
            },
        }

        subscriber.channel.send_message(&self.http, message).await?;
        debug!(channel = %subscriber.channel, round = race.round, "announced");
        Ok(())
    }

    async fn set_topic(&self, subscriber: &Subscriber, next: Option<&Race>) -> Result {
        let topic = channel_topic(next);
        subscriber
            .channel
            .edit(&self.http, EditChannel::new().topic(&topic))
            .await?;
        debug!(channel = %subscriber.channel, topic, "topic updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::channel_topic;
    use crate::model::Race;

    #[test]
    fn topic_counts_down_to_the_next_race() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap();
        let race = Race::sample(2, start);
        assert_eq!(
            channel_topic(Some(&race)),
            "Everything Formula 1 | Next race: <t:1710003600:R>"
        );
        assert_eq!(channel_topic(None), "Everything Formula 1");
    }
}
