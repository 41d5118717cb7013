use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.jolpi.ca/ergast/f1";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub api_base: String,
    pub cache_dir: PathBuf,
    pub subscribers_path: PathBuf,
    pub notify_role: String,
    pub sentry_dsn: Option<String>,
}

impl Config {
    /// Reads the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        let discord_token = match env("DISCORD_TOKEN") {
            Some(token) => token,
            None => {
                let path = env("TOKEN_FILE")
                    .unwrap_or_else(|| "token/token.txt".to_owned());
                read_token_file(&path)?
            },
        };

        Ok(Self {
            discord_token,
            api_base: env("F1_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            cache_dir: env("CACHE_DIR").unwrap_or_else(|| "cache".into()).into(),
            subscribers_path: env("SUBSCRIBERS_PATH")
                .unwrap_or_else(|| "server_settings/notifications.json".into())
                .into(),
            notify_role: env("NOTIFY_ROLE")
                .unwrap_or_else(|| "F1 Notifications".to_owned()),
            sentry_dsn: env("SENTRY_DSN"),
        })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_token_file(path: &str) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|why| {
        Error::Config(format!(
            "DISCORD_TOKEN not set and token file {path} unreadable: {why}"
        ))
    })?;
    content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::Config(format!("token file {path} is empty")))
}
