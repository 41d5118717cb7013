use std::{process::ExitCode, sync::Arc};

use serenity::{Client, all::GatewayIntents, http::Http};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, prelude::*};

use crate::{
    config::Config,
    crawler::{Endpoints, HttpTransport, ResourceCache},
    event_manager::BotEvents,
    notifier::DiscordNotifier,
    runner::{Scheduler, SystemClock},
    season::{SeasonSource, SeasonStore},
    state::AppState,
    subscribers::SubscriberStore,
};

mod commands;
mod config;
mod crawler;
mod embeds;
mod error;
mod event_manager;
mod middleware;
mod model;
mod notifier;
mod pagination;
mod runner;
mod season;
mod state;
mod subscribers;

fn init_logging(config: &Config) -> Option<sentry::ClientInitGuard> {
    let guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((dsn, sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        }))
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .with(guard.is_some().then(sentry::integrations::tracing::layer))
        .init();
    guard
}

async fn run(config: Config) -> error::Result {
    let transport = Arc::new(HttpTransport::new()?);
    let cache = ResourceCache::new(&config.cache_dir, transport);
    let season = Arc::new(SeasonStore::new(cache, Endpoints::new(&config.api_base)));

    // Nothing sensible can be served without an initial season.
    season.refresh(true).await?;
    let snapshot = season.snapshot();
    info!(
        races = snapshot.races.len(),
        drivers = snapshot.drivers.len(),
        "season loaded"
    );

    let subscribers = Arc::new(SubscriberStore::load(&config.subscribers_path).await?);
    info!(count = subscribers.list().await.len(), "subscribers loaded");

    let http = Arc::new(Http::new(&config.discord_token));
    let notifier = Arc::new(DiscordNotifier::new(http, &config.notify_role));
    let scheduler = Scheduler::new(
        season.clone(),
        notifier,
        subscribers.clone(),
        Arc::new(SystemClock),
    );
    scheduler.reschedule();
    scheduler.update_topics().await;

    let state = AppState {
        season,
        scheduler: scheduler.clone(),
        subscribers,
        notify_role: config.notify_role.clone(),
    };

    let mut client = Client::builder(&config.discord_token, GatewayIntents::GUILDS)
        .event_handler(BotEvents { state })
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!("listening for shutdown signal: {why}");
            return;
        }
        info!("shutting down");
        scheduler.shutdown();
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    drop(dotenvy::dotenv());
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(why) => {
            eprintln!("{why}");
            return ExitCode::FAILURE;
        },
    };
    let _sentry = init_logging(&config);

    info!("starting f1 season bot");
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            error!("fatal: {why}");
            ExitCode::FAILURE
        },
    }
}
