//! Arms the two per-race timers and keeps them pointed at the next race.

pub mod timer;

use std::{
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Datelike, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    model::Race,
    notifier::Notifier,
    season::SeasonSource,
    subscribers::SubscriberStore,
};

pub use timer::{TimerSlot, TimerState};

/// Delay after race start before the results are pulled.
pub const REFRESH_DELAY: chrono::Duration = chrono::Duration::minutes(1);
/// Refresh interval once the calendar has nothing left to wait for.
pub const IDLE_REFRESH: chrono::Duration = chrono::Duration::hours(24);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct Scheduler {
    source: Arc<dyn SeasonSource>,
    notifier: Arc<dyn Notifier>,
    subscribers: Arc<SubscriberStore>,
    clock: Arc<dyn Clock>,
    pre_race: TimerSlot,
    refresh: TimerSlot,
    worker: Mutex<()>,
    /// Season year and round of the last announcement sent.
    announced: StdMutex<Option<(i32, u32)>>,
}

fn delay_until(now: DateTime<Utc>, at: DateTime<Utc>) -> Option<Duration> {
    (at - now).to_std().ok()
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn SeasonSource>,
        notifier: Arc<dyn Notifier>,
        subscribers: Arc<SubscriberStore>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            notifier,
            subscribers,
            clock,
            pre_race: TimerSlot::new("pre-race"),
            refresh: TimerSlot::new("refresh"),
            worker: Mutex::new(()),
            announced: StdMutex::new(None),
        })
    }

    pub fn pre_race_state(&self) -> TimerState {
        self.pre_race.state()
    }

    pub fn refresh_state(&self) -> TimerState {
        self.refresh.state()
    }

    fn last_announced(&self) -> Option<(i32, u32)> {
        *self.announced.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `race` as announced. False if it already was.
    fn mark_announced(&self, race: &Race) -> bool {
        let key = Some((race.start.year(), race.round));
        let mut announced =
            self.announced.lock().unwrap_or_else(PoisonError::into_inner);
        if *announced == key {
            return false;
        }
        *announced = key;
        true
    }

    /// Arms the pre-race announcement for the next race. Nothing is armed
    /// when that instant has already passed or the race was announced.
    pub fn schedule(self: &Arc<Self>) {
        let snapshot = self.source.snapshot();
        let now = self.clock.now();
        let Some(race) = snapshot.next_race(now) else {
            debug!("empty calendar, no pre-race timer");
            self.pre_race.cancel();
            return;
        };

        if self.last_announced() == Some((race.start.year(), race.round)) {
            debug!(round = race.round, "already announced");
            self.pre_race.cancel();
            return;
        }

        let at = race.upcoming_date();
        let Some(delay) = delay_until(now, at) else {
            debug!(round = race.round, %at, "pre-race instant passed");
            self.pre_race.cancel();
            return;
        };

        let this = self.clone();
        let race = race.clone();
        info!(round = race.round, race = %race.name, %at, "pre-race timer armed");
        self.pre_race
            .arm(at, delay, async move { this.announce(race).await });
    }

    /// Arms the data refresh shortly after the next race starts.
    pub fn schedule_update(self: &Arc<Self>) {
        let snapshot = self.source.snapshot();
        let now = self.clock.now();
        let at = snapshot
            .next_race(now)
            .map(|race| race.start + REFRESH_DELAY)
            .filter(|at| *at > now)
            .unwrap_or(now + IDLE_REFRESH);
        let delay = delay_until(now, at).unwrap_or_default();

        let this = self.clone();
        info!(%at, "refresh timer armed");
        self.refresh
            .arm(at, delay, async move { this.run_refresh().await });
    }

    pub fn reschedule(self: &Arc<Self>) {
        self.schedule();
        self.schedule_update();
    }

    /// Refreshes the season and re-arms both timers unless nothing changed.
    pub async fn refresh_and_reschedule(
        self: &Arc<Self>,
        force: bool,
    ) -> Result<bool> {
        let outcome = self.source.refresh(force).await;
        // A failed refresh may still have swapped in some parts.
        if !matches!(outcome, Ok(false)) {
            self.reschedule();
            self.update_topics().await;
        }
        outcome
    }

    /// Points every subscriber channel's topic at the next race.
    pub async fn update_topics(&self) {
        let snapshot = self.source.snapshot();
        let next = snapshot.next_race(self.clock.now());
        for subscriber in &self.subscribers.list().await {
            if let Err(why) = self.notifier.set_topic(subscriber, next).await {
                warn!(channel = %subscriber.channel, "topic update failed: {why}");
            }
        }
    }

    pub fn shutdown(&self) {
        self.pre_race.cancel();
        self.refresh.cancel();
    }

    async fn announce(self: Arc<Self>, race: Race) {
        let _worker = self.worker.lock().await;
        if !self.mark_announced(&race) {
            debug!(round = race.round, "already announced, skipping");
            return;
        }
        let subscribers = self.subscribers.list().await;
        info!(
            round = race.round,
            subscribers = subscribers.len(),
            "sending pre-race notifications"
        );
        for subscriber in &subscribers {
            if let Err(why) = self.notifier.announce(subscriber, &race).await {
                warn!(
                    channel = %subscriber.channel,
                    guild = %subscriber.guild,
                    "pre-race notification failed: {why}"
                );
            }
        }
    }

    async fn run_refresh(self: Arc<Self>) {
        let _worker = self.worker.lock().await;
        match self.source.refresh(false).await {
            Ok(changed) => info!(changed, "scheduled refresh done"),
            Err(why) => warn!("scheduled refresh failed: {why}"),
        }
        self.reschedule();
        self.update_topics().await;
    }
}
