use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    crawler::{Endpoints, ResourceCache},
    error::{Error, Result},
    middleware::parser::{
        parse_calendar, parse_constructor_standings, parse_driver_standings,
        parse_results,
    },
    model::{RaceResult, Snapshot},
};

/// Upper bound on result pages per refresh, far above a full season.
const MAX_RESULT_PAGES: usize = 50;

/// Something that owns a season snapshot and can bring it up to date.
#[async_trait]
pub trait SeasonSource: Send + Sync {
    /// Pulls every sub-resource that is due (or all of them when
    /// `force_all`). Returns whether anything was replaced.
    async fn refresh(&self, force_all: bool) -> Result<bool>;

    fn snapshot(&self) -> Arc<Snapshot>;
}

pub struct SeasonStore {
    cache: ResourceCache,
    endpoints: Endpoints,
    current: RwLock<Arc<Snapshot>>,
    refresh_lock: Mutex<()>,
}

impl SeasonStore {
    pub fn new(cache: ResourceCache, endpoints: Endpoints) -> Self {
        Self {
            cache,
            endpoints,
            current: RwLock::new(Arc::new(Snapshot::default())),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetches and parses one sub-resource if it is due. `Ok(None)` means it
    /// was left untouched.
    async fn pull<T>(
        &self,
        url: &str,
        force: bool,
        parse: fn(&[u8]) -> Result<T>,
    ) -> Result<Option<T>> {
        if !force && !self.cache.is_stale(url).await {
            return Ok(None);
        }
        self.fetch(url, force, parse).await.map(Some)
    }

    /// Like [`SeasonStore::pull`] for the paged results table. Staleness is
    /// judged on the first page; once due, every page is fetched again.
    async fn pull_results(
        &self,
        force: bool,
    ) -> Result<Option<HashMap<u32, RaceResult>>> {
        let first = self.endpoints.results_page(0);
        if !force && !self.cache.is_stale(&first).await {
            return Ok(None);
        }

        let mut results = HashMap::new();
        let mut offset = 0;
        for _ in 0..MAX_RESULT_PAGES {
            let url = self.endpoints.results_page(offset);
            let page = self.fetch(&url, force || offset > 0, parse_results).await?;
            let next = page.next_offset;
            page.merge_into(&mut results);
            match next {
                Some(next) => offset = next,
                None => return Ok(Some(results)),
            }
        }
        Err(Error::invalid(format!(
            "results span more than {MAX_RESULT_PAGES} pages"
        )))
    }

    async fn fetch<T>(
        &self,
        url: &str,
        force: bool,
        parse: fn(&[u8]) -> Result<T>,
    ) -> Result<T> {
        let document = self.cache.get(url, force).await?;
        debug!(url, origin = ?document.origin, "pulled");
        match parse(&document.body) {
            Ok(value) => Ok(value),
            Err(why) => {
                // Drop the unusable copy so the next cycle fetches again.
                if let Err(io) = tokio::fs::remove_file(self.cache.path_for(url)).await {
                    debug!(url, "could not drop cache entry: {io}");
                }
                Err(why)
            },
        }
    }

    fn swap(&self, next: Snapshot) {
        let mut guard =
            self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
    }
}

#[async_trait]
impl SeasonSource for SeasonStore {
    async fn refresh(&self, force_all: bool) -> Result<bool> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.snapshot();
        let mut next = Snapshot::clone(&current);
        let mut changed = false;
        let mut failure: Option<Error> = None;

        match self.pull(&self.endpoints.calendar, force_all, parse_calendar).await {
            Ok(Some(mut races)) => {
                for race in &mut races {
                    race.result =
                        current.race(race.round).and_then(|old| old.result.clone());
                }
                info!(races = races.len(), "calendar updated");
                next.races = races;
                changed = true;
            },
            Ok(None) => {},
            Err(why) => {
                warn!("calendar refresh failed: {why}");
                failure.get_or_insert(why);
            },
        }

        match self
            .pull(&self.endpoints.driver_standings, force_all, parse_driver_standings)
            .await
        {
            Ok(Some(drivers)) => {
                info!(drivers = drivers.len(), "driver standings updated");
                next.drivers = drivers;
                changed = true;
            },
            Ok(None) => {},
            Err(why) => {
                warn!("driver standings refresh failed: {why}");
                failure.get_or_insert(why);
            },
        }

        match self
            .pull(
                &self.endpoints.constructor_standings,
                force_all,
                parse_constructor_standings,
            )
            .await
        {
            Ok(Some(constructors)) => {
                info!(constructors = constructors.len(), "constructor standings updated");
                next.constructors = constructors;
                changed = true;
            },
            Ok(None) => {},
            Err(why) => {
                warn!("constructor standings refresh failed: {why}");
                failure.get_or_insert(why);
            },
        }

        if next.races.is_empty() {
            debug!("no calendar loaded, deferring results");
        } else {
            match self.pull_results(force_all).await {
                Ok(Some(mut results)) => {
                    for race in &mut next.races {
                        race.result = results.remove(&race.round);
                    }
                    if !results.is_empty() {
                        warn!(
                            rounds = ?results.keys().collect::<Vec<_>>(),
                            "results for rounds missing from the calendar"
                        );
                    }
                    info!("race results updated");
                    changed = true;
                },
                Ok(None) => {},
                Err(why) => {
                    warn!("results refresh failed: {why}");
                    failure.get_or_insert(why);
                },
            }
        }

        if changed {
            self.swap(next);
        }

        match failure {
            Some(why) => Err(why),
            None => Ok(changed),
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use chrono::{TimeZone, Utc};

    use super::{SeasonSource, SeasonStore};
    use crate::{
        crawler::{Endpoints, ResourceCache, cache::tests::FakeTransport},
        middleware::parser::tests::{
            CALENDAR, CONSTRUCTOR_STANDINGS, DRIVER_STANDINGS, RESULTS,
            RESULTS_PAGE_ONE, RESULTS_PAGE_TWO,
        },
    };

    struct Harness {
        dir: tempfile::TempDir,
        transport: Arc<FakeTransport>,
        endpoints: Endpoints,
        store: SeasonStore,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::new("https://api.example.test/f1");
        let transport = Arc::new(FakeTransport::default());
        transport.serve(&endpoints.calendar, CALENDAR);
        transport.serve(&endpoints.results_page(0), RESULTS);
        transport.serve(&endpoints.driver_standings, DRIVER_STANDINGS);
        transport.serve(&endpoints.constructor_standings, CONSTRUCTOR_STANDINGS);
        let cache = ResourceCache::new(dir.path(), transport.clone());
        let store = SeasonStore::new(cache, endpoints.clone());
        Harness {
            dir,
            transport,
            endpoints,
            store,
        }
    }

    fn expire(h: &Harness, url: &str) {
        let path = h.dir.path().join(crate::crawler::cache::cache_key(url));
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(25 * 3600))
            .unwrap();
    }

    #[tokio::test]
    async fn forced_refresh_pulls_everything() {
        let h = harness();
        assert!(h.store.refresh(true).await.unwrap());
        assert_eq!(h.transport.call_count(), 4);

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.races.len(), 3);
        assert_eq!(snapshot.drivers.len(), 3);
        assert_eq!(snapshot.constructors.len(), 2);

        assert!(h.store.refresh(true).await.unwrap());
        assert_eq!(h.transport.call_count(), 8);
    }

    #[tokio::test]
    async fn unforced_refresh_of_fresh_data_is_a_noop() {
        let h = harness();
        h.store.refresh(true).await.unwrap();
        let before = h.store.snapshot();

        assert!(!h.store.refresh(false).await.unwrap());
        assert_eq!(h.transport.call_count(), 4);
        assert!(Arc::ptr_eq(&before, &h.store.snapshot()));
    }

    #[tokio::test]
    async fn results_attach_by_round() {
        let h = harness();
        h.store.refresh(true).await.unwrap();
        let snapshot = h.store.snapshot();

        let saudi = snapshot.race(2).unwrap();
        assert_eq!(saudi.name, "Saudi Arabian Grand Prix");
        let winner = &saudi.result.as_ref().unwrap().entries[0];
        assert_eq!(winner.driver_id, "max_verstappen");
        assert_eq!(winner.laps, 50);
        assert!(snapshot.race(1).unwrap().has_result());
        assert!(!snapshot.race(3).unwrap().has_result());
    }

    #[tokio::test]
    async fn results_are_read_across_pages() {
        let h = harness();
        h.transport.serve(&h.endpoints.results_page(0), RESULTS_PAGE_ONE);
        h.transport.serve(&h.endpoints.results_page(3), RESULTS_PAGE_TWO);

        h.store.refresh(true).await.unwrap();
        assert_eq!(h.transport.call_count(), 5);

        let snapshot = h.store.snapshot();
        let split = &snapshot.race(2).unwrap().result.as_ref().unwrap().entries;
        let order: Vec<_> = split.iter().map(|e| e.driver_id.as_str()).collect();
        assert_eq!(order, ["max_verstappen", "perez"]);
        assert_eq!(split[1].laps, 50);
        assert!(snapshot.race(1).unwrap().has_result());
    }

    #[tokio::test]
    async fn missing_results_page_keeps_previous_results() {
        let h = harness();
        h.store.refresh(true).await.unwrap();

        h.transport.serve(&h.endpoints.results_page(0), RESULTS_PAGE_ONE);
        assert!(h.store.refresh(true).await.is_err());
        assert_eq!(h.transport.calls_to(&h.endpoints.results_page(3)), 1);

        // Round 2 was not cut in half by the failed second page.
        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.race(2).unwrap().result.as_ref().unwrap().entries.len(), 2);
    }

    #[tokio::test]
    async fn only_stale_parts_are_refetched() {
        let h = harness();
        h.store.refresh(true).await.unwrap();
        expire(&h, &h.endpoints.calendar);

        assert!(h.store.refresh(false).await.unwrap());
        assert_eq!(h.transport.call_count(), 5);
        assert_eq!(h.transport.calls_to(&h.endpoints.calendar), 2);

        // Results were not refetched but stay attached to the new calendar.
        assert!(h.store.snapshot().race(2).unwrap().has_result());
    }

    #[tokio::test]
    async fn results_wait_for_a_calendar() {
        let h = harness();
        h.transport.bodies.lock().unwrap().remove(&h.endpoints.calendar);

        assert!(h.store.refresh(true).await.is_err());
        assert_eq!(h.transport.calls_to(&h.endpoints.results_page(0)), 0);

        // The parts that did load are still published.
        let snapshot = h.store.snapshot();
        assert!(snapshot.races.is_empty());
        assert_eq!(snapshot.drivers.len(), 3);
    }

    #[tokio::test]
    async fn unparsable_document_is_dropped_from_cache() {
        let h = harness();
        h.transport.serve(&h.endpoints.constructor_standings, "not json");

        assert!(h.store.refresh(true).await.is_err());
        assert!(h.store.snapshot().constructors.is_empty());

        h.transport
            .serve(&h.endpoints.constructor_standings, CONSTRUCTOR_STANDINGS);
        assert!(h.store.refresh(false).await.unwrap());
        assert_eq!(h.store.snapshot().constructors.len(), 2);
        assert_eq!(h.transport.calls_to(&h.endpoints.calendar), 1);
    }

    #[tokio::test]
    async fn next_race_follows_the_snapshot() {
        let h = harness();
        h.store.refresh(true).await.unwrap();
        let between = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.next_race(between).map(|r| r.round), Some(2));
        assert_eq!(snapshot.next_race(after).map(|r| r.round), Some(3));
    }
}
