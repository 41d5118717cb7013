use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use tokio::fs;
use tracing::{debug, info, warn};

use super::Transport;
use crate::error::Result;

/// Minimum age before a cached document is fetched again.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Network,
    Cache,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub body: Vec<u8>,
    pub origin: Origin,
}

/// One file per resource under `dir`; the file mtime is the fetch time.
pub struct ResourceCache {
    dir: PathBuf,
    transport: Arc<dyn Transport>,
    tmp_counter: AtomicU64,
}

/// Filesystem-safe, deterministic name for a resource URL.
pub fn cache_key(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    stripped
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl ResourceCache {
    pub fn new(dir: impl Into<PathBuf>, transport: Arc<dyn Transport>) -> Self {
        Self {
            dir: dir.into(),
            transport,
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// True when there is no usable cached copy younger than [`CACHE_TTL`].
    /// Any filesystem error counts as stale.
    pub async fn is_stale(&self, url: &str) -> bool {
        let path = self.path_for(url);
        let modified = match fs::metadata(&path).await.and_then(|m| m.modified())
        {
            Ok(modified) => modified,
            Err(why) => {
                debug!(path = %path.display(), "no usable cache entry: {why}");
                return true;
            },
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > CACHE_TTL,
            // mtime in the future, treat as just written.
            Err(_) => false,
        }
    }

    /// Serves the cached copy while fresh, otherwise fetches and overwrites
    /// it. A failed fetch falls back to whatever is cached.
    pub async fn get(&self, url: &str, force_refresh: bool) -> Result<Document> {
        let path = self.path_for(url);

        if !force_refresh && !self.is_stale(url).await {
            match fs::read(&path).await {
                Ok(body) => {
                    debug!(url, "serving from cache");
                    return Ok(Document {
                        body,
                        origin: Origin::Cache,
                    });
                },
                Err(why) => {
                    warn!(path = %path.display(), "cache read failed: {why}");
                },
            }
        }

        match self.transport.get(url).await {
            Ok(body) => {
                if let Err(why) = self.store(&path, &body).await {
                    warn!(path = %path.display(), "could not persist cache entry: {why}");
                } else {
                    info!(url, bytes = body.len(), "updated cache entry");
                }
                Ok(Document {
                    body,
                    origin: Origin::Network,
                })
            },
            Err(why) => match fs::read(&path).await {
                Ok(body) => {
                    warn!(url, "fetch failed, serving cached copy: {why}");
                    Ok(Document {
                        body,
                        origin: Origin::Cache,
                    })
                },
                Err(_) => Err(why),
            },
        }
    }

    async fn store(&self, path: &Path, body: &[u8]) -> Result {
        fs::create_dir_all(&self.dir).await?;
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{n}.tmp"));
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, Ordering},
        },
        time::{Duration, SystemTime},
    };

    use serenity::async_trait;

    use super::{CACHE_TTL, Origin, ResourceCache, cache_key};
    use crate::{
        crawler::{Endpoints, Transport},
        error::{Error, Result},
    };

    /// Serves canned bodies and counts requests per URL.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub bodies: Mutex<HashMap<String, Vec<u8>>>,
        pub calls: Mutex<Vec<String>>,
        pub offline: AtomicBool,
    }

    impl FakeTransport {
        pub fn serve(&self, url: &str, body: &str) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_owned(), body.as_bytes().to_vec());
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_owned());
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Status {
                    url: url.to_owned(),
                    status: 503,
                });
            }
            self.bodies.lock().unwrap().get(url).cloned().ok_or_else(|| {
                Error::Status {
                    url: url.to_owned(),
                    status: 404,
                }
            })
        }
    }

    const URL: &str = "https://api.jolpi.ca/ergast/f1/current.json";

    fn setup() -> (tempfile::TempDir, Arc<FakeTransport>, ResourceCache) {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::default());
        transport.serve(URL, r#"{"v":1}"#);
        let cache = ResourceCache::new(dir.path(), transport.clone());
        (dir, transport, cache)
    }

    fn age_entry(cache: &ResourceCache, url: &str, age: Duration) {
        let file = std::fs::File::options()
            .write(true)
            .open(cache.path_for(url))
            .unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn keys_are_distinct_and_filesystem_safe() {
        let endpoints = Endpoints::new("https://api.jolpi.ca/ergast/f1");
        let keys = [
            cache_key(&endpoints.calendar),
            cache_key(&endpoints.results_page(0)),
            cache_key(&endpoints.results_page(100)),
            cache_key(&endpoints.driver_standings),
            cache_key(&endpoints.constructor_standings),
        ];
        for (i, key) in keys.iter().enumerate() {
            assert!(!key.contains('/') && !key.contains('?') && !key.contains(':'));
            for other in &keys[i + 1..] {
                assert_ne!(key, other);
            }
        }
        assert_eq!(cache_key(URL), cache_key(URL));
        assert_eq!(cache_key(URL), "api.jolpi.ca_ergast_f1_current.json");
    }

    #[tokio::test]
    async fn second_get_is_served_from_cache() {
        let (_dir, transport, cache) = setup();

        let first = cache.get(URL, false).await.unwrap();
        let second = cache.get(URL, false).await.unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(first.origin, Origin::Network);
        assert_eq!(second.origin, Origin::Cache);
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn staleness_follows_ttl() {
        let (_dir, _transport, cache) = setup();
        assert!(cache.is_stale(URL).await);

        cache.get(URL, false).await.unwrap();
        assert!(!cache.is_stale(URL).await);

        age_entry(&cache, URL, CACHE_TTL + Duration::from_secs(60));
        assert!(cache.is_stale(URL).await);
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        let (_dir, transport, cache) = setup();
        cache.get(URL, false).await.unwrap();
        age_entry(&cache, URL, CACHE_TTL + Duration::from_secs(60));

        transport.serve(URL, r#"{"v":2}"#);
        let doc = cache.get(URL, false).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(doc.body, br#"{"v":2}"#);
        assert!(!cache.is_stale(URL).await);
    }

    #[tokio::test]
    async fn force_refresh_ignores_fresh_cache() {
        let (_dir, transport, cache) = setup();
        cache.get(URL, false).await.unwrap();
        let doc = cache.get(URL, true).await.unwrap();
        assert_eq!(transport.call_count(), 2);
        assert_eq!(doc.origin, Origin::Network);
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_cache() {
        let (_dir, transport, cache) = setup();
        cache.get(URL, false).await.unwrap();

        transport.offline.store(true, Ordering::SeqCst);
        let doc = cache.get(URL, true).await.unwrap();

        assert_eq!(doc.origin, Origin::Cache);
        assert_eq!(doc.body, br#"{"v":1}"#);
    }

    #[tokio::test]
    async fn failed_fetch_without_cache_is_an_error() {
        let (_dir, transport, cache) = setup();
        transport.offline.store(true, Ordering::SeqCst);
        assert!(cache.get(URL, false).await.is_err());
        assert!(cache.is_stale(URL).await);
    }
}
