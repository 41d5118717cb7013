use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

use crate::{error::Result, model::Subscriber};

/// Channels that receive the pre-race announcement, persisted as one JSON
/// array that is rewritten on every change.
pub struct SubscriberStore {
    path: PathBuf,
    entries: Mutex<Vec<Subscriber>>,
    revision: AtomicU64,
}

impl SubscriberStore {
    /// Loads the store, starting empty when the file does not exist yet.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(content) => serde_json::from_slice(&content)?,
            Err(why) if why.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                info!(path = %path.display(), "no subscriber file, starting empty");
                Vec::new()
            },
            Err(why) => return Err(why.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            revision: AtomicU64::new(0),
        })
    }

    /// Adds the subscriber if absent, removes it otherwise, and persists the
    /// result. Returns whether it is subscribed afterwards.
    pub async fn toggle(&self, subscriber: Subscriber) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        let subscribed = match next.iter().position(|s| *s == subscriber) {
            Some(index) => {
                next.remove(index);
                false
            },
            None => {
                next.push(subscriber);
                true
            },
        };

        save(&self.path, &next).await?;
        *entries = next;
        self.revision.fetch_add(1, Ordering::SeqCst);
        info!(
            channel = %subscriber.channel,
            guild = %subscriber.guild,
            subscribed,
            "subscriber toggled"
        );
        Ok(subscribed)
    }

    pub async fn list(&self) -> Vec<Subscriber> {
        self.entries.lock().await.clone()
    }

    /// Number of successful writes since load.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

async fn save(path: &Path, entries: &[Subscriber]) -> Result {
    let content = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &content).await?;
    if let Err(why) = fs::rename(&tmp, path).await {
        warn!(path = %path.display(), "could not replace subscriber file: {why}");
        return Err(why.into());
    }
    Ok(())
}
