use crate::domain::fortune::{FortuneSequence, RequestFingerprint};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    sequence: FortuneSequence,
    expires_at: Instant,
}

/// In-memory, TTL-bounded store of finished forecasts keyed by request fingerprint.
///
/// Safe to share across tasks. A `put` replaces any existing entry for the key.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<RequestFingerprint, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &RequestFingerprint) -> anyhow::Result<Option<FortuneSequence>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(poisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.sequence.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict, unless a concurrent put refreshed it in between.
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    pub fn put(&self, key: RequestFingerprint, sequence: FortuneSequence) -> anyhow::Result<()> {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            key,
            CacheEntry {
                sequence,
                expires_at,
            },
        );
        Ok(())
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> anyhow::Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        Ok(before - entries.len())
    }

    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow::anyhow!("result cache lock poisoned")
}
