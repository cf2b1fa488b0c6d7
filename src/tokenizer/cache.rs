use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::source::DictionarySource;
use super::user_dic::UserDictionary;

/// Process-wide copy of the supplemental dictionary.
///
/// The first `get` loads it; later calls share the same `Arc` until
/// `invalidate`. A failed load caches an empty dictionary so that a broken
/// source is not hit on every message.
pub struct DictionaryCache {
    source: Arc<dyn DictionarySource>,
    current: RwLock<Option<Arc<UserDictionary>>>,
    load_lock: AsyncMutex<()>,
}

impl DictionaryCache {
    pub fn new(source: Arc<dyn DictionarySource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            load_lock: AsyncMutex::new(()),
        }
    }

    pub async fn get(&self) -> Arc<UserDictionary> {
        let cached = self.current.read().clone();
        if let Some(dictionary) = cached {
            return dictionary;
        }

        let _guard = self.load_lock.lock().await;
        let cached = self.current.read().clone();
        if let Some(dictionary) = cached {
            return dictionary;
        }

        let loaded = Arc::new(self.load().await);
        *self.current.write() = Some(loaded.clone());
        loaded
    }

    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    /// Drops the cached copy and loads a fresh one; returns its term count.
    pub async fn reload(&self) -> usize {
        self.invalidate();
        self.get().await.len()
    }

    pub fn loaded_terms(&self) -> Option<usize> {
        self.current.read().as_ref().map(|d| d.len())
    }

    async fn load(&self) -> UserDictionary {
        match self.source.fetch().await {
            Ok(Some(bytes)) => {
                let dictionary = UserDictionary::parse(&bytes);
                info!(
                    "loaded supplemental dictionary source={} terms={}",
                    self.source.describe(),
                    dictionary.len()
                );
                dictionary
            }
            Ok(None) => {
                debug!(
                    "no supplemental dictionary available source={}",
                    self.source.describe()
                );
                UserDictionary::empty()
            }
            Err(e) => {
                warn!(
                    "failed to load supplemental dictionary source={}, continuing without it: {:#}",
                    self.source.describe(),
                    e
                );
                UserDictionary::empty()
            }
        }
    }
}
