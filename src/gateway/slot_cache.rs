//! Bounded LRU whose values are built outside the cache lock.
//!
//! Each key owns a [`OnceCell`] slot. The LRU mutex is only held to find or
//! insert the slot, so a slow build never delays lookups of other keys.
//! Concurrent callers for the same key wait on the same slot and share one
//! build. A failed build leaves nothing behind.

use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, OnceCell};

pub struct SlotCache<K, V> {
    slots: Mutex<LruCache<K, Arc<OnceCell<V>>>>,
}

/// A value from [`SlotCache::get_or_try_init`], flagged when this call built it.
pub struct Lookup<V> {
    pub value: V,
    pub built: bool,
}

impl<K, V> SlotCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the value for `key`, running `init` when no slot holds one yet.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &K, init: F) -> Result<Lookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            match slots.get(key) {
                Some(slot) => slot.clone(),
                None => {
                    let slot = Arc::new(OnceCell::new());
                    slots.put(key.clone(), slot.clone());
                    slot
                }
            }
        };

        let mut built = false;
        let result = slot
            .get_or_try_init(|| {
                built = true;
                init()
            })
            .await
            .cloned();

        match result {
            Ok(value) => Ok(Lookup { value, built }),
            Err(e) => {
                let mut slots = self.slots.lock().await;
                let stale = slots
                    .peek(key)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized());
                if stale {
                    slots.pop(key);
                }
                Err(e)
            }
        }
    }

    /// Number of keys holding a built value. Builds in flight are not counted.
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .count()
    }

    #[cfg(test)]
    pub async fn contains(&self, key: &K) -> bool {
        self.slots
            .lock()
            .await
            .peek(key)
            .is_some_and(|slot| slot.initialized())
    }
}
