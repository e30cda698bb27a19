use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::LikeKey;

/// Outstanding like mutations, shared by every card in the process so two
/// cards showing the same post cannot race on the same (post, user) row.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    store: Arc<DashMap<LikeKey, ()>>,
}

impl InFlightRegistry {
    pub fn new() -> Self { Self::default() }

    /// Returns a guard if no mutation for `key` is outstanding, None otherwise.
    pub fn try_acquire(&self, key: LikeKey) -> Option<InFlightGuard> {
        match self.store.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => {
                v.insert(());
                Some(InFlightGuard { store: self.store.clone(), key })
            }
        }
    }

    pub fn is_pending(&self, key: &LikeKey) -> bool {
        self.store.contains_key(key)
    }
}

/// Releases the key when dropped.
pub struct InFlightGuard {
    store: Arc<DashMap<LikeKey, ()>>,
    key: LikeKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.store.remove(&self.key);
    }
}
