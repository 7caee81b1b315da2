//! Singleton cache with a per-name once-cell claim.
//!
//! Each singleton name owns an `OnceCell`. The map lock is only held to look
//! up or create the cell; construction happens inside the cell's
//! initializer, outside the map lock, so slow constructors never block
//! unrelated names and two threads racing on the same cold name run the
//! constructor once.
//!
//! The cache does not know which registration a slot belongs to. Callers
//! claim a slot only while that registration is current, and replacing or
//! clearing a registration evicts its slot under the same registry lock.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::descriptors::AnyArc;

pub(crate) type Slot = Arc<OnceCell<AnyArc>>;

/// Already constructed singleton instances, keyed by service name.
#[derive(Default)]
pub(crate) struct SingletonCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl SingletonCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance, if construction already completed.
    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<AnyArc> {
        self.slots.read().get(name).and_then(|slot| slot.get().cloned())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the slot for `name`, creating an empty one if needed.
    ///
    /// Only one initializer per slot completes; concurrent callers wait for
    /// it and receive the same instance. A failed initializer leaves the
    /// slot empty.
    pub(crate) fn claim(&self, name: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(name) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Drops the cached instance for `name`, if any.
    pub(crate) fn evict(&self, name: &str) {
        self.slots.write().remove(name);
    }

    pub(crate) fn clear(&self) {
        self.slots.write().clear();
    }

    /// Number of names with a completed instance.
    pub(crate) fn len(&self) -> usize {
        self.slots.read().values().filter(|slot| slot.get().is_some()).count()
    }
}
