//! Process-wide record of image identities that finished loading.
//!
//! Append-only: there is no eviction. Handles are cheap clones sharing one set;
//! all access happens on the UI thread.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashSet;

#[derive(Clone, Debug, Default)]
pub struct LoadCache {
    seen: Rc<RefCell<HashSet<String>>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as loaded. Returns `true` if it was not present before.
    pub fn store_image_loaded(&self, key: &str) -> bool {
        self.seen.borrow_mut().insert(key.to_string())
    }

    pub fn was_cached(&self, key: &str) -> bool {
        self.seen.borrow().contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }
}
