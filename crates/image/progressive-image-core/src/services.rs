//! Injectable services shared across instances.

use std::rc::Rc;

use crate::cache::LoadCache;
use crate::capability::{CapabilityDetector, Memoized, StaticCapability};

#[derive(Clone)]
pub struct Services {
    pub capability: Rc<dyn CapabilityDetector>,
    pub cache: LoadCache,
}

thread_local! {
    static SHARED: Services =
        Services::new(Memoized::new(StaticCapability(false)), LoadCache::new());
}

impl Services {
    pub fn new(capability: impl CapabilityDetector + 'static, cache: LoadCache) -> Self {
        Self {
            capability: Rc::new(capability),
            cache,
        }
    }

    /// Default services for this thread. No browser is assumed, so native
    /// lazy loading reports unsupported; adapters install their own detector.
    pub fn shared() -> Self {
        SHARED.with(Services::clone)
    }

    /// Fresh services with a fixed capability answer and an empty cache.
    pub fn with_native_support(supported: bool) -> Self {
        Self::new(StaticCapability(supported), LoadCache::new())
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}
