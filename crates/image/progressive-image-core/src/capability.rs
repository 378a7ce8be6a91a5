//! Native lazy-loading capability detection.

use once_cell::unsync::OnceCell;

/// Answers whether the running browser honours `loading="lazy"` on images.
pub trait CapabilityDetector {
    fn has_native_lazy_load_support(&self) -> bool;
}

/// Fixed answer; used outside a browser and by tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticCapability(pub bool);

impl CapabilityDetector for StaticCapability {
    fn has_native_lazy_load_support(&self) -> bool {
        self.0
    }
}

impl<F> CapabilityDetector for F
where
    F: Fn() -> bool,
{
    fn has_native_lazy_load_support(&self) -> bool {
        self()
    }
}

/// Evaluates the wrapped detector on first use and reuses the answer afterwards.
#[derive(Debug)]
pub struct Memoized<D> {
    inner: D,
    cached: OnceCell<bool>,
}

impl<D: CapabilityDetector> Memoized<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cached: OnceCell::new(),
        }
    }

    /// Whether the wrapped detector has been consulted yet.
    pub fn is_resolved(&self) -> bool {
        self.cached.get().is_some()
    }
}

impl<D: CapabilityDetector> CapabilityDetector for Memoized<D> {
    fn has_native_lazy_load_support(&self) -> bool {
        *self
            .cached
            .get_or_init(|| self.inner.has_native_lazy_load_support())
    }
}
