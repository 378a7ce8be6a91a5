//! Choice between native lazy loading and visibility observation.

use serde::{Deserialize, Serialize};

use crate::hydration::Reconciliation;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStrategy {
    /// The browser decides when to fetch; the element's own `load` event completes.
    Native,
    /// A visibility observer triggers the fetch when the element nears the viewport.
    Observed,
}

/// Native is only trusted when the adopted server markup already carried
/// `loading="lazy"` as the browser parsed it; the attribute has no effect when
/// attached after the fact. Everything else observes.
pub fn select(
    native_supported: bool,
    degraded: bool,
    reconciliation: &Reconciliation,
) -> LoadingStrategy {
    let committed = reconciliation
        .adopted
        .as_ref()
        .is_some_and(|adopted| adopted.native_lazy);
    if native_supported && !degraded && reconciliation.context.has_server_markup && committed {
        LoadingStrategy::Native
    } else {
        LoadingStrategy::Observed
    }
}
