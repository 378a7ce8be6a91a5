//! Per-instance load state.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    NotStarted,
    AwaitingVisibility,
    Loading,
    Loaded,
    Errored,
}

impl LoadState {
    /// Forward-only transitions:
    /// `NotStarted → (AwaitingVisibility)? → Loading → Loaded|Errored`.
    pub fn can_advance_to(&self, next: LoadState) -> bool {
        use LoadState::*;
        matches!(
            (self, next),
            (NotStarted, AwaitingVisibility)
                | (NotStarted, Loading)
                | (AwaitingVisibility, Loading)
                | (Loading, Loaded)
                | (Loading, Errored)
        )
    }
}
