//! Output contracts from the core.
//!
//! The core never touches a DOM. Each mount/dispatch/unmount yields host
//! commands for the adapter to apply, plus semantic events and diagnostics.
//! Adapters (in-memory host, WASM) apply commands in order.

use serde::{Deserialize, Serialize};

use crate::gate::Diagnostic;
use crate::markup::Element;
use crate::state::LoadState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostCommand {
    /// Replace the container's content with first-paint markup.
    RenderMarkup { markup: Element },
    /// Watch the wrapper for viewport proximity.
    ObserveVisibility { root_margin: String },
    DisconnectObserver,
    /// Attach `load`/`error` listeners to the main image.
    ListenForLoad,
    RemoveListeners,
    /// Copy `data-src`/`data-srcset` into `src`/`srcset` on the main image and its sources.
    ActivateSource,
    /// Make the main image opaque.
    RevealMainImage,
    /// Fade the placeholder to transparent, reporting `TransitionEnd` when done.
    FadeOutPlaceholder { duration_ms: u32 },
    /// Abort a pending fade without reporting its end.
    CancelTransition,
    RemovePlaceholder,
    /// Remove every node this instance put in (or adopted from) the container.
    RemoveMarkup,
}

/// Discrete semantic signals, mirroring the hooks for adapters that forward events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum CoreEvent {
    StateChanged { from: LoadState, to: LoadState },
    StartLoad { was_cached: bool },
    Loaded { was_cached: bool },
    Errored { message: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub commands: Vec<HostCommand>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
        self.events.clear();
        self.diagnostics.clear();
    }

    #[inline]
    pub fn push_command(&mut self, command: HostCommand) {
        self.commands.push(command);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty() && self.diagnostics.is_empty()
    }

    pub fn has_command(&self, command: &HostCommand) -> bool {
        self.commands.contains(command)
    }
}
