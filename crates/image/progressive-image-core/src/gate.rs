//! Precondition checks run before any rendering decision.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::descriptor::ImageProps;

/// Advisory, non-fatal warnings produced by the gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The runtime integration flag is absent or disabled.
    MissingIntegration,
    /// A required prop was not supplied.
    MissingImage { prop: String },
    /// The `as` prop is not a plain container tag name; `div` is used instead.
    InvalidWrapper { tag: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingIntegration => write!(
                f,
                "[progressive-image] the runtime integration is not enabled \
                 (integrationEnabled=false); install and enable it for native lazy \
                 loading and flicker-free hydration"
            ),
            Diagnostic::MissingImage { prop } => write!(
                f,
                "[progressive-image] missing \"{prop}\" prop; nothing will be rendered"
            ),
            Diagnostic::InvalidWrapper { tag } => write!(
                f,
                "[progressive-image] \"as\" must be a container tag name, \
                 got {tag:?}; using \"div\""
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// Render; `degraded` means the integration is missing and native loading is off limits.
    Render { degraded: bool },
    /// Render nothing at all.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateReport {
    pub outcome: GateOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

/// Check the integration flag, the wrapper tag, then the descriptor. Each failed
/// check logs one warning.
pub fn check(props: &ImageProps, config: &Config) -> GateReport {
    let mut diagnostics = Vec::new();
    let degraded = !config.integration_enabled;
    if degraded {
        diagnostics.push(Diagnostic::MissingIntegration);
    }
    if !props.has_valid_wrapper() {
        diagnostics.push(Diagnostic::InvalidWrapper {
            tag: props.wrapper.clone(),
        });
    }
    let outcome = if props.image.is_none() {
        diagnostics.push(Diagnostic::MissingImage {
            prop: "image".to_string(),
        });
        GateOutcome::Skip
    } else {
        GateOutcome::Render { degraded }
    };
    for d in &diagnostics {
        warn!("{d}");
    }
    GateReport {
        outcome,
        diagnostics,
    }
}
