//! Reconciliation against markup rendered before interactive code ran.
//!
//! The decision is taken once, at mount, and stored on the instance. A mismatch
//! never fails the mount: it is logged and the instance renders fresh.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::markup::{Element, ElementSnapshot, MarkupSource};
use crate::render::{MAIN_IMAGE_MARKER, WRAPPER_MARKER};

/// Attributes the page or browser may legitimately change after the server
/// rendered them.
const MUTABLE_ATTRS: &[&str] = &["src", "srcset", "style"];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationContext {
    pub has_server_markup: bool,
    pub already_resolved_from_server_markup: bool,
}

/// What the adopted main image looked like when the instance took it over.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AdoptedMarkup {
    /// Carries `loading="lazy"`, i.e. the server committed to native loading.
    pub native_lazy: bool,
    /// The real `src` is already set, so the browser owns the fetch.
    pub source_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HydrationMismatch {
    MissingElement {
        marker: &'static str,
    },
    Tag {
        marker: &'static str,
        expected: String,
        found: String,
    },
    Attribute {
        marker: &'static str,
        name: String,
        expected: Option<String>,
        found: Option<String>,
    },
}

impl fmt::Display for HydrationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationMismatch::MissingElement { marker } => {
                write!(f, "server markup has a wrapper but no [{marker}] element")
            }
            HydrationMismatch::Tag {
                marker,
                expected,
                found,
            } => write!(f, "[{marker}] expected <{expected}>, found <{found}>"),
            HydrationMismatch::Attribute {
                marker,
                name,
                expected,
                found,
            } => write!(
                f,
                "[{marker}] attribute {name}: expected {expected:?}, found {found:?}"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub context: HydrationContext,
    pub adopted: Option<AdoptedMarkup>,
    /// Set when server markup existed but could not be adopted.
    pub mismatch: Option<HydrationMismatch>,
}

impl Reconciliation {
    pub fn fresh() -> Self {
        Self {
            context: HydrationContext::default(),
            adopted: None,
            mismatch: None,
        }
    }
}

fn compare(
    marker: &'static str,
    expected: &Element,
    found: &ElementSnapshot,
) -> Option<HydrationMismatch> {
    if !expected.tag.eq_ignore_ascii_case(&found.tag) {
        return Some(HydrationMismatch::Tag {
            marker,
            expected: expected.tag.clone(),
            found: found.tag.clone(),
        });
    }
    let significant = |name: &str| !MUTABLE_ATTRS.contains(&name);
    for (name, value) in expected.attrs.iter().filter(|(n, _)| significant(n)) {
        let other = found.get_attr(name);
        if other != Some(value.as_str()) {
            return Some(HydrationMismatch::Attribute {
                marker,
                name: name.clone(),
                expected: Some(value.clone()),
                found: other.map(str::to_string),
            });
        }
    }
    found
        .attrs
        .iter()
        .filter(|(n, _)| significant(n) && !expected.has_attr(n))
        .map(|(n, v)| HydrationMismatch::Attribute {
            marker,
            name: n.clone(),
            expected: None,
            found: Some(v.clone()),
        })
        .next()
}

/// Inspect `container` for markup belonging to this image and decide whether to adopt it.
///
/// `expected` is the first-paint tree the renderer produces for the same props.
pub fn reconcile(container: Option<&dyn MarkupSource>, expected: &Element) -> Reconciliation {
    let Some(container) = container else {
        return Reconciliation::fresh();
    };
    if container.find_marked(WRAPPER_MARKER).is_none() {
        return Reconciliation::fresh();
    }

    let mismatch = match (
        container.find_marked(MAIN_IMAGE_MARKER),
        expected.find_marked(MAIN_IMAGE_MARKER),
    ) {
        (Some(found), Some(wanted)) => match compare(MAIN_IMAGE_MARKER, wanted, &found) {
            None => {
                let source_active = found.get_attr("src").is_some_and(|s| !s.is_empty());
                return Reconciliation {
                    context: HydrationContext {
                        has_server_markup: true,
                        already_resolved_from_server_markup: source_active && found.complete,
                    },
                    adopted: Some(AdoptedMarkup {
                        native_lazy: found.get_attr("loading") == Some("lazy"),
                        source_active,
                    }),
                    mismatch: None,
                };
            }
            Some(m) => m,
        },
        _ => HydrationMismatch::MissingElement {
            marker: MAIN_IMAGE_MARKER,
        },
    };

    warn!("[progressive-image] hydration mismatch, rendering fresh: {mismatch}");
    Reconciliation {
        mismatch: Some(mismatch),
        ..Reconciliation::fresh()
    }
}
