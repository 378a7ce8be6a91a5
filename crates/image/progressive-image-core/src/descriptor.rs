//! Image descriptors produced by the external image pipeline, and the
//! presentation props that accompany them.
//!
//! The pipeline already computed every `srcset`/`sizes` string; nothing here
//! derives them.

use serde::{Deserialize, Serialize};

use crate::error::ImageError;
use crate::markup::is_container_tag;

/// How the image participates in layout. Only the class name depends on it here.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Fixed,
    #[default]
    #[serde(alias = "fullWidth", alias = "full-width")]
    Fluid,
    Constrained,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Fixed => "fixed",
            Layout::Fluid => "fluid",
            Layout::Constrained => "constrained",
        }
    }
}

/// The `<img>` fallback variant. Its serialized form is the cache identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

/// One `<source>` variant inside a `<picture>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub src_set: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Images {
    pub fallback: FallbackImage,
    #[serde(default)]
    pub sources: Vec<ImageSource>,
}

/// Low-cost stand-in: an optional tiny image plus ordered `<source>` variants.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default)]
    pub sources: Vec<ImageSource>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layout: Layout,
    pub images: Images,
    #[serde(default)]
    pub placeholder: Placeholder,
    #[serde(default)]
    pub sizes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl ImageDescriptor {
    pub fn from_json(s: &str) -> Result<Self, ImageError> {
        serde_json::from_str(s).map_err(|e| ImageError::DescriptorParse(e.to_string()))
    }

    /// Identity used by the load cache: the serialized fallback variant.
    pub fn cache_key(&self) -> String {
        // Plain strings and options always serialize.
        serde_json::to_string(&self.images.fallback).unwrap_or_default()
    }

    /// `sizes` for the main image, preferring the fallback's own value.
    pub fn effective_sizes(&self) -> Option<&str> {
        self.images
            .fallback
            .sizes
            .as_deref()
            .or(Some(self.sizes.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// Main image `src`, if a descriptor was supplied.
pub fn get_src(image: Option<&ImageDescriptor>) -> Option<&str> {
    image.map(|d| d.images.fallback.src.as_str())
}

/// Main image `srcset`, if a descriptor with one was supplied.
pub fn get_src_set(image: Option<&ImageDescriptor>) -> Option<&str> {
    image.and_then(|d| d.images.fallback.src_set.as_deref())
}

fn default_wrapper() -> String {
    "div".to_string()
}

/// Everything a caller hands to one mount, minus the callbacks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(default)]
    pub image: Option<ImageDescriptor>,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_position: Option<String>,
    /// Tag used for the outer wrapper element.
    #[serde(default = "default_wrapper", rename = "as")]
    pub wrapper: String,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            image: None,
            alt: String::new(),
            class_name: None,
            object_fit: None,
            object_position: None,
            wrapper: default_wrapper(),
        }
    }
}

impl ImageProps {
    pub fn new(image: ImageDescriptor, alt: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            alt: alt.into(),
            ..Self::default()
        }
    }

    pub fn from_json(s: &str) -> Result<Self, ImageError> {
        serde_json::from_str(s).map_err(|e| ImageError::PropsParse(e.to_string()))
    }

    /// Whether `wrapper` can be emitted as-is.
    pub fn has_valid_wrapper(&self) -> bool {
        is_container_tag(&self.wrapper)
    }

    /// Tag used for the wrapper element; anything unusable becomes `div`.
    pub fn wrapper_tag(&self) -> &str {
        if self.has_valid_wrapper() {
            &self.wrapper
        } else {
            "div"
        }
    }
}
