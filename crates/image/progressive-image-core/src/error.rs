//! Error types for progressive-image-core.

use thiserror::Error;

/// Errors surfaced by the core. None of them cross the component boundary as a
/// panic; load failures reach the host through `onError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ImageError {
    /// Descriptor JSON could not be parsed.
    #[error("image descriptor parse error: {0}")]
    DescriptorParse(String),

    /// Props JSON could not be parsed.
    #[error("image props parse error: {0}")]
    PropsParse(String),

    /// Config JSON could not be parsed.
    #[error("config parse error: {0}")]
    Config(String),

    /// The browser reported a failed image request.
    #[error("failed to load image {src}: {reason}")]
    LoadFailed { src: String, reason: String },
}
