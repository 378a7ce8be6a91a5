//! Progressive Image Core (engine-agnostic)
//!
//! Placeholder-first image loading with server-render hydration. An
//! [`ImageInstance`] renders a placeholder plus a deferred main image, adopts
//! markup a server already produced, picks native lazy loading or a visibility
//! observer, and swaps the placeholder out exactly once.
//!
//! The crate never touches a DOM: it emits [`HostCommand`]s that an adapter
//! (the in-memory [`MemoryHost`], or the WASM crate) applies, and consumes
//! browser signals as [`ImageEvent`]s.

pub mod cache;
pub mod callbacks;
pub mod capability;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod gate;
pub mod host;
pub mod hydration;
pub mod ids;
pub mod instance;
pub mod markup;
pub mod outputs;
pub mod render;
pub mod services;
pub mod state;
pub mod strategy;
pub mod transition;

// Re-exports for consumers (adapters)
pub use cache::LoadCache;
pub use callbacks::{Callbacks, StartLoad};
pub use capability::{CapabilityDetector, Memoized, StaticCapability};
pub use config::Config;
pub use descriptor::{
    get_src, get_src_set, FallbackImage, ImageDescriptor, ImageProps, ImageSource, Images, Layout,
    Placeholder,
};
pub use error::ImageError;
pub use events::ImageEvent;
pub use gate::Diagnostic;
pub use host::MemoryHost;
pub use hydration::HydrationContext;
pub use ids::InstanceId;
pub use instance::ImageInstance;
pub use markup::{Element, ElementSnapshot, MarkupSource};
pub use outputs::{CoreEvent, HostCommand, Outputs};
pub use render::{render_to_string, ServerRender};
pub use services::Services;
pub use state::LoadState;
pub use strategy::LoadingStrategy;
