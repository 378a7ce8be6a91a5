//! Markup for one image: wrapper, placeholder overlay, main image and the
//! `<noscript>` fallback.
//!
//! The same function produces server output and the client's first paint, so
//! both serialize to identical bytes for the same props and config.

use crate::config::Config;
use crate::descriptor::{ImageDescriptor, ImageProps, ImageSource};
use crate::gate::{self, Diagnostic, GateOutcome};
use crate::markup::Element;

pub const WRAPPER_MARKER: &str = "data-image-wrapper";
pub const PLACEHOLDER_MARKER: &str = "data-placeholder-image";
pub const MAIN_IMAGE_MARKER: &str = "data-main-image";
pub const MAIN_SOURCE_MARKER: &str = "data-main-source";
pub const DEFERRED_SRC: &str = "data-src";
pub const DEFERRED_SRCSET: &str = "data-srcset";

const WRAPPER_CLASS: &str = "progressive-image-wrapper";
const OVERLAY_STYLE: &str = "position:absolute;top:0;left:0;width:100%;height:100%";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceholderVisual {
    Visible,
    Fading,
    Removed,
}

/// What the transition controller wants on screen right now.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VisualState {
    pub placeholder: PlaceholderVisual,
    pub main_visible: bool,
    /// `src`/`srcset` have been copied from their deferred attributes.
    pub source_active: bool,
}

impl VisualState {
    pub fn first_paint() -> Self {
        Self {
            placeholder: PlaceholderVisual::Visible,
            main_visible: false,
            source_active: false,
        }
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::first_paint()
    }
}

fn media_styles(props: &ImageProps) -> String {
    let mut style = String::new();
    if let Some(fit) = &props.object_fit {
        style.push_str(";object-fit:");
        style.push_str(fit);
    }
    if let Some(pos) = &props.object_position {
        style.push_str(";object-position:");
        style.push_str(pos);
    }
    style
}

fn source_element(src: &ImageSource, srcset_attr: &str, default_sizes: Option<&str>) -> Element {
    Element::new("source")
        .attr_opt("type", src.mime_type.as_deref())
        .attr_opt("media", src.media.as_deref())
        .attr(srcset_attr, src.src_set.as_str())
        .attr_opt("sizes", src.sizes.as_deref().or(default_sizes))
}

fn placeholder_element(
    props: &ImageProps,
    image: &ImageDescriptor,
    fade_ms: u32,
    visual: PlaceholderVisual,
) -> Element {
    let opacity = match visual {
        PlaceholderVisual::Visible => "1",
        _ => "0",
    };
    let mut style = format!("opacity:{opacity};transition:opacity {fade_ms}ms linear");
    if let Some(color) = &image.background_color {
        style.push_str(";background-color:");
        style.push_str(color);
    }
    style.push(';');
    style.push_str(OVERLAY_STYLE);

    let placeholder = &image.placeholder;
    if !placeholder.sources.is_empty() {
        let img = Element::new("img")
            .attr("alt", "")
            .attr_opt("src", placeholder.fallback.as_deref())
            .attr("decoding", "async")
            .attr("style", format!("width:100%;height:100%{}", media_styles(props)));
        return Element::new("picture")
            .attr("aria-hidden", "true")
            .attr(PLACEHOLDER_MARKER, "")
            .attr("style", style)
            .children(
                placeholder
                    .sources
                    .iter()
                    .map(|s| source_element(s, "srcset", None)),
            )
            .child(img);
    }
    match &placeholder.fallback {
        Some(src) => Element::new("img")
            .attr("aria-hidden", "true")
            .attr(PLACEHOLDER_MARKER, "")
            .attr("alt", "")
            .attr("src", src.as_str())
            .attr("decoding", "async")
            .attr("style", format!("{style}{}", media_styles(props))),
        None => Element::new("div")
            .attr("aria-hidden", "true")
            .attr(PLACEHOLDER_MARKER, "")
            .attr("style", style),
    }
}

fn main_image_element(props: &ImageProps, image: &ImageDescriptor, visual: VisualState) -> Element {
    let fallback = &image.images.fallback;
    let opacity = if visual.main_visible { "1" } else { "0" };
    let mut img = Element::new("img")
        .attr(MAIN_IMAGE_MARKER, "")
        .attr(DEFERRED_SRC, fallback.src.as_str())
        .attr_opt(DEFERRED_SRCSET, fallback.src_set.as_deref())
        .attr_opt("sizes", image.effective_sizes())
        .attr("alt", props.alt.as_str())
        .attr("decoding", "async")
        .attr("loading", "lazy")
        .attr(
            "style",
            format!("opacity:{opacity};{OVERLAY_STYLE}{}", media_styles(props)),
        );
    if visual.source_active {
        img.set_attr("src", fallback.src.as_str());
        if let Some(set) = &fallback.src_set {
            img.set_attr("srcset", set.as_str());
        }
    }
    if image.images.sources.is_empty() {
        return img;
    }
    let sources = image.images.sources.iter().map(|s| {
        let mut el = source_element(s, DEFERRED_SRCSET, image.effective_sizes());
        el.set_attr(MAIN_SOURCE_MARKER, "");
        if visual.source_active {
            el.set_attr("srcset", s.src_set.as_str());
        }
        el
    });
    Element::new("picture").children(sources).child(img)
}

fn noscript_element(props: &ImageProps, image: &ImageDescriptor) -> Element {
    let fallback = &image.images.fallback;
    let img = Element::new("img")
        .attr("src", fallback.src.as_str())
        .attr_opt("srcset", fallback.src_set.as_deref())
        .attr_opt("sizes", image.effective_sizes())
        .attr("alt", props.alt.as_str())
        .attr("decoding", "async")
        .attr("loading", "lazy")
        .attr(
            "style",
            format!("opacity:1;{OVERLAY_STYLE}{}", media_styles(props)),
        );
    let inner = if image.images.sources.is_empty() {
        img
    } else {
        Element::new("picture")
            .children(
                image
                    .images
                    .sources
                    .iter()
                    .map(|s| source_element(s, "srcset", image.effective_sizes())),
            )
            .child(img)
    };
    Element::new("noscript").child(inner)
}

/// Build the element tree for `image` in the given visual state.
pub fn render_image(
    props: &ImageProps,
    image: &ImageDescriptor,
    fade_ms: u32,
    visual: VisualState,
) -> Element {
    let mut class = format!("{WRAPPER_CLASS} {WRAPPER_CLASS}-{}", image.layout.as_str());
    if let Some(extra) = props.class_name.as_deref().filter(|c| !c.is_empty()) {
        class.push(' ');
        class.push_str(extra);
    }
    let mut wrapper = Element::new(props.wrapper_tag())
        .attr(WRAPPER_MARKER, "")
        .attr("class", class)
        .attr("style", "position:relative;overflow:hidden");
    if visual.placeholder != PlaceholderVisual::Removed {
        wrapper = wrapper.child(placeholder_element(props, image, fade_ms, visual.placeholder));
    }
    wrapper
        .child(main_image_element(props, image, visual))
        .child(noscript_element(props, image))
}

/// Result of a non-interactive render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerRender {
    /// `None` when the gate decided to render nothing.
    pub markup: Option<Element>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ServerRender {
    pub fn html(&self) -> Option<String> {
        self.markup.as_ref().map(Element::to_html)
    }
}

/// Render first-paint markup, running the same gate as a mount.
pub fn render_to_string(props: &ImageProps, config: &Config) -> ServerRender {
    let report = gate::check(props, config);
    let markup = match (report.outcome, props.image.as_ref()) {
        (GateOutcome::Render { .. }, Some(image)) => Some(render_image(
            props,
            image,
            config.fade_duration_ms,
            VisualState::first_paint(),
        )),
        _ => None,
    };
    ServerRender {
        markup,
        diagnostics: report.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FallbackImage, Images, Layout, Placeholder};

    fn descriptor() -> ImageDescriptor {
        ImageDescriptor {
            width: 100.0,
            height: 100.0,
            layout: Layout::Fluid,
            images: Images {
                fallback: FallbackImage {
                    src: "a.jpg".into(),
                    ..FallbackImage::default()
                },
                sources: Vec::new(),
            },
            placeholder: Placeholder::default(),
            sizes: "192x192".into(),
            background_color: Some("red".into()),
        }
    }

    #[test]
    fn first_paint_hides_main_and_shows_placeholder() {
        let props = ImageProps::new(descriptor(), "alt text");
        let image = props.image.as_ref().unwrap();
        let tree = render_image(&props, image, 500, VisualState::first_paint());
        let main = tree.find_marked(MAIN_IMAGE_MARKER).unwrap();
        assert_eq!(main.get_attr(DEFERRED_SRC), Some("a.jpg"));
        assert_eq!(main.get_attr("src"), None);
        assert_eq!(main.style_value("opacity").as_deref(), Some("0"));
        let ph = tree.find_marked(PLACEHOLDER_MARKER).unwrap();
        assert_eq!(ph.tag, "div");
        assert_eq!(ph.style_value("background-color").as_deref(), Some("red"));
        assert_eq!(ph.style_value("opacity").as_deref(), Some("1"));
    }

    #[test]
    fn removed_placeholder_is_absent() {
        let props = ImageProps::new(descriptor(), "");
        let visual = VisualState {
            placeholder: PlaceholderVisual::Removed,
            main_visible: true,
            source_active: true,
        };
        let tree = render_image(&props, props.image.as_ref().unwrap(), 500, visual);
        assert!(tree.find_marked(PLACEHOLDER_MARKER).is_none());
        let main = tree.find_marked(MAIN_IMAGE_MARKER).unwrap();
        assert_eq!(main.get_attr("src"), Some("a.jpg"));
    }

    #[test]
    fn main_sources_are_deferred() {
        let mut d = descriptor();
        d.images.sources.push(ImageSource {
            src_set: "a.webp 100w".into(),
            mime_type: Some("image/webp".into()),
            ..ImageSource::default()
        });
        let props = ImageProps::new(d, "");
        let image = props.image.as_ref().unwrap();
        let tree = render_image(&props, image, 500, VisualState::first_paint());
        let source = tree.find_marked(MAIN_SOURCE_MARKER).unwrap();
        assert_eq!(source.get_attr(DEFERRED_SRCSET), Some("a.webp 100w"));
        assert_eq!(source.get_attr("srcset"), None);
        assert_eq!(source.get_attr("sizes"), Some("192x192"));
    }

    #[test]
    fn render_to_string_without_image_renders_nothing() {
        let out = render_to_string(&ImageProps::default(), &Config::server());
        assert!(out.html().is_none());
        assert_eq!(out.diagnostics.len(), 1);
    }
}
