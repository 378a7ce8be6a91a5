//! In-memory host: applies [`HostCommand`]s to an element tree.
//!
//! Serves as the reference adapter for the command protocol and as the page
//! stand-in for hydration tests (it implements [`MarkupSource`]).

use crate::markup::{Element, ElementSnapshot, MarkupSource, Node};
use crate::outputs::{HostCommand, Outputs};
use crate::render::{
    DEFERRED_SRC, DEFERRED_SRCSET, MAIN_IMAGE_MARKER, MAIN_SOURCE_MARKER, PLACEHOLDER_MARKER,
    WRAPPER_MARKER,
};

#[derive(Clone, Debug)]
pub struct MemoryHost {
    container: Element,
    observer_margin: Option<String>,
    listening: bool,
    pending_fade_ms: Option<u32>,
    main_complete: bool,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Empty container, as on a client-only page.
    pub fn new() -> Self {
        Self {
            container: Element::new("div"),
            observer_margin: None,
            listening: false,
            pending_fade_ms: None,
            main_complete: false,
        }
    }

    /// Container already holding markup from a server render.
    pub fn with_markup(markup: Element) -> Self {
        let mut host = Self::new();
        host.container.children.push(Node::Element(markup));
        host
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Element {
        &mut self.container
    }

    pub fn is_empty(&self) -> bool {
        self.container.children.is_empty()
    }

    pub fn is_observing(&self) -> bool {
        self.observer_margin.is_some()
    }

    pub fn observer_margin(&self) -> Option<&str> {
        self.observer_margin.as_deref()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn pending_fade_ms(&self) -> Option<u32> {
        self.pending_fade_ms
    }

    pub fn placeholder(&self) -> Option<&Element> {
        self.container.find_marked(PLACEHOLDER_MARKER)
    }

    pub fn main_image(&self) -> Option<&Element> {
        self.container.find_marked(MAIN_IMAGE_MARKER)
    }

    /// Simulate the browser finishing the main image request before hydration.
    pub fn set_main_complete(&mut self, complete: bool) {
        self.main_complete = complete;
    }

    /// Simulate the page swapping deferred attributes ahead of hydration.
    pub fn activate_sources(&mut self) {
        self.container.for_each_mut(&mut |el: &mut Element| {
            if !(el.has_attr(MAIN_IMAGE_MARKER) || el.has_attr(MAIN_SOURCE_MARKER)) {
                return;
            }
            if let Some(src) = el.get_attr(DEFERRED_SRC).map(str::to_string) {
                el.set_attr("src", src);
            }
            if let Some(set) = el.get_attr(DEFERRED_SRCSET).map(str::to_string) {
                el.set_attr("srcset", set);
            }
        });
    }

    pub fn apply(&mut self, outputs: &Outputs) {
        for cmd in &outputs.commands {
            self.apply_command(cmd);
        }
    }

    pub fn apply_command(&mut self, cmd: &HostCommand) {
        match cmd {
            HostCommand::RenderMarkup { markup } => {
                self.container.children = vec![Node::Element(markup.clone())];
            }
            HostCommand::ObserveVisibility { root_margin } => {
                self.observer_margin = Some(root_margin.clone());
            }
            HostCommand::DisconnectObserver => self.observer_margin = None,
            HostCommand::ListenForLoad => self.listening = self.main_image().is_some(),
            HostCommand::RemoveListeners => self.listening = false,
            HostCommand::ActivateSource => self.activate_sources(),
            HostCommand::RevealMainImage => {
                if let Some(main) = self.container.find_marked_mut(MAIN_IMAGE_MARKER) {
                    main.set_style("opacity", "1");
                }
            }
            HostCommand::FadeOutPlaceholder { duration_ms } => {
                if let Some(ph) = self.container.find_marked_mut(PLACEHOLDER_MARKER) {
                    ph.set_style("opacity", "0");
                    self.pending_fade_ms = Some(*duration_ms);
                }
            }
            HostCommand::CancelTransition => self.pending_fade_ms = None,
            HostCommand::RemovePlaceholder => {
                self.container.remove_marked(PLACEHOLDER_MARKER);
                self.pending_fade_ms = None;
            }
            HostCommand::RemoveMarkup => {
                self.container.remove_marked(WRAPPER_MARKER);
                self.observer_margin = None;
                self.listening = false;
                self.pending_fade_ms = None;
            }
        }
    }
}

impl MarkupSource for MemoryHost {
    fn find_marked(&self, marker: &str) -> Option<ElementSnapshot> {
        let el = self.container.find_marked(marker)?;
        let mut snapshot = ElementSnapshot::from_element(el);
        snapshot.complete = marker == MAIN_IMAGE_MARKER && self.main_complete;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_copies_deferred_attributes() {
        let markup = Element::new("div").attr(WRAPPER_MARKER, "").child(
            Element::new("img")
                .attr(MAIN_IMAGE_MARKER, "")
                .attr(DEFERRED_SRC, "a.jpg")
                .attr(DEFERRED_SRCSET, "a.jpg 1x"),
        );
        let mut host = MemoryHost::with_markup(markup);
        host.apply_command(&HostCommand::ActivateSource);
        let main = host.main_image().unwrap();
        assert_eq!(main.get_attr("src"), Some("a.jpg"));
        assert_eq!(main.get_attr("srcset"), Some("a.jpg 1x"));
    }

    #[test]
    fn remove_markup_empties_container() {
        let mut host = MemoryHost::with_markup(Element::new("div").attr(WRAPPER_MARKER, ""));
        host.apply_command(&HostCommand::RemoveMarkup);
        assert!(host.is_empty());
        host.apply_command(&HostCommand::RemoveMarkup);
        assert!(host.is_empty());
    }
}
