//! Placeholder → main image handoff.

use crate::outputs::HostCommand;
use crate::render::{PlaceholderVisual, VisualState};

#[derive(Debug)]
pub struct TransitionController {
    fade_duration_ms: u32,
    visual: VisualState,
}

impl TransitionController {
    pub fn new(fade_duration_ms: u32) -> Self {
        Self {
            fade_duration_ms,
            visual: VisualState::first_paint(),
        }
    }

    pub fn visual(&self) -> VisualState {
        self.visual
    }

    pub fn is_fading(&self) -> bool {
        self.visual.placeholder == PlaceholderVisual::Fading
    }

    pub fn source_activated(&mut self) {
        self.visual.source_active = true;
    }

    /// Commands for the `Loaded` transition. A cached image skips the fade.
    pub fn on_loaded(&mut self, was_cached: bool) -> Vec<HostCommand> {
        self.visual.main_visible = true;
        let duration_ms = if was_cached { 0 } else { self.fade_duration_ms };
        if duration_ms == 0 {
            self.visual.placeholder = PlaceholderVisual::Removed;
            return vec![HostCommand::RevealMainImage, HostCommand::RemovePlaceholder];
        }
        self.visual.placeholder = PlaceholderVisual::Fading;
        vec![
            HostCommand::RevealMainImage,
            HostCommand::FadeOutPlaceholder { duration_ms },
        ]
    }

    /// The fade finished; returns the removal command if one was pending.
    pub fn on_transition_end(&mut self) -> Option<HostCommand> {
        if !self.is_fading() {
            return None;
        }
        self.visual.placeholder = PlaceholderVisual::Removed;
        Some(HostCommand::RemovePlaceholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_then_remove() {
        let mut t = TransitionController::new(500);
        assert_eq!(
            t.on_loaded(false),
            vec![
                HostCommand::RevealMainImage,
                HostCommand::FadeOutPlaceholder { duration_ms: 500 }
            ]
        );
        assert!(t.is_fading());
        assert_eq!(t.on_transition_end(), Some(HostCommand::RemovePlaceholder));
        assert_eq!(t.on_transition_end(), None);
        assert_eq!(t.visual().placeholder, PlaceholderVisual::Removed);
    }

    #[test]
    fn cached_image_collapses_fade() {
        let mut t = TransitionController::new(500);
        assert_eq!(
            t.on_loaded(true),
            vec![HostCommand::RevealMainImage, HostCommand::RemovePlaceholder]
        );
        assert!(!t.is_fading());
    }
}
