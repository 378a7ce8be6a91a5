//! Per-instance event channel.
//!
//! Browser signals (observer callbacks, `load`/`error`, transition end) are
//! funnelled through one queue. The channel enforces ordering and at-most-once
//! delivery of `Visible` and of the first `Load`/`Error`, so callers may forward
//! every raw browser event without dedup logic. `TransitionEnd` is not deduplicated
//! here: only the transition controller knows whether a fade is running.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageEvent {
    /// The visibility observer reports the element within (or near) the viewport.
    Visible,
    /// The main image fired `load`.
    Load,
    /// The main image fired `error`.
    Error { message: String },
    /// The placeholder fade finished.
    TransitionEnd,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Pending,
    Open,
    Closed,
}

#[derive(Debug, Default)]
pub struct EventChannel {
    phase: Phase,
    queue: VecDeque<ImageEvent>,
    seen_visible: bool,
    seen_terminal: bool,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting events. Only the first call has an effect.
    pub fn open(&mut self) {
        if self.phase == Phase::Pending {
            self.phase = Phase::Open;
        }
    }

    /// Stop accepting events and drop anything still queued.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
        self.queue.clear();
    }

    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    /// Enqueue `event`. Returns `false` when it was rejected as closed or duplicate.
    pub fn push(&mut self, event: ImageEvent) -> bool {
        if self.phase != Phase::Open {
            return false;
        }
        let seen = match event {
            ImageEvent::Visible => &mut self.seen_visible,
            ImageEvent::Load | ImageEvent::Error { .. } => &mut self.seen_terminal,
            ImageEvent::TransitionEnd => {
                self.queue.push_back(event);
                return true;
            }
        };
        if *seen {
            return false;
        }
        *seen = true;
        self.queue.push_back(event);
        true
    }

    pub fn pop(&mut self) -> Option<ImageEvent> {
        self.queue.pop_front()
    }
}
