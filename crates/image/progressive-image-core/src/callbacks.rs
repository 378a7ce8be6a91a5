//! User lifecycle hooks and the dispatcher that fires each at most once.

use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Payload of `onStartLoad`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLoad {
    pub was_cached: bool,
}

pub type StartLoadHook = Box<dyn FnMut(StartLoad)>;
pub type LoadHook = Box<dyn FnMut()>;
pub type ErrorHook = Box<dyn FnMut(&ImageError)>;

#[derive(Default)]
pub struct Callbacks {
    pub on_start_load: Option<StartLoadHook>,
    pub on_load: Option<LoadHook>,
    pub on_error: Option<ErrorHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start_load(mut self, f: impl FnMut(StartLoad) + 'static) -> Self {
        self.on_start_load = Some(Box::new(f));
        self
    }

    pub fn on_load(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&ImageError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start_load", &self.on_start_load.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    callbacks: Callbacks,
    armed: bool,
    started: bool,
    finished: bool,
}

impl Dispatcher {
    pub fn new(callbacks: Callbacks) -> Self {
        Self {
            callbacks,
            armed: true,
            started: false,
            finished: false,
        }
    }

    /// Silence every hook; used on unmount.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Returns whether the hook was due (it may still be absent).
    pub fn start_load(&mut self, payload: StartLoad) -> bool {
        if !self.armed || self.started {
            return false;
        }
        self.started = true;
        if let Some(f) = self.callbacks.on_start_load.as_mut() {
            f(payload);
        }
        true
    }

    pub fn load(&mut self) -> bool {
        if !self.armed || !self.started || self.finished {
            return false;
        }
        self.finished = true;
        if let Some(f) = self.callbacks.on_load.as_mut() {
            f();
        }
        true
    }

    pub fn error(&mut self, err: &ImageError) -> bool {
        if !self.armed || !self.started || self.finished {
            return false;
        }
        self.finished = true;
        if let Some(f) = self.callbacks.on_error.as_mut() {
            f(err);
        }
        true
    }
}
