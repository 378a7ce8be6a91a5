//! Browser host: applies core commands to a live container element and turns
//! DOM signals back into [`ImageEvent`]s.

use std::rc::Rc;

use progressive_image_core::render::{
    DEFERRED_SRC, DEFERRED_SRCSET, MAIN_IMAGE_MARKER, MAIN_SOURCE_MARKER, PLACEHOLDER_MARKER,
    WRAPPER_MARKER,
};
use progressive_image_core::{
    CapabilityDetector, ElementSnapshot, HostCommand, ImageEvent, MarkupSource, Outputs,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, HtmlElement, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

/// Where DOM callbacks deliver their events.
pub type EventSink = Rc<dyn Fn(ImageEvent)>;

fn selector(marker: &str) -> String {
    format!("[{marker}]")
}

/// Probes `HTMLImageElement.prototype` for the `loading` property.
#[derive(Copy, Clone, Debug, Default)]
pub struct BrowserCapability;

impl CapabilityDetector for BrowserCapability {
    fn has_native_lazy_load_support(&self) -> bool {
        let Ok(ctor) = js_sys::Reflect::get(&js_sys::global(), &"HTMLImageElement".into()) else {
            return false;
        };
        if ctor.is_undefined() {
            return false;
        }
        let Ok(proto) = js_sys::Reflect::get(&ctor, &"prototype".into()) else {
            return false;
        };
        js_sys::Reflect::has(&proto, &"loading".into()).unwrap_or(false)
    }
}

/// Read-only view of a container for hydration checks.
pub struct DomContainer<'a>(pub &'a Element);

impl MarkupSource for DomContainer<'_> {
    fn find_marked(&self, marker: &str) -> Option<ElementSnapshot> {
        let el = self.0.query_selector(&selector(marker)).ok().flatten()?;
        let attrs = el
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| el.get_attribute(&name).map(|value| (name, value)))
            .collect();
        let complete = el
            .dyn_ref::<HtmlImageElement>()
            .is_some_and(HtmlImageElement::complete);
        Some(ElementSnapshot {
            tag: el.tag_name().to_ascii_lowercase(),
            attrs,
            complete,
        })
    }
}

type EntriesCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

struct Observer {
    observer: IntersectionObserver,
    _callback: EntriesCallback,
}

struct Listeners {
    target: Element,
    on_load: Closure<dyn FnMut(Event)>,
    on_error: Closure<dyn FnMut(Event)>,
}

struct FadeTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

pub struct DomHost {
    container: Element,
    sink: EventSink,
    observer: Option<Observer>,
    listeners: Option<Listeners>,
    fade: Option<FadeTimer>,
}

impl DomHost {
    pub fn new(container: Element, sink: EventSink) -> Self {
        Self {
            container,
            sink,
            observer: None,
            listeners: None,
            fade: None,
        }
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Apply every command in order. A failing command is reported and skipped.
    pub fn apply(&mut self, outputs: &Outputs) {
        for cmd in &outputs.commands {
            if let Err(err) = self.apply_command(cmd) {
                web_sys::console::warn_2(
                    &JsValue::from_str("[progressive-image] host command failed"),
                    &err,
                );
            }
        }
    }

    fn marked(&self, marker: &str) -> Result<Option<Element>, JsValue> {
        self.container.query_selector(&selector(marker))
    }

    pub fn apply_command(&mut self, cmd: &HostCommand) -> Result<(), JsValue> {
        match cmd {
            HostCommand::RenderMarkup { markup } => {
                self.container.set_inner_html(&markup.to_html());
            }
            HostCommand::ObserveVisibility { root_margin } => self.observe(root_margin)?,
            HostCommand::DisconnectObserver => self.disconnect(),
            HostCommand::ListenForLoad => self.listen()?,
            HostCommand::RemoveListeners => self.unlisten()?,
            HostCommand::ActivateSource => self.activate()?,
            HostCommand::RevealMainImage => {
                if let Some(main) = self.marked(MAIN_IMAGE_MARKER)? {
                    main.unchecked_into::<HtmlElement>()
                        .style()
                        .set_property("opacity", "1")?;
                }
            }
            HostCommand::FadeOutPlaceholder { duration_ms } => self.fade_out(*duration_ms)?,
            HostCommand::CancelTransition => self.cancel_fade(),
            HostCommand::RemovePlaceholder => {
                self.cancel_fade();
                if let Some(ph) = self.marked(PLACEHOLDER_MARKER)? {
                    ph.remove();
                }
            }
            HostCommand::RemoveMarkup => {
                self.release()?;
                if let Some(wrapper) = self.marked(WRAPPER_MARKER)? {
                    wrapper.remove();
                }
            }
        }
        Ok(())
    }

    fn observe(&mut self, root_margin: &str) -> Result<(), JsValue> {
        let Some(wrapper) = self.marked(WRAPPER_MARKER)? else {
            return Ok(());
        };
        self.disconnect();
        let sink = self.sink.clone();
        let on_entries = move |entries: js_sys::Array, _observer: IntersectionObserver| {
            let visible = entries.iter().any(|entry| {
                entry
                    .dyn_into::<IntersectionObserverEntry>()
                    .is_ok_and(|e| e.is_intersecting())
            });
            if visible {
                sink(ImageEvent::Visible);
            }
        };
        let callback: EntriesCallback = Closure::new(on_entries);
        let init = IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        observer.observe(&wrapper);
        self.observer = Some(Observer {
            observer,
            _callback: callback,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(obs) = self.observer.take() {
            obs.observer.disconnect();
        }
    }

    fn listen(&mut self) -> Result<(), JsValue> {
        let Some(target) = self.marked(MAIN_IMAGE_MARKER)? else {
            return Ok(());
        };
        self.unlisten()?;
        let sink = self.sink.clone();
        let on_load = Closure::<dyn FnMut(Event)>::new(move |_: Event| sink(ImageEvent::Load));
        let sink = self.sink.clone();
        let on_error = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            let src = ev
                .target()
                .and_then(|t| t.dyn_into::<HtmlImageElement>().ok())
                .map(|img| img.current_src())
                .unwrap_or_default();
            sink(ImageEvent::Error {
                message: format!("browser reported an error loading {src:?}"),
            });
        });
        target.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
        target.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
        self.listeners = Some(Listeners {
            target,
            on_load,
            on_error,
        });
        Ok(())
    }

    fn unlisten(&mut self) -> Result<(), JsValue> {
        if let Some(l) = self.listeners.take() {
            l.target
                .remove_event_listener_with_callback("load", l.on_load.as_ref().unchecked_ref())?;
            l.target
                .remove_event_listener_with_callback("error", l.on_error.as_ref().unchecked_ref())?;
        }
        Ok(())
    }

    /// Swap deferred attributes in document order, so `<source>`s precede the `<img>`.
    fn activate(&self) -> Result<(), JsValue> {
        let nodes = self
            .container
            .query_selector_all(&format!("[{MAIN_SOURCE_MARKER}],[{MAIN_IMAGE_MARKER}]"))?;
        for i in 0..nodes.length() {
            let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            if let Some(set) = el.get_attribute(DEFERRED_SRCSET) {
                el.set_attribute("srcset", &set)?;
            }
            if let Some(src) = el.get_attribute(DEFERRED_SRC) {
                el.set_attribute("src", &src)?;
            }
        }
        Ok(())
    }

    fn fade_out(&mut self, duration_ms: u32) -> Result<(), JsValue> {
        let Some(ph) = self.marked(PLACEHOLDER_MARKER)? else {
            return Ok(());
        };
        ph.unchecked_into::<HtmlElement>()
            .style()
            .set_property("opacity", "0")?;
        self.cancel_fade();
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let sink = self.sink.clone();
        let callback = Closure::<dyn FnMut()>::new(move || sink(ImageEvent::TransitionEnd));
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            i32::try_from(duration_ms).unwrap_or(i32::MAX),
        )?;
        self.fade = Some(FadeTimer {
            handle,
            _callback: callback,
        });
        Ok(())
    }

    fn cancel_fade(&mut self) {
        if let Some(timer) = self.fade.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(timer.handle);
            }
        }
    }

    /// Detach every observer, listener and timer this host installed.
    pub fn release(&mut self) -> Result<(), JsValue> {
        self.disconnect();
        self.cancel_fade();
        self.unlisten()
    }
}

impl Drop for DomHost {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
