//! wasm-bindgen interface for progressive-image-core.
//!
//! A `ProgressiveImage` owns one core instance plus the DOM host that applies
//! its commands. Browser callbacks reach the instance through a weak handle, so
//! a freed wrapper silently drops late events.

mod dom;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Function, Reflect};
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use progressive_image_core::{
    Callbacks, Config, Diagnostic, ImageDescriptor, ImageEvent, ImageInstance, ImageProps,
    LoadCache, Memoized, Outputs, Services,
};

pub use dom::{BrowserCapability, DomContainer, DomHost, EventSink};

thread_local! {
    static SERVICES: Services = Services::new(Memoized::new(BrowserCapability), LoadCache::new());
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn parse_props(props: JsValue) -> Result<ImageProps, JsError> {
    if let Some(text) = props.as_string() {
        return ImageProps::from_json(&text).map_err(|e| JsError::new(&e.to_string()));
    }
    swb::from_value(props).map_err(|e| JsError::new(&format!("props error: {e}")))
}

fn parse_config(config: JsValue) -> Result<Config, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        return Ok(Config::process());
    }
    swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    swb::to_value(value).map_err(|e| JsError::new(&format!("outputs error: {e}")))
}

fn warn_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        web_sys::console::warn_1(&JsValue::from_str(&d.to_string()));
    }
}

fn hook(callbacks: &JsValue, name: &str) -> Option<Function> {
    if jsvalue_is_undefined_or_null(callbacks) {
        return None;
    }
    Reflect::get(callbacks, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn report_hook_error(name: &str, err: JsValue) {
    web_sys::console::error_2(
        &JsValue::from_str(&format!("[progressive-image] {name} threw")),
        &err,
    );
}

/// Wrap `{ onStartLoad, onLoad, onError }`; missing or non-function entries are skipped.
fn js_callbacks(callbacks: &JsValue) -> Callbacks {
    let mut out = Callbacks::new();
    if let Some(f) = hook(callbacks, "onStartLoad") {
        out = out.on_start_load(move |payload| {
            let arg = swb::to_value(&payload).unwrap_or(JsValue::UNDEFINED);
            if let Err(e) = f.call1(&JsValue::UNDEFINED, &arg) {
                report_hook_error("onStartLoad", e);
            }
        });
    }
    if let Some(f) = hook(callbacks, "onLoad") {
        out = out.on_load(move || {
            if let Err(e) = f.call0(&JsValue::UNDEFINED) {
                report_hook_error("onLoad", e);
            }
        });
    }
    if let Some(f) = hook(callbacks, "onError") {
        out = out.on_error(move |err| {
            let arg = js_sys::Error::new(&err.to_string());
            if let Err(e) = f.call1(&JsValue::UNDEFINED, &arg) {
                report_hook_error("onError", e);
            }
        });
    }
    out
}

struct Shared {
    instance: ImageInstance,
    host: Option<DomHost>,
}

impl Shared {
    fn apply(&mut self, outputs: &Outputs) {
        if let Some(host) = self.host.as_mut() {
            host.apply(outputs);
        }
    }

    /// Honour an `unmount()` that arrived while a hook was running.
    fn settle(&mut self, unmount_requested: &Cell<bool>) {
        if unmount_requested.replace(false) {
            let out = self.instance.unmount().clone();
            self.apply(&out);
            self.host = None;
        }
    }
}

fn deliver(shared: &Weak<RefCell<Shared>>, unmount_requested: &Cell<bool>, event: ImageEvent) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let Ok(mut guard) = shared.try_borrow_mut() else {
        web_sys::console::warn_1(&JsValue::from_str(
            "[progressive-image] dropped an event raised while the instance was busy",
        ));
        return;
    };
    let out = guard.instance.dispatch(event).clone();
    guard.apply(&out);
    guard.settle(unmount_requested);
}

#[wasm_bindgen]
pub struct ProgressiveImage {
    shared: Rc<RefCell<Shared>>,
    unmount_requested: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl ProgressiveImage {
    /// Create an instance. `props` is an object (or JSON string) with `image`, `alt`,
    /// `className`, `objectFit`, `objectPosition` and `as`; `config` may be undefined.
    /// `callbacks` may carry `onStartLoad`, `onLoad` and `onError`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        props: JsValue,
        config: JsValue,
        callbacks: JsValue,
    ) -> Result<ProgressiveImage, JsError> {
        #[cfg(feature = "console_error")]
        console_error_panic_hook::set_once();

        let props = parse_props(props)?;
        let config = parse_config(config)?;
        let services = SERVICES.with(Services::clone);
        let instance = ImageInstance::new(props, js_callbacks(&callbacks), config, services);
        Ok(ProgressiveImage {
            shared: Rc::new(RefCell::new(Shared {
                instance,
                host: None,
            })),
            unmount_requested: Rc::new(Cell::new(false)),
        })
    }

    /// Adopt or render markup inside `container` and start loading. Returns Outputs JSON.
    #[wasm_bindgen]
    pub fn mount(&self, container: web_sys::Element) -> Result<JsValue, JsError> {
        let mut guard = self
            .shared
            .try_borrow_mut()
            .map_err(|_| JsError::new("mount: instance is busy"))?;
        if guard.host.is_some() {
            return Err(JsError::new("mount: already mounted"));
        }
        let weak = Rc::downgrade(&self.shared);
        let flag = self.unmount_requested.clone();
        let sink: EventSink = Rc::new(move |event: ImageEvent| deliver(&weak, &flag, event));
        let host = DomHost::new(container, sink);

        let out = guard
            .instance
            .mount(Some(&DomContainer(host.container())))
            .clone();
        guard.host = Some(host);
        warn_diagnostics(&out.diagnostics);
        guard.apply(&out);
        guard.settle(&self.unmount_requested);
        to_js(&out)
    }

    /// Inject an event (`{ type: "visible" | "load" | "error" | "transition_end" }`).
    #[wasm_bindgen]
    pub fn dispatch(&self, event: JsValue) -> Result<JsValue, JsError> {
        let event: ImageEvent =
            swb::from_value(event).map_err(|e| JsError::new(&format!("event error: {e}")))?;
        let mut guard = self
            .shared
            .try_borrow_mut()
            .map_err(|_| JsError::new("dispatch: instance is busy"))?;
        let out = guard.instance.dispatch(event).clone();
        guard.apply(&out);
        guard.settle(&self.unmount_requested);
        to_js(&out)
    }

    /// Tear down observers, listeners and markup. Called from inside a hook, the
    /// teardown runs as soon as the hook returns.
    #[wasm_bindgen]
    pub fn unmount(&self) -> Result<JsValue, JsError> {
        let Ok(mut guard) = self.shared.try_borrow_mut() else {
            self.unmount_requested.set(true);
            return Ok(JsValue::UNDEFINED);
        };
        let out = guard.instance.unmount().clone();
        guard.apply(&out);
        guard.host = None;
        to_js(&out)
    }

    /// Current load state as a snake_case string.
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsError> {
        let shared = self.borrow("state")?;
        to_js(&shared.instance.state())
    }

    #[wasm_bindgen(js_name = wasCached)]
    pub fn was_cached(&self) -> Result<bool, JsError> {
        Ok(self.borrow("wasCached")?.instance.was_cached())
    }

    /// Markup for the current visual state, or undefined when nothing renders.
    #[wasm_bindgen(js_name = renderHtml)]
    pub fn render_html(&self) -> Result<Option<String>, JsError> {
        Ok(self
            .borrow("renderHtml")?
            .instance
            .render()
            .map(|el| el.to_html()))
    }
}

impl ProgressiveImage {
    fn borrow(&self, op: &str) -> Result<std::cell::Ref<'_, Shared>, JsError> {
        self.shared
            .try_borrow()
            .map_err(|_| JsError::new(&format!("{op}: instance is busy")))
    }
}

#[derive(Serialize)]
struct RenderResult {
    html: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

/// Non-interactive render. Returns `{ html, diagnostics }`.
#[wasm_bindgen(js_name = renderToString)]
pub fn render_to_string(props: JsValue, config: JsValue) -> Result<JsValue, JsError> {
    let props = parse_props(props)?;
    let config = parse_config(config)?;
    let rendered = progressive_image_core::render_to_string(&props, &config);
    warn_diagnostics(&rendered.diagnostics);
    to_js(&RenderResult {
        html: rendered.html(),
        diagnostics: rendered.diagnostics,
    })
}

#[wasm_bindgen(js_name = hasNativeLazyLoadSupport)]
pub fn has_native_lazy_load_support() -> bool {
    SERVICES.with(|s| s.capability.has_native_lazy_load_support())
}

fn parse_image(image: JsValue) -> Result<Option<ImageDescriptor>, JsError> {
    if jsvalue_is_undefined_or_null(&image) {
        return Ok(None);
    }
    swb::from_value(image)
        .map(Some)
        .map_err(|e| JsError::new(&format!("image error: {e}")))
}

#[wasm_bindgen(js_name = getSrc)]
pub fn get_src(image: JsValue) -> Result<Option<String>, JsError> {
    let image = parse_image(image)?;
    Ok(progressive_image_core::get_src(image.as_ref()).map(str::to_string))
}

#[wasm_bindgen(js_name = getSrcSet)]
pub fn get_src_set(image: JsValue) -> Result<Option<String>, JsError> {
    let image = parse_image(image)?;
    Ok(progressive_image_core::get_src_set(image.as_ref()).map(str::to_string))
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
