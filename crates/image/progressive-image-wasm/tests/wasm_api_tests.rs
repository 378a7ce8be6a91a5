#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use progressive_image_wasm::{abi_version, render_to_string, ProgressiveImage};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn props_json() -> JsValue {
    let props = json!({
        "alt": "red square",
        "image": {
            "width": 100,
            "height": 100,
            "layout": "fluid",
            "images": { "fallback": { "src": "a.jpg" } },
            "sizes": "192x192",
            "backgroundColor": "red"
        }
    });
    JsValue::from_str(&props.to_string())
}

fn container() -> web_sys::Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let el = document.create_element("div").unwrap();
    document.body().unwrap().append_child(&el).unwrap();
    el
}

fn event(kind: &str) -> JsValue {
    let obj = js_sys::Object::new();
    Reflect::set(&obj, &"type".into(), &kind.into()).unwrap();
    obj.into()
}

/// Callback object recording every hook call; keep the closures alive for the test.
struct Hooks {
    log: Rc<RefCell<Vec<String>>>,
    object: JsValue,
    _closures: Vec<Closure<dyn FnMut(JsValue)>>,
}

fn hooks() -> Hooks {
    let log = Rc::new(RefCell::new(Vec::new()));
    let object = js_sys::Object::new();
    let mut closures = Vec::new();
    for name in ["onStartLoad", "onLoad", "onError"] {
        let log = log.clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |arg: JsValue| {
            let cached = Reflect::get(&arg, &"wasCached".into())
                .ok()
                .and_then(|v| v.as_bool());
            log.borrow_mut().push(match cached {
                Some(c) => format!("{name}:{c}"),
                None => name.to_string(),
            });
        });
        Reflect::set(&object, &name.into(), closure.as_ref().unchecked_ref()).unwrap();
        closures.push(closure);
    }
    Hooks {
        log,
        object: object.into(),
        _closures: closures,
    }
}

#[wasm_bindgen_test]
fn abi_is_one() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn render_to_string_emits_markup_and_diagnostics() {
    let out = render_to_string(props_json(), JsValue::UNDEFINED).unwrap();
    let html = Reflect::get(&out, &"html".into()).unwrap().as_string().unwrap();
    assert!(html.contains("data-image-wrapper"));
    assert!(html.contains("data-src=\"a.jpg\""));

    let empty = render_to_string(JsValue::from_str("{}"), JsValue::UNDEFINED).unwrap();
    assert!(Reflect::get(&empty, &"html".into()).unwrap().is_undefined());
    let diagnostics: js_sys::Array = Reflect::get(&empty, &"diagnostics".into())
        .unwrap()
        .unchecked_into();
    assert_eq!(diagnostics.length(), 1);
}

#[wasm_bindgen_test]
fn mount_load_and_unmount_in_the_dom() {
    let hooks = hooks();
    let host = container();
    let img =
        ProgressiveImage::new(props_json(), JsValue::UNDEFINED, hooks.object.clone()).unwrap();
    img.mount(host.clone()).unwrap();
    assert_eq!(img.state().unwrap().as_string().as_deref(), Some("awaiting_visibility"));
    let main = host.query_selector("[data-main-image]").unwrap().unwrap();
    assert_eq!(main.get_attribute("src"), None);

    img.dispatch(event("visible")).unwrap();
    assert_eq!(main.get_attribute("src").as_deref(), Some("a.jpg"));
    img.dispatch(event("load")).unwrap();
    assert_eq!(*hooks.log.borrow(), vec!["onStartLoad:false", "onLoad"]);

    let placeholder: HtmlElement = host
        .query_selector("[data-placeholder-image]")
        .unwrap()
        .unwrap()
        .unchecked_into();
    assert_eq!(placeholder.style().get_property_value("opacity").unwrap(), "0");

    img.unmount().unwrap();
    assert_eq!(host.inner_html(), "");
    assert!(img.dispatch(event("transition_end")).is_ok());
}

#[wasm_bindgen_test]
fn mount_adopts_server_markup() {
    let host = container();
    let out = render_to_string(props_json(), JsValue::UNDEFINED).unwrap();
    let html = Reflect::get(&out, &"html".into()).unwrap().as_string().unwrap();
    host.set_inner_html(&html);
    let wrapper = host.first_element_child().unwrap();

    let img = ProgressiveImage::new(props_json(), JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    img.mount(host.clone()).unwrap();
    let after = host.first_element_child().unwrap();
    assert!(wrapper.is_same_node(Some(&after)), "server markup was replaced");
    img.unmount().unwrap();
}

#[wasm_bindgen_test]
fn bad_props_are_rejected() {
    assert!(ProgressiveImage::new(
        JsValue::from_str("{ not json"),
        JsValue::UNDEFINED,
        JsValue::UNDEFINED
    )
    .is_err());
}
