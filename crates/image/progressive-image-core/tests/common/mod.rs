#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use progressive_image_core::{
    Callbacks, ImageDescriptor, ImageEvent, ImageInstance, ImageProps, MarkupSource, MemoryHost,
    Outputs,
};

/// Records hook invocations in call order.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    pub fn callbacks(&self) -> Callbacks {
        let (a, b, c) = (self.0.clone(), self.0.clone(), self.0.clone());
        Callbacks::new()
            .on_start_load(move |s| a.borrow_mut().push(format!("start:{}", s.was_cached)))
            .on_load(move || b.borrow_mut().push("load".to_string()))
            .on_error(move |e| c.borrow_mut().push(format!("error:{e}")))
    }

    pub fn log(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

pub fn descriptor(name: &str) -> ImageDescriptor {
    progressive_image_test_fixtures::descriptors::load(name).expect("descriptor fixture")
}

pub fn props(name: &str) -> ImageProps {
    ImageProps::new(descriptor(name), "alt")
}

pub fn mount(inst: &mut ImageInstance, host: &mut MemoryHost) -> Outputs {
    let out = inst.mount(Some(&*host as &dyn MarkupSource)).clone();
    host.apply(&out);
    out
}

pub fn dispatch(inst: &mut ImageInstance, host: &mut MemoryHost, event: ImageEvent) -> Outputs {
    let out = inst.dispatch(event).clone();
    host.apply(&out);
    out
}

pub fn unmount(inst: &mut ImageInstance, host: &mut MemoryHost) -> Outputs {
    let out = inst.unmount().clone();
    host.apply(&out);
    out
}
