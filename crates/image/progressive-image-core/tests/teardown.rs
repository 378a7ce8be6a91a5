mod common;

use common::{dispatch, mount, props, unmount, Recorder};
use progressive_image_core::{
    render_to_string, Config, HostCommand, ImageEvent, ImageInstance, LoadState, MemoryHost,
    Services,
};

fn instance(rec: &Recorder, native: bool) -> ImageInstance {
    ImageInstance::new(
        props("fluid-red"),
        rec.callbacks(),
        Config::default(),
        Services::with_native_support(native),
    )
}

fn assert_clean(host: &MemoryHost) {
    assert!(host.is_empty(), "markup left behind: {}", host.container().to_html());
    assert!(!host.is_observing());
    assert!(!host.is_listening());
    assert_eq!(host.pending_fade_ms(), None);
}

#[test]
fn unmount_before_mount_does_nothing() {
    let rec = Recorder::default();
    let mut inst = instance(&rec, false);
    assert!(inst.unmount().is_empty());
    assert_eq!(inst.state(), LoadState::NotStarted);
}

#[test]
fn unmount_while_awaiting_visibility() {
    let rec = Recorder::default();
    let mut inst = instance(&rec, false);
    let mut host = MemoryHost::new();
    mount(&mut inst, &mut host);
    let out = unmount(&mut inst, &mut host);
    assert_eq!(
        out.commands,
        vec![
            HostCommand::DisconnectObserver,
            HostCommand::RemoveListeners,
            HostCommand::RemoveMarkup
        ]
    );
    assert_clean(&host);

    // Signals racing the teardown are dropped.
    assert!(dispatch(&mut inst, &mut host, ImageEvent::Visible).is_empty());
    assert!(dispatch(&mut inst, &mut host, ImageEvent::Load).is_empty());
    assert!(rec.log().is_empty());
    assert!(inst.render().is_none());
}

#[test]
fn unmount_while_loading_natively() {
    let rec = Recorder::default();
    let props = props("fluid-red");
    let markup = render_to_string(&props, &Config::server()).markup.unwrap();
    let mut host = MemoryHost::with_markup(markup);
    let mut inst = ImageInstance::new(
        props,
        rec.callbacks(),
        Config::default(),
        Services::with_native_support(true),
    );
    mount(&mut inst, &mut host);
    assert_eq!(inst.state(), LoadState::Loading);
    let out = unmount(&mut inst, &mut host);
    assert_eq!(
        out.commands,
        vec![HostCommand::RemoveListeners, HostCommand::RemoveMarkup]
    );
    assert_clean(&host);
    assert!(dispatch(&mut inst, &mut host, ImageEvent::Load).is_empty());
    assert_eq!(rec.log(), vec!["start:false"]);
}

#[test]
fn unmount_mid_fade_cancels_transition() {
    let rec = Recorder::default();
    let mut inst = instance(&rec, false);
    let mut host = MemoryHost::new();
    mount(&mut inst, &mut host);
    dispatch(&mut inst, &mut host, ImageEvent::Visible);
    dispatch(&mut inst, &mut host, ImageEvent::Load);
    assert_eq!(host.pending_fade_ms(), Some(500));

    let out = unmount(&mut inst, &mut host);
    assert_eq!(
        out.commands,
        vec![HostCommand::CancelTransition, HostCommand::RemoveMarkup]
    );
    assert_clean(&host);
    assert!(dispatch(&mut inst, &mut host, ImageEvent::TransitionEnd).is_empty());
}

#[test]
fn unmount_after_completion_and_after_error() {
    let rec = Recorder::default();
    let mut done = instance(&rec, false);
    let mut host = MemoryHost::new();
    mount(&mut done, &mut host);
    dispatch(&mut done, &mut host, ImageEvent::Visible);
    dispatch(&mut done, &mut host, ImageEvent::Load);
    dispatch(&mut done, &mut host, ImageEvent::TransitionEnd);
    assert_eq!(
        unmount(&mut done, &mut host).commands,
        vec![HostCommand::RemoveMarkup]
    );
    assert_clean(&host);

    let mut failed = instance(&rec, false);
    let mut host = MemoryHost::new();
    mount(&mut failed, &mut host);
    dispatch(&mut failed, &mut host, ImageEvent::Visible);
    dispatch(
        &mut failed,
        &mut host,
        ImageEvent::Error {
            message: "network".into(),
        },
    );
    unmount(&mut failed, &mut host);
    assert_clean(&host);
}

#[test]
fn unmount_is_idempotent() {
    let rec = Recorder::default();
    let mut inst = instance(&rec, false);
    let mut host = MemoryHost::new();
    mount(&mut inst, &mut host);
    unmount(&mut inst, &mut host);
    assert!(unmount(&mut inst, &mut host).is_empty());
    assert!(inst.mount(None).is_empty(), "a torn-down instance never remounts");
    assert_clean(&host);
}
