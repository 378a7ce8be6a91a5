mod common;

use common::{descriptor, dispatch, mount, props, Recorder};
use progressive_image_core::{
    render_to_string, Config, HostCommand, ImageEvent, ImageInstance, ImageProps, LoadState,
    LoadingStrategy, MemoryHost, Services,
};

fn server_host(props: &ImageProps) -> MemoryHost {
    let markup = render_to_string(props, &Config::server())
        .markup
        .expect("server markup");
    MemoryHost::with_markup(markup)
}

#[test]
fn server_and_client_first_paint_are_byte_identical() {
    for name in progressive_image_test_fixtures::descriptors::keys() {
        let props = props(&name);
        let server = render_to_string(&props, &Config::server()).html().unwrap();

        let mut inst = ImageInstance::new(
            props,
            Default::default(),
            Config::default(),
            Services::with_native_support(false),
        );
        let out = inst.mount(None).clone();
        let Some(HostCommand::RenderMarkup { markup }) = out.commands.first() else {
            panic!("{name}: client mount did not render");
        };
        assert_eq!(markup.to_html(), server, "{name}");
    }
}

#[test]
fn native_support_with_server_markup_loads_without_observer() {
    let rec = Recorder::default();
    let props = props("fluid-red");
    let mut host = server_host(&props);
    let before = host.container().to_html();

    let mut inst = ImageInstance::new(
        props,
        rec.callbacks(),
        Config::default(),
        Services::with_native_support(true),
    );
    let out = mount(&mut inst, &mut host);
    assert!(inst.hydration().has_server_markup);
    assert!(!inst.hydration().already_resolved_from_server_markup);
    assert_eq!(inst.strategy(), Some(LoadingStrategy::Native));
    assert_eq!(
        out.commands,
        vec![HostCommand::ListenForLoad, HostCommand::ActivateSource]
    );
    assert!(!host.is_observing());
    assert_ne!(host.container().to_html(), before, "source swap should change the page");
    assert_eq!(inst.state(), LoadState::Loading);
    assert_eq!(rec.log(), vec!["start:false"]);
    assert!(host.placeholder().is_some());

    assert_eq!(
        host.main_image().unwrap().get_attr("data-src"),
        Some("a.jpg")
    );
    assert_eq!(
        host.placeholder()
            .unwrap()
            .style_value("background-color")
            .as_deref(),
        Some("red")
    );

    dispatch(&mut inst, &mut host, ImageEvent::Load);
    assert_eq!(rec.log(), vec!["start:false", "load"]);
    dispatch(&mut inst, &mut host, ImageEvent::TransitionEnd);
    assert!(host.placeholder().is_none());
}

#[test]
fn native_support_without_server_markup_observes() {
    let mut inst = ImageInstance::new(
        props("fluid-red"),
        Default::default(),
        Config::default(),
        Services::with_native_support(true),
    );
    let mut host = MemoryHost::new();
    mount(&mut inst, &mut host);
    assert!(!inst.hydration().has_server_markup);
    assert_eq!(inst.strategy(), Some(LoadingStrategy::Observed));
    assert!(host.is_observing());
}

#[test]
fn no_native_support_with_server_markup_observes_adopted_markup() {
    let props = props("constrained-webp");
    let mut host = server_host(&props);
    let mut inst = ImageInstance::new(
        props,
        Default::default(),
        Config::default(),
        Services::with_native_support(false),
    );
    let out = mount(&mut inst, &mut host);
    assert!(inst.hydration().has_server_markup);
    assert_eq!(inst.strategy(), Some(LoadingStrategy::Observed));
    assert!(!out
        .commands
        .iter()
        .any(|c| matches!(c, HostCommand::RenderMarkup { .. })));

    dispatch(&mut inst, &mut host, ImageEvent::Visible);
    let source = host.container().find_marked("data-main-source").unwrap();
    assert_eq!(
        source.get_attr("srcset"),
        Some("/static/photo-400.webp 400w, /static/photo-800.webp 800w")
    );
}

#[test]
fn image_resolved_before_hydration_completes_during_mount() {
    let rec = Recorder::default();
    let props = props("fluid-red");
    let mut host = server_host(&props);
    host.activate_sources();
    host.set_main_complete(true);

    let mut inst = ImageInstance::new(
        props,
        rec.callbacks(),
        Config::default(),
        Services::with_native_support(true),
    );
    let out = mount(&mut inst, &mut host);
    assert!(inst.hydration().already_resolved_from_server_markup);
    assert!(!out.has_command(&HostCommand::ActivateSource));
    assert!(out.has_command(&HostCommand::RevealMainImage));
    assert_eq!(inst.state(), LoadState::Loaded);
    assert_eq!(rec.log(), vec!["start:false", "load"]);

    // The browser's own load event arrives afterwards and is absorbed.
    assert!(dispatch(&mut inst, &mut host, ImageEvent::Load).is_empty());
    assert_eq!(rec.log().len(), 2);
}

#[test]
fn active_but_incomplete_source_is_not_resolved() {
    let props = props("fluid-red");
    let mut host = server_host(&props);
    host.activate_sources();

    let mut inst = ImageInstance::new(
        props,
        Default::default(),
        Config::default(),
        Services::with_native_support(true),
    );
    let out = mount(&mut inst, &mut host);
    assert!(inst.hydration().has_server_markup);
    assert!(!inst.hydration().already_resolved_from_server_markup);
    assert!(!out.has_command(&HostCommand::ActivateSource));
    assert_eq!(inst.state(), LoadState::Loading);
}

#[test]
fn mismatched_server_markup_is_replaced() {
    let stale = ImageProps::new(descriptor("fixed-blurred"), "alt");
    let mut host = server_host(&stale);

    let mut inst = ImageInstance::new(
        props("fluid-red"),
        Default::default(),
        Config::default(),
        Services::with_native_support(true),
    );
    let out = mount(&mut inst, &mut host);
    assert!(!inst.hydration().has_server_markup);
    assert!(matches!(out.commands[0], HostCommand::RenderMarkup { .. }));
    assert_eq!(inst.strategy(), Some(LoadingStrategy::Observed));
    assert_eq!(host.container().child_elements().count(), 1);
    assert_eq!(
        host.main_image().unwrap().get_attr("data-src"),
        Some("a.jpg")
    );
}

#[test]
fn server_pass_instance_stays_inert() {
    let mut inst = ImageInstance::new(
        props("fluid-red"),
        Default::default(),
        Config::server(),
        Services::with_native_support(true),
    );
    let mut host = MemoryHost::new();
    let out = mount(&mut inst, &mut host);
    assert!(out.commands.is_empty());
    assert!(host.is_empty());
    assert_eq!(inst.state(), LoadState::NotStarted);
    assert!(dispatch(&mut inst, &mut host, ImageEvent::Visible).is_empty());
}

#[test]
fn props_fixture_renders_wrapper_and_object_fit() {
    let props: ImageProps = progressive_image_test_fixtures::props::load("hero").unwrap();
    let html = render_to_string(&props, &Config::server()).html().unwrap();
    assert!(html.starts_with("<section data-image-wrapper"));
    assert!(html.contains("progressive-image-wrapper-fluid hero"));
    assert!(html.contains("object-fit:cover"));
    assert!(html.contains("<noscript><img src=\"/static/hero-1200.jpg\""));
}
