//! ImageInstance: one mounted image and its load/hydration state machine.
//!
//! Lifecycle:
//! - `new` runs the warning gate and consults the load cache,
//! - `mount` reconciles with existing markup, selects a strategy and emits setup commands,
//! - `dispatch` consumes browser events through the instance's event channel,
//! - `unmount` tears everything down; later events are dropped by the channel.
//!
//! Every call returns the commands the host must apply, in order.

use std::cell::RefCell;

use log::{debug, warn};

use crate::callbacks::{Callbacks, Dispatcher, StartLoad};
use crate::config::Config;
use crate::descriptor::ImageProps;
use crate::error::ImageError;
use crate::events::{EventChannel, ImageEvent};
use crate::gate::{self, Diagnostic, GateOutcome};
use crate::hydration::{self, HydrationContext};
use crate::ids::{IdAllocator, InstanceId};
use crate::markup::{Element, MarkupSource};
use crate::outputs::{CoreEvent, HostCommand, Outputs};
use crate::render::{render_image, VisualState};
use crate::services::Services;
use crate::state::LoadState;
use crate::strategy::{self, LoadingStrategy};
use crate::transition::TransitionController;

thread_local! {
    static IDS: RefCell<IdAllocator> = RefCell::new(IdAllocator::new());
}

#[derive(Debug)]
pub struct ImageInstance {
    id: InstanceId,
    props: ImageProps,
    config: Config,
    services: Services,
    gate: GateOutcome,
    diagnostics: Vec<Diagnostic>,
    cache_key: Option<String>,
    was_cached: bool,
    hydration: HydrationContext,
    strategy: Option<LoadingStrategy>,
    state: LoadState,
    transition: TransitionController,
    dispatcher: Dispatcher,
    channel: EventChannel,
    observing: bool,
    listening: bool,
    mounted: bool,
    torn_down: bool,
    outputs: Outputs,
}

impl ImageInstance {
    /// Create an instance. Gate warnings are logged here and reported again by `mount`.
    pub fn new(
        props: ImageProps,
        callbacks: Callbacks,
        config: Config,
        services: Services,
    ) -> Self {
        let report = gate::check(&props, &config);
        let cache_key = props.image.as_ref().map(|d| d.cache_key());
        let was_cached = cache_key
            .as_deref()
            .is_some_and(|key| services.cache.was_cached(key));
        Self {
            id: IDS.with(|ids| ids.borrow_mut().alloc_instance()),
            transition: TransitionController::new(config.fade_duration_ms),
            props,
            config,
            services,
            gate: report.outcome,
            diagnostics: report.diagnostics,
            cache_key,
            was_cached,
            hydration: HydrationContext::default(),
            strategy: None,
            state: LoadState::NotStarted,
            dispatcher: Dispatcher::new(callbacks),
            channel: EventChannel::new(),
            observing: false,
            listening: false,
            mounted: false,
            torn_down: false,
            outputs: Outputs::default(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn props(&self) -> &ImageProps {
        &self.props
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn hydration(&self) -> HydrationContext {
        self.hydration
    }

    pub fn strategy(&self) -> Option<LoadingStrategy> {
        self.strategy
    }

    pub fn was_cached(&self) -> bool {
        self.was_cached
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Outputs of the most recent `mount`/`dispatch`/`unmount`.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Whether the gate let this instance produce any markup.
    pub fn renders(&self) -> bool {
        matches!(self.gate, GateOutcome::Render { .. })
    }

    /// Current markup, or `None` if the gate failed or the instance was unmounted.
    pub fn render(&self) -> Option<Element> {
        if self.torn_down {
            return None;
        }
        let image = self.props.image.as_ref().filter(|_| self.renders())?;
        Some(render_image(
            &self.props,
            image,
            self.config.fade_duration_ms,
            self.transition.visual(),
        ))
    }

    /// Reconcile with `container`, pick a loading strategy and start it.
    pub fn mount(&mut self, container: Option<&dyn MarkupSource>) -> &Outputs {
        self.outputs.clear();
        if self.mounted || self.torn_down {
            debug!("instance {:?} already mounted; ignoring", self.id);
            return &self.outputs;
        }
        self.outputs.diagnostics = self.diagnostics.clone();
        let GateOutcome::Render { degraded } = self.gate else {
            return &self.outputs;
        };
        let Some(image) = self.props.image.as_ref() else {
            return &self.outputs;
        };
        if self.config.server_render {
            debug!("instance {:?}: server pass, no interactive setup", self.id);
            return &self.outputs;
        }

        let native_supported = self.services.capability.has_native_lazy_load_support();
        let first_paint = render_image(
            &self.props,
            image,
            self.config.fade_duration_ms,
            VisualState::first_paint(),
        );
        let reconciliation = hydration::reconcile(container, &first_paint);
        self.hydration = reconciliation.context;
        self.mounted = true;
        self.channel.open();

        if !self.hydration.has_server_markup {
            self.outputs.push_command(HostCommand::RenderMarkup {
                markup: first_paint,
            });
        }

        let strategy = strategy::select(native_supported, degraded, &reconciliation);
        self.strategy = Some(strategy);
        self.outputs.push_command(HostCommand::ListenForLoad);
        self.listening = true;

        let source_active = reconciliation
            .adopted
            .is_some_and(|adopted| adopted.source_active);
        if source_active {
            self.transition.source_activated();
        }
        match strategy {
            LoadingStrategy::Native => {
                if !source_active {
                    self.outputs.push_command(HostCommand::ActivateSource);
                    self.transition.source_activated();
                }
                self.begin_loading();
            }
            LoadingStrategy::Observed => {
                self.advance(LoadState::AwaitingVisibility);
                self.outputs.push_command(HostCommand::ObserveVisibility {
                    root_margin: self.config.root_margin.clone(),
                });
                self.observing = true;
            }
        }

        if self.hydration.already_resolved_from_server_markup {
            self.channel.push(ImageEvent::Load);
            self.pump();
        }
        &self.outputs
    }

    /// Feed one browser event through the channel and run the state machine.
    pub fn dispatch(&mut self, event: ImageEvent) -> &Outputs {
        self.outputs.clear();
        if !self.channel.push(event.clone()) {
            debug!("instance {:?}: dropped {event:?}", self.id);
            return &self.outputs;
        }
        self.pump();
        &self.outputs
    }

    /// Detach observers, listeners and markup. Safe to call more than once.
    pub fn unmount(&mut self) -> &Outputs {
        self.outputs.clear();
        if !self.mounted {
            return &self.outputs;
        }
        self.mounted = false;
        self.torn_down = true;
        self.channel.close();
        self.dispatcher.disarm();
        if self.observing {
            self.stop_observing();
        }
        if self.listening {
            self.stop_listening();
        }
        if self.transition.is_fading() {
            self.outputs.push_command(HostCommand::CancelTransition);
        }
        self.outputs.push_command(HostCommand::RemoveMarkup);
        &self.outputs
    }

    fn pump(&mut self) {
        while let Some(event) = self.channel.pop() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: ImageEvent) {
        match event {
            ImageEvent::Visible => {
                if self.state != LoadState::AwaitingVisibility {
                    debug!("instance {:?}: visible in {:?}", self.id, self.state);
                    return;
                }
                self.stop_observing();
                self.outputs.push_command(HostCommand::ActivateSource);
                self.transition.source_activated();
                self.begin_loading();
            }
            ImageEvent::Load => {
                if self.ensure_started() {
                    self.finish_loaded();
                }
            }
            ImageEvent::Error { message } => {
                if self.ensure_started() {
                    self.finish_errored(message);
                }
            }
            ImageEvent::TransitionEnd => {
                if let Some(cmd) = self.transition.on_transition_end() {
                    self.outputs.push_command(cmd);
                }
            }
        }
    }

    /// A completion signal while still awaiting visibility means the browser
    /// already owned the fetch; treat it as the start.
    fn ensure_started(&mut self) -> bool {
        match self.state {
            LoadState::Loading => true,
            LoadState::AwaitingVisibility => {
                self.stop_observing();
                self.transition.source_activated();
                self.begin_loading();
                true
            }
            other => {
                debug!("instance {:?}: completion in {other:?}", self.id);
                false
            }
        }
    }

    fn begin_loading(&mut self) {
        if !self.advance(LoadState::Loading) {
            return;
        }
        let payload = StartLoad {
            was_cached: self.was_cached,
        };
        self.outputs.push_event(CoreEvent::StartLoad {
            was_cached: payload.was_cached,
        });
        self.dispatcher.start_load(payload);
    }

    fn finish_loaded(&mut self) {
        if !self.advance(LoadState::Loaded) {
            return;
        }
        self.stop_listening();
        for cmd in self.transition.on_loaded(self.was_cached) {
            self.outputs.push_command(cmd);
        }
        if let Some(key) = self.cache_key.as_deref() {
            self.services.cache.store_image_loaded(key);
        }
        self.outputs.push_event(CoreEvent::Loaded {
            was_cached: self.was_cached,
        });
        self.dispatcher.load();
    }

    fn finish_errored(&mut self, reason: String) {
        if !self.advance(LoadState::Errored) {
            return;
        }
        self.stop_listening();
        let err = ImageError::LoadFailed {
            src: self
                .props
                .image
                .as_ref()
                .map(|d| d.images.fallback.src.clone())
                .unwrap_or_default(),
            reason,
        };
        warn!("[progressive-image] {err}");
        self.outputs.push_event(CoreEvent::Errored {
            message: err.to_string(),
        });
        self.dispatcher.error(&err);
    }

    fn stop_observing(&mut self) {
        if self.observing {
            self.observing = false;
            self.outputs.push_command(HostCommand::DisconnectObserver);
        }
    }

    fn stop_listening(&mut self) {
        if self.listening {
            self.listening = false;
            self.outputs.push_command(HostCommand::RemoveListeners);
        }
    }

    fn advance(&mut self, next: LoadState) -> bool {
        if !self.state.can_advance_to(next) {
            debug!(
                "instance {:?}: refusing {:?} -> {next:?}",
                self.id, self.state
            );
            return false;
        }
        self.outputs.push_event(CoreEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
        true
    }
}
