use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::caption::{
    AnnotationPipeline, CaptionLocator, MutationWatcher, ObservationGate, PassReport, WatcherHandle,
    WordStateSynchronizer,
};
use crate::context::ExecutionContext;
use crate::dictionary::{DictionaryGateway, DictionaryStore};
use crate::errors::AppError;
use crate::interaction::{HoverController, PointerEvent};
use crate::providers::Translator;
use crate::surface::mount::wait_for_element;
use crate::surface::{Selector, Surface};
use crate::translation::TranslationService;

// @module: Application controller owning the engine's lifecycle

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    TornDown,
}

/// Inputs of the controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    Started,
    EnabledChanged(bool),
    TornDown,
}

/// The one mutable state object of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub enabled: bool,
    pub lifecycle: Lifecycle,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            enabled: false,
            lifecycle: Lifecycle::Created,
        }
    }
}

impl ControllerState {
    /// Next state after `event`; `TornDown` absorbs everything
    pub fn transition(self, event: ControllerEvent) -> Self {
        match (self.lifecycle, event) {
            (Lifecycle::TornDown, _) => self,
            (_, ControllerEvent::TornDown) => Self {
                enabled: false,
                lifecycle: Lifecycle::TornDown,
            },
            (Lifecycle::Created, ControllerEvent::Started) => Self {
                lifecycle: Lifecycle::Running,
                ..self
            },
            (_, ControllerEvent::Started) => self,
            (_, ControllerEvent::EnabledChanged(enabled)) => Self { enabled, ..self },
        }
    }

    /// Whether captions should be observed
    pub fn is_observing(&self) -> bool {
        self.enabled && self.lifecycle == Lifecycle::Running
    }

    /// Whether pointer events are handled
    pub fn accepts_pointer(&self) -> bool {
        self.is_observing()
    }
}

/// Pieces shared with the background tasks
#[derive(Debug)]
struct Shared {
    state: Mutex<ControllerState>,
    gate: ObservationGate,
    pipeline: Arc<AnnotationPipeline>,
    hover: Arc<HoverController>,
}

impl Shared {
    /// Apply an event; returns whether observation switched on or off
    fn apply(&self, event: ControllerEvent) -> Option<bool> {
        let mut state = self.state.lock();
        let before = *state;
        *state = before.transition(event);
        debug!("Controller {:?} -> {:?}", before, *state);
        (before.is_observing() != state.is_observing()).then_some(state.is_observing())
    }

    async fn sync_observation(&self, event: ControllerEvent) {
        match self.apply(event) {
            Some(true) => {
                info!("Caption annotation enabled");
                self.gate.enable();
                self.pipeline.run().await;
            }
            Some(false) => {
                info!("Caption annotation disabled");
                self.gate.disable();
                self.hover.release();
            }
            None => {}
        }
    }
}

/// Main application controller wiring the annotation engine to a surface
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    surface: Arc<dyn Surface>,
    context: ExecutionContext,
    gateway: DictionaryGateway,
    translation: TranslationService,
    sync: WordStateSynchronizer,
    shared: Arc<Shared>,
    watcher: Mutex<Option<WatcherHandle>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    // @method: Create a controller over the given collaborators
    pub fn new(
        config: Config,
        surface: Arc<dyn Surface>,
        store: Arc<dyn DictionaryStore>,
        translator: Arc<dyn Translator>,
        context: ExecutionContext,
    ) -> Result<Self, AppError> {
        let locator = Arc::new(CaptionLocator::from_config(&config.captions)?);
        let gateway = DictionaryGateway::new(store, context.clone());
        let translation = TranslationService::new(
            translator,
            context.clone(),
            config.source_language.clone(),
            config.target_language.clone(),
            &config.translation,
        );
        let gate = ObservationGate::new();
        let pipeline = Arc::new(AnnotationPipeline::new(
            surface.clone(),
            locator.clone(),
            gateway.clone(),
            context.clone(),
            gate.clone(),
        ));
        let sync = WordStateSynchronizer::new(surface.clone(), locator);
        let hover = Arc::new(HoverController::new(
            surface.clone(),
            translation.clone(),
            gateway.clone(),
            sync.clone(),
        ));

        Ok(Self {
            config,
            surface,
            context,
            gateway,
            translation,
            sync,
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState::default()),
                gate,
                pipeline,
                hover,
            }),
            watcher: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    /// Wait for the observe root, start watching and apply the stored
    /// enabled flag
    pub async fn start(&self) -> Result<(), AppError> {
        if self.state().lifecycle != Lifecycle::Created {
            warn!("Controller already started");
            return Ok(());
        }

        let observe_root = Selector::parse(&self.config.captions.observe_root)?;
        let timeout = Duration::from_millis(self.config.captions.mount_timeout_ms);
        wait_for_element(self.surface.as_ref(), &observe_root, timeout).await?;

        let watcher = MutationWatcher::new(self.shared.pipeline.clone(), self.shared.gate.clone())
            .spawn(self.surface.subscribe());
        *self.watcher.lock() = Some(watcher);

        let mut enabled_rx = self.gateway.subscribe_enabled();
        self.shared.apply(ControllerEvent::Started);
        let enabled = self.gateway.is_enabled().await;
        self.shared.sync_observation(ControllerEvent::EnabledChanged(enabled)).await;

        let shared = self.shared.clone();
        let listener = tokio::spawn(async move {
            while enabled_rx.changed().await.is_ok() {
                let enabled = *enabled_rx.borrow_and_update();
                shared.sync_observation(ControllerEvent::EnabledChanged(enabled)).await;
            }
        });
        *self.listener.lock() = Some(listener);

        info!("Controller started (enabled: {})", enabled);
        Ok(())
    }

    /// Persist the enabled flag and apply it
    pub async fn set_enabled(&self, enabled: bool) -> bool {
        let persisted = self.gateway.set_enabled(enabled).await;
        self.shared
            .sync_observation(ControllerEvent::EnabledChanged(enabled))
            .await;
        persisted
    }

    /// Route a pointer event; ignored while disabled
    pub async fn dispatch(&self, event: PointerEvent) {
        if !self.state().accepts_pointer() {
            return;
        }
        self.shared.hover.handle(event).await;
    }

    /// Run one annotation pass now
    pub async fn annotate_now(&self) -> PassReport {
        self.shared.pipeline.run().await
    }

    /// Stop everything; the controller cannot be restarted
    pub async fn teardown(&self) {
        self.shared.apply(ControllerEvent::TornDown);
        self.shared.gate.teardown();
        self.shared.hover.release();

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.abort();
        }
        let watcher = self.watcher.lock().take();
        if let Some(watcher) = watcher {
            watcher.shutdown().await;
        }
        info!("Controller torn down");
    }

    pub fn state(&self) -> ControllerState {
        *self.shared.state.lock()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn gateway(&self) -> &DictionaryGateway {
        &self.gateway
    }

    pub fn translation(&self) -> &TranslationService {
        &self.translation
    }

    pub fn synchronizer(&self) -> &WordStateSynchronizer {
        &self.sync
    }

    pub fn gate(&self) -> &ObservationGate {
        &self.shared.gate
    }

    pub fn hover(&self) -> &HoverController {
        &self.shared.hover
    }
}
