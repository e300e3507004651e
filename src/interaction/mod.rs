/*!
 * Hover and click handling for interactive units.
 *
 * Hovering a unit pauses playback (remembering that we did), shows the
 * lookup indicator and translates the unit's canonical word. Every hover
 * bumps an epoch; a lookup only updates the indicator if its epoch is still
 * current and its unit is still the active one, so a slow response for a
 * word the pointer already left is dropped.
 *
 * Clicking a unit toggles the word in the dictionary and then synchronizes
 * every visible occurrence.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace};
use parking_lot::Mutex;

use crate::caption::{KnownState, UnitHandle, WordStateSynchronizer};
use crate::dictionary::DictionaryGateway;
use crate::surface::{NodeId, Surface};
use crate::translation::TranslationService;

/// Vertical distance between the pointer and the indicator
pub const INDICATOR_OFFSET_Y: f64 = 36.0;

/// Indicator text while a lookup is in flight
pub const LOOKUP_PLACEHOLDER: &str = "…";

/// The transient lookup tooltip
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Indicator {
    pub visible: bool,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl Indicator {
    fn show_at(&mut self, x: f64, y: f64, text: &str) {
        self.visible = true;
        self.text = text.to_string();
        self.move_to(x, y);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y - INDICATOR_OFFSET_Y;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Enter,
    Move,
    Leave,
    Click,
}

/// A pointer event targeting a surface node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Node entered, moved over, left or clicked
    pub target: NodeId,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn enter(target: NodeId, x: f64, y: f64) -> Self {
        Self { kind: PointerEventKind::Enter, target, x, y }
    }

    pub fn moved(target: NodeId, x: f64, y: f64) -> Self {
        Self { kind: PointerEventKind::Move, target, x, y }
    }

    pub fn leave(target: NodeId) -> Self {
        Self { kind: PointerEventKind::Leave, target, x: 0.0, y: 0.0 }
    }

    pub fn click(target: NodeId) -> Self {
        Self { kind: PointerEventKind::Click, target, x: 0.0, y: 0.0 }
    }
}

#[derive(Debug, Default)]
struct HoverState {
    active: Option<NodeId>,
    paused_by_us: bool,
    indicator: Indicator,
}

/// Maps pointer events on units to translate / save / remove
#[derive(Debug)]
pub struct HoverController {
    surface: Arc<dyn Surface>,
    translation: TranslationService,
    gateway: DictionaryGateway,
    sync: WordStateSynchronizer,
    state: Mutex<HoverState>,
    epoch: AtomicU64,
}

impl HoverController {
    pub fn new(
        surface: Arc<dyn Surface>,
        translation: TranslationService,
        gateway: DictionaryGateway,
        sync: WordStateSynchronizer,
    ) -> Self {
        Self {
            surface,
            translation,
            gateway,
            sync,
            state: Mutex::new(HoverState::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current indicator
    pub fn indicator(&self) -> Indicator {
        self.state.lock().indicator.clone()
    }

    /// Whether playback is paused because of a hover
    pub fn paused_by_hover(&self) -> bool {
        self.state.lock().paused_by_us
    }

    /// Route one event
    pub async fn handle(&self, event: PointerEvent) {
        match event.kind {
            PointerEventKind::Enter => self.on_enter(event.target, event.x, event.y).await,
            PointerEventKind::Move => self.on_move(event.x, event.y),
            PointerEventKind::Leave => self.on_leave(event.target),
            PointerEventKind::Click => {
                self.on_click(event.target).await;
            }
        }
    }

    /// Pointer entered `target`
    pub async fn on_enter(&self, target: NodeId, x: f64, y: f64) {
        let Some(unit) = UnitHandle::from_target(self.surface.as_ref(), target) else {
            return;
        };
        debug!("Hover on word: {}", unit.canonical_word);

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock();
            if let Some(playback) = self.surface.playback() {
                if !playback.is_paused() {
                    playback.pause();
                    state.paused_by_us = true;
                }
            }
            state.active = Some(unit.node);
            if !unit.canonical_word.is_actionable() {
                return;
            }
            state.indicator.show_at(x, y, LOOKUP_PLACEHOLDER);
        }

        let lookup = self.translation.translate(unit.canonical_word.as_str()).await;

        let mut state = self.state.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch || state.active != Some(unit.node) {
            trace!("Dropping stale lookup for '{}'", unit.canonical_word);
            return;
        }
        state.indicator.text = lookup.text().to_string();
    }

    /// Pointer moved; the indicator follows while visible
    pub fn on_move(&self, x: f64, y: f64) {
        let mut state = self.state.lock();
        if state.indicator.visible {
            state.indicator.move_to(x, y);
        }
    }

    /// Pointer left `target`
    pub fn on_leave(&self, target: NodeId) {
        let left_unit = UnitHandle::from_target(self.surface.as_ref(), target);
        self.epoch.fetch_add(1, Ordering::SeqCst);

        match left_unit {
            Some(unit) => {
                let mut state = self.state.lock();
                if state.active == Some(unit.node) {
                    state.active = None;
                }
            }
            None => self.release(),
        }
    }

    /// Pointer is outside every unit: resume playback we paused and hide
    /// the indicator
    pub fn release(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.active = None;
        if state.paused_by_us {
            if let Some(playback) = self.surface.playback() {
                playback.play();
            }
            state.paused_by_us = false;
        }
        state.indicator.hide();
    }

    /// Toggle the clicked word; returns its new state
    pub async fn on_click(&self, target: NodeId) -> Option<KnownState> {
        let unit = UnitHandle::from_target(self.surface.as_ref(), target)?;
        let word = unit.canonical_word;
        if !word.is_actionable() {
            return None;
        }

        let next = match unit.known_state {
            KnownState::Known => {
                self.gateway.remove(&word).await;
                info!("Word \"{}\" removed from dictionary", word);
                KnownState::Unknown
            }
            KnownState::Unknown => {
                let lookup = self.translation.translate(word.as_str()).await;
                self.gateway.save(&word, lookup.text()).await;
                info!("Word \"{}\" saved to dictionary", word);
                KnownState::Known
            }
        };
        self.sync.set_known(&word, next == KnownState::Known);

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.lock().indicator.hide();
        Some(next)
    }
}
