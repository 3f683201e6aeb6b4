//! Ambient enter/exit gesture detection.
//!
//! The player shoves a hand inside solid geometry and double-taps the
//! trigger to toggle edit mode, no menu required. "Inside" is decided by a
//! raycast from the head toward the hand: a hit closer than the hand
//! itself means the hand is occluded by geometry and therefore buried in
//! an object.
//!
//! The double-tap memory is deliberately fragile: any disqualifying event
//! (blocking menu, hand not inside geometry) resets it, so a chain can
//! never span a menu interaction or a wandering hand. Elapsed time is
//! measured on the frame-accumulated clock, like every other editor
//! timeout.

use std::cell::RefCell;
use std::rc::Rc;

use vredit_core::config::{keys, ConfigStore};
use vredit_core::input::{Button, ButtonEvent, Hand};
use vredit_core::interfaces::{Highlighter, MenuGuard, Notifier, TutorialFlow};
use vredit_core::world::{RayCaster, VrPoses};

use crate::frame::{FrameDispatcher, FrameUpdateListener, SharedListener};
use crate::router::{ButtonRouter, CallbackId, INVALID_CALLBACK_ID};
use crate::session::EditSession;

/// Two qualifying taps within this window toggle edit mode.
pub const DOUBLE_TAP_THRESHOLD: f32 = 0.4;

/// Double-tap-inside-an-object edit mode toggle.
pub struct EditModeTransitioner {
    initialized: bool,
    trigger_callback: CallbackId,

    // Frame-accumulated clock, in seconds.
    clock: f32,

    // Double-tap memory.
    has_last_tap: bool,
    last_tap_time: f32,
    last_tap_hand: Hand,
    last_tap_inside: bool,

    session: Rc<RefCell<EditSession>>,
    menus: Rc<dyn MenuGuard>,
    raycaster: Rc<dyn RayCaster>,
    poses: Rc<dyn VrPoses>,
    config: Rc<RefCell<dyn ConfigStore>>,
    tutorial: Rc<RefCell<dyn TutorialFlow>>,
    notifier: Rc<RefCell<dyn Notifier>>,
    highlighter: Rc<RefCell<dyn Highlighter>>,
}

impl EditModeTransitioner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Rc<RefCell<EditSession>>,
        menus: Rc<dyn MenuGuard>,
        raycaster: Rc<dyn RayCaster>,
        poses: Rc<dyn VrPoses>,
        config: Rc<RefCell<dyn ConfigStore>>,
        tutorial: Rc<RefCell<dyn TutorialFlow>>,
        notifier: Rc<RefCell<dyn Notifier>>,
        highlighter: Rc<RefCell<dyn Highlighter>>,
    ) -> Self {
        Self {
            initialized: false,
            trigger_callback: INVALID_CALLBACK_ID,
            clock: 0.0,
            has_last_tap: false,
            last_tap_time: 0.0,
            last_tap_hand: Hand::Right,
            last_tap_inside: false,
            session,
            menus,
            raycaster,
            poses,
            config,
            tutorial,
            notifier,
            highlighter,
        }
    }

    /// Register on the raw router (the gesture must work outside edit
    /// mode) and on the frame dispatcher for the clock. Idempotent.
    pub fn initialize(
        this: &Rc<RefCell<Self>>,
        router: &ButtonRouter,
        frame: &FrameDispatcher,
    ) {
        if this.borrow().initialized {
            log::warn!("EditModeTransitioner already initialized");
            return;
        }

        let listener: SharedListener = this.clone();
        frame.register(&listener, false);

        let weak = Rc::downgrade(this);
        let trigger_callback =
            router.add_button_callback(Button::Trigger.mask(), 0, move |event| {
                match weak.upgrade() {
                    Some(transitioner) => transitioner.borrow_mut().on_trigger(event),
                    None => false,
                }
            });

        let mut transitioner = this.borrow_mut();
        transitioner.trigger_callback = trigger_callback;
        transitioner.initialized = true;
        log::info!("EditModeTransitioner initialized");
    }

    pub fn shutdown(this: &Rc<RefCell<Self>>, router: &ButtonRouter, frame: &FrameDispatcher) {
        {
            let mut transitioner = this.borrow_mut();
            if !transitioner.initialized {
                return;
            }
            router.remove_button_callback(transitioner.trigger_callback);
            transitioner.trigger_callback = INVALID_CALLBACK_ID;
            transitioner.initialized = false;
        }
        let listener: SharedListener = this.clone();
        frame.unregister(&listener);
        log::info!("EditModeTransitioner shutdown");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn on_trigger(&mut self, event: ButtonEvent) -> bool {
        // Presses only; releases never participate in the gesture.
        if event.released {
            return false;
        }

        if self.menus.is_blocking_menu_open() {
            log::trace!("EditModeTransitioner: ignoring trigger press, blocking menu open");
            self.has_last_tap = false;
            return false;
        }

        let inside = self.is_hand_inside_object(event.hand);
        if !inside {
            self.has_last_tap = false;
            return false;
        }

        if self.has_last_tap && self.last_tap_hand == event.hand && self.last_tap_inside {
            let elapsed = self.clock - self.last_tap_time;
            if elapsed < DOUBLE_TAP_THRESHOLD {
                log::info!(
                    "EditModeTransitioner: double-tap on {:?} hand inside object",
                    event.hand
                );
                let consumed = self.toggle_edit_mode();
                self.has_last_tap = false;
                return consumed;
            }
        }

        self.last_tap_time = self.clock;
        self.last_tap_hand = event.hand;
        self.last_tap_inside = inside;
        self.has_last_tap = true;

        // First tap passes through.
        false
    }

    fn toggle_edit_mode(&mut self) -> bool {
        let active = self.session.borrow().is_active();
        if active {
            log::info!("EditModeTransitioner: exiting edit mode");
            self.highlighter.borrow_mut().unhighlight_all();
            self.session.borrow_mut().exit();
        } else {
            let quick_edit = self
                .config
                .borrow()
                .get_bool(keys::QUICK_EDIT_ENABLED, true);
            if !quick_edit {
                log::info!("EditModeTransitioner: quick edit disabled, ignoring");
                return true;
            }

            log::info!("EditModeTransitioner: entering edit mode via double-tap");
            self.session.borrow_mut().enter();

            // The first-run flow owns messaging when it runs.
            if !self.tutorial.borrow_mut().on_quick_edit_enter() {
                self.notifier.borrow_mut().notify("Entered edit mode");
            }
        }
        true
    }

    /// Bidirectional occlusion heuristic: a geometry hit between the head
    /// and the hand, closer than the hand itself, means the hand is
    /// inside an object.
    fn is_hand_inside_object(&self, hand: Hand) -> bool {
        let (head, hand_pos) = match (self.poses.head_position(), self.poses.hand_position(hand)) {
            (Some(head), Some(hand_pos)) => (head, hand_pos),
            _ => return false,
        };

        let to_hand = hand_pos - head;
        let distance = to_hand.norm();
        if distance <= 0.0 {
            return false;
        }
        let direction = to_hand / distance;

        match self.raycaster.cast_ray(head, direction, distance) {
            Some(hit) => {
                log::trace!(
                    "EditModeTransitioner: occluder at {} (hand at {})",
                    hit.distance,
                    distance
                );
                true
            }
            None => false,
        }
    }
}

impl FrameUpdateListener for EditModeTransitioner {
    fn on_frame_update(&mut self, delta_time: f32) {
        self.clock += delta_time;
    }
}
