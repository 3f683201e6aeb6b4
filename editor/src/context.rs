//! Editor wiring.
//!
//! [`EditorContext`] owns every editor subsystem plus the host collaborator
//! handles, replacing process-global singletons with one explicitly
//! constructed object: tests build isolated contexts, and there is exactly
//! one per game session in production.
//!
//! Hosts construct it with their [`HostInterfaces`], call
//! [`initialize`](EditorContext::initialize) once the VR layer is up, then
//! feed controller events and per-frame ticks in.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use vredit_core::config::ConfigStore;
use vredit_core::input::{AxisEvent, Button, ButtonEvent, Hand};
use vredit_core::interfaces::{
    ChangeTracker, HandInteraction, Highlighter, HotkeyControl, MenuGuard, Notifier,
    PlacementDriver, TutorialFlow,
};
use vredit_core::selection::Selection;
use vredit_core::world::{RayCaster, VrPoses, WorldObjects};

use crate::filter::EditModeInput;
use crate::frame::{FrameDispatcher, SharedListener};
use crate::history::ActionHistory;
use crate::hover::{HoverTracker, SphereHoverTracker};
use crate::router::ButtonRouter;
use crate::scan::{RaySelectionScanner, SphereSelectionScanner};
use crate::selection::SelectionState;
use crate::session::EditSession;
use crate::state::{EditStateController, StateCollaborators};
use crate::transition::EditModeTransitioner;

/// Collaborator implementations supplied by the host engine.
pub struct HostInterfaces {
    pub world: Rc<RefCell<dyn WorldObjects>>,
    pub raycaster: Rc<dyn RayCaster>,
    pub poses: Rc<dyn VrPoses>,
    pub menus: Rc<dyn MenuGuard>,
    pub highlighter: Rc<RefCell<dyn Highlighter>>,
    pub config: Rc<RefCell<dyn ConfigStore>>,
    pub changes: Rc<RefCell<dyn ChangeTracker>>,
    pub tutorial: Rc<RefCell<dyn TutorialFlow>>,
    pub notifier: Rc<RefCell<dyn Notifier>>,
    pub placement_driver: Rc<RefCell<dyn PlacementDriver>>,
    /// Optional grab-physics integration; absence degrades the edit
    /// session's side effects to no-ops.
    pub hand_interaction: Option<Rc<RefCell<dyn HandInteraction>>>,
    /// Optional companion-mod hotkey control.
    pub hotkeys: Option<Rc<RefCell<dyn HotkeyControl>>>,
}

/// Owns and wires the whole edit-mode core.
pub struct EditorContext {
    router: Rc<ButtonRouter>,
    frame: Rc<FrameDispatcher>,
    filter: Rc<EditModeInput>,
    session: Rc<RefCell<EditSession>>,
    state: Rc<RefCell<EditStateController>>,
    transitioner: Rc<RefCell<EditModeTransitioner>>,
    ray_scanner: Rc<RefCell<RaySelectionScanner>>,
    sphere_scanner: Rc<RefCell<SphereSelectionScanner>>,
    hover: Rc<RefCell<HoverTracker>>,
    sphere_hover: Rc<RefCell<SphereHoverTracker>>,
    selection: Rc<RefCell<SelectionState>>,
    history: Rc<RefCell<ActionHistory>>,
    world: Rc<RefCell<dyn WorldObjects>>,
    initialized: Cell<bool>,
}

impl EditorContext {
    pub fn new(hosts: HostInterfaces) -> Self {
        let router = Rc::new(ButtonRouter::new());
        let frame = Rc::new(FrameDispatcher::new());

        let selection = Rc::new(RefCell::new(SelectionState::new(
            hosts.world.clone(),
            hosts.highlighter.clone(),
        )));
        let selection_dyn: Rc<RefCell<dyn Selection>> = selection.clone();

        let hover = Rc::new(RefCell::new(HoverTracker::new(
            hosts.highlighter.clone(),
            selection_dyn.clone(),
        )));
        let sphere_hover = Rc::new(RefCell::new(SphereHoverTracker::new(
            hosts.highlighter.clone(),
            selection_dyn.clone(),
        )));

        let (ray_scanner, sphere_scanner) = {
            let config = hosts.config.borrow();
            (
                Rc::new(RefCell::new(RaySelectionScanner::new(
                    hosts.poses.clone(),
                    hosts.raycaster.clone(),
                    hover.clone(),
                    &*config,
                ))),
                Rc::new(RefCell::new(SphereSelectionScanner::new(
                    hosts.poses.clone(),
                    hosts.world.clone(),
                    sphere_hover.clone(),
                    &*config,
                ))),
            )
        };

        let history = Rc::new(RefCell::new(ActionHistory::default()));

        let session = Rc::new(RefCell::new(EditSession::new(
            hosts.config.clone(),
            hosts.hand_interaction.clone(),
            hosts.hotkeys.clone(),
        )));
        let filter = Rc::new(EditModeInput::new(session.clone(), hosts.menus.clone()));

        let state = Rc::new(RefCell::new(EditStateController::new(StateCollaborators {
            world: hosts.world.clone(),
            selection: selection_dyn,
            hover: hover.clone(),
            sphere_hover: sphere_hover.clone(),
            ray_scanner: ray_scanner.clone(),
            sphere_scanner: sphere_scanner.clone(),
            driver: hosts.placement_driver.clone(),
            changes: hosts.changes.clone(),
            history: history.clone(),
            highlighter: hosts.highlighter.clone(),
        })));
        session.borrow_mut().set_state_controller(Rc::downgrade(&state));

        let transitioner = Rc::new(RefCell::new(EditModeTransitioner::new(
            session.clone(),
            hosts.menus.clone(),
            hosts.raycaster.clone(),
            hosts.poses.clone(),
            hosts.config.clone(),
            hosts.tutorial.clone(),
            hosts.notifier.clone(),
            hosts.highlighter.clone(),
        )));

        Self {
            router,
            frame,
            filter,
            session,
            state,
            transitioner,
            ray_scanner,
            sphere_scanner,
            hover,
            sphere_hover,
            selection,
            history,
            world: hosts.world,
            initialized: Cell::new(false),
        }
    }

    /// Wire every subsystem. Idempotent.
    ///
    /// A failed integration probe is logged and left for the host to retry
    /// through [`session`](Self::session); the rest of the editor works
    /// regardless.
    pub fn initialize(&self) {
        if self.initialized.get() {
            log::warn!("EditorContext already initialized");
            return;
        }

        // The filter's catch-all must be registered before the
        // transitioner: the press that enters edit mode has to hit the
        // filter while the gate is still closed, or it would leak into the
        // selection machinery.
        EditModeInput::initialize(&self.filter, &self.router);
        EditStateController::initialize(&self.state, &self.filter, &self.frame);
        let ray_listener: SharedListener = self.ray_scanner.clone();
        self.frame.register(&ray_listener, true);
        let sphere_listener: SharedListener = self.sphere_scanner.clone();
        self.frame.register(&sphere_listener, true);
        EditModeTransitioner::initialize(&self.transitioner, &self.router, &self.frame);

        if let Err(err) = self.session.borrow_mut().initialize() {
            log::warn!("EditorContext: integration probe failed ({err}), continuing degraded");
        }

        self.initialized.set(true);
        log::info!("EditorContext initialized");
    }

    /// Tear everything down, exiting edit mode first if needed.
    pub fn shutdown(&self) {
        if !self.initialized.get() {
            return;
        }
        if self.session.borrow().is_active() {
            self.session.borrow_mut().exit();
        }
        EditModeTransitioner::shutdown(&self.transitioner, &self.router, &self.frame);
        let sphere_listener: SharedListener = self.sphere_scanner.clone();
        self.frame.unregister(&sphere_listener);
        let ray_listener: SharedListener = self.ray_scanner.clone();
        self.frame.unregister(&ray_listener);
        EditStateController::shutdown(&self.state, &self.filter, &self.frame);
        self.filter.shutdown(&self.router);
        self.initialized.set(false);
        log::info!("EditorContext shutdown");
    }

    /// Host per-frame hook.
    pub fn on_frame(&self, now: Instant) {
        let in_edit_mode = self.session.borrow().is_active();
        self.frame.tick(now, in_edit_mode);
    }

    /// Deliver a de-duplicated button edge from the VR layer. Returns
    /// whether the editor consumed it.
    pub fn submit_button(&self, hand: Hand, button: Button, released: bool) -> bool {
        self.router.dispatch_button(ButtonEvent {
            hand,
            button,
            released,
        })
    }

    /// Deliver a controller axis sample.
    pub fn submit_axis(&self, hand: Hand, axis: u32, x: f32, y: f32) -> bool {
        self.router.dispatch_axis(AxisEvent { hand, axis, x, y })
    }

    /// Undo the most recent recorded edit.
    pub fn undo(&self) -> bool {
        let mut world = self.world.borrow_mut();
        self.history.borrow_mut().undo(&mut *world)
    }

    /// Redo the most recently undone edit.
    pub fn redo(&self) -> bool {
        let mut world = self.world.borrow_mut();
        self.history.borrow_mut().redo(&mut *world)
    }

    pub fn router(&self) -> &Rc<ButtonRouter> {
        &self.router
    }

    pub fn frame(&self) -> &Rc<FrameDispatcher> {
        &self.frame
    }

    pub fn filter(&self) -> &Rc<EditModeInput> {
        &self.filter
    }

    pub fn session(&self) -> &Rc<RefCell<EditSession>> {
        &self.session
    }

    pub fn state(&self) -> &Rc<RefCell<EditStateController>> {
        &self.state
    }

    pub fn selection(&self) -> &Rc<RefCell<SelectionState>> {
        &self.selection
    }

    pub fn history(&self) -> &Rc<RefCell<ActionHistory>> {
        &self.history
    }

    pub fn hover(&self) -> &Rc<RefCell<HoverTracker>> {
        &self.hover
    }

    pub fn sphere_hover(&self) -> &Rc<RefCell<SphereHoverTracker>> {
        &self.sphere_hover
    }
}
