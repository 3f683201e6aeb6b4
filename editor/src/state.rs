//! The selection/placement state machine.
//!
//! Central coordinator for edit-mode interactions.
//!
//! States:
//! - `Idle` — edit interactions suspended (edit mode normally starts
//!   straight in `RaySelecting`)
//! - `RaySelecting` — point at objects with the hand ray to hover them
//! - `VolumeSelecting` — hover everything inside the selection sphere
//! - `RemotePlacement` — the selection follows the placement driver at a
//!   distance
//!
//! Trigger behavior in the selection modes:
//! - quick tap (released before 250 ms): toggle selection of the hovered
//!   object — replace in single-select, add/remove with the modifier held
//! - press and hold (250 ms+): promote to `RemotePlacement`; if the
//!   hovered object is already part of a multi-selection the whole
//!   selection moves together, otherwise the selection collapses to the
//!   hovered object
//! - release in `RemotePlacement`: commit the placement and return to the
//!   selection mode it was entered from
//!
//! The thumbstick click toggles between ray and volume selection; the
//! secondary button is the multi-select modifier while held.

use std::fmt;
use std::rc::Rc;
use std::cell::RefCell;

use vredit_core::input::{Button, ButtonEvent};
use vredit_core::interfaces::{ChangeTracker, Highlighter, PlacementDriver};
use vredit_core::math::{Transform, Vec3};
use vredit_core::object::ObjectId;
use vredit_core::selection::Selection;
use vredit_core::world::WorldObjects;

use crate::filter::EditModeInput;
use crate::frame::{FrameDispatcher, FrameUpdateListener, SharedListener};
use crate::history::{ActionHistory, PlacedObject, PlacementAction};
use crate::hover::{HoverTracker, SphereHoverTracker};
use crate::router::{CallbackId, INVALID_CALLBACK_ID};
use crate::scan::{RaySelectionScanner, SphereSelectionScanner};

/// Hold the trigger this long to promote a selection into remote
/// placement.
pub const REMOTE_PLACEMENT_HOLD_TIME: f32 = 0.250;

/// The mutually-exclusive edit interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    RaySelecting,
    VolumeSelecting,
    RemotePlacement,
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditState::Idle => "Idle",
            EditState::RaySelecting => "RaySelecting",
            EditState::VolumeSelecting => "VolumeSelecting",
            EditState::RemotePlacement => "RemotePlacement",
        };
        f.write_str(name)
    }
}

/// A placement target and the transform captured when placement began,
/// kept for cancel/revert.
struct PlacementTarget {
    id: ObjectId,
    initial_transform: Transform,
}

/// Collaborator handles the state controller drives.
pub struct StateCollaborators {
    pub world: Rc<RefCell<dyn WorldObjects>>,
    pub selection: Rc<RefCell<dyn Selection>>,
    pub hover: Rc<RefCell<HoverTracker>>,
    pub sphere_hover: Rc<RefCell<SphereHoverTracker>>,
    pub ray_scanner: Rc<RefCell<RaySelectionScanner>>,
    pub sphere_scanner: Rc<RefCell<SphereSelectionScanner>>,
    pub driver: Rc<RefCell<dyn PlacementDriver>>,
    pub changes: Rc<RefCell<dyn ChangeTracker>>,
    pub history: Rc<RefCell<ActionHistory>>,
    pub highlighter: Rc<RefCell<dyn Highlighter>>,
}

/// The edit-mode state machine.
pub struct EditStateController {
    initialized: bool,
    state: EditState,

    // Non-empty iff state == RemotePlacement.
    placement: Vec<PlacementTarget>,

    // Trigger tracking.
    trigger_held: bool,
    trigger_hold_time: f32,
    entered_placement_from_hold: bool,
    press_hover_target: Option<ObjectId>,
    press_hit_point: Option<Vec3>,

    // Secondary button held: multi-select modifier.
    multi_select_held: bool,

    // Which selection mode to return to after remote placement ends.
    previous_selection_mode: EditState,

    trigger_callback: CallbackId,
    secondary_callback: CallbackId,
    thumbstick_callback: CallbackId,
    menu_callback: CallbackId,

    world: Rc<RefCell<dyn WorldObjects>>,
    selection: Rc<RefCell<dyn Selection>>,
    hover: Rc<RefCell<HoverTracker>>,
    sphere_hover: Rc<RefCell<SphereHoverTracker>>,
    ray_scanner: Rc<RefCell<RaySelectionScanner>>,
    sphere_scanner: Rc<RefCell<SphereSelectionScanner>>,
    driver: Rc<RefCell<dyn PlacementDriver>>,
    changes: Rc<RefCell<dyn ChangeTracker>>,
    history: Rc<RefCell<ActionHistory>>,
    highlighter: Rc<RefCell<dyn Highlighter>>,
}

impl EditStateController {
    pub fn new(collaborators: StateCollaborators) -> Self {
        Self {
            initialized: false,
            state: EditState::Idle,
            placement: Vec::new(),
            trigger_held: false,
            trigger_hold_time: 0.0,
            entered_placement_from_hold: false,
            press_hover_target: None,
            press_hit_point: None,
            multi_select_held: false,
            previous_selection_mode: EditState::RaySelecting,
            trigger_callback: INVALID_CALLBACK_ID,
            secondary_callback: INVALID_CALLBACK_ID,
            thumbstick_callback: INVALID_CALLBACK_ID,
            menu_callback: INVALID_CALLBACK_ID,
            world: collaborators.world,
            selection: collaborators.selection,
            hover: collaborators.hover,
            sphere_hover: collaborators.sphere_hover,
            ray_scanner: collaborators.ray_scanner,
            sphere_scanner: collaborators.sphere_scanner,
            driver: collaborators.driver,
            changes: collaborators.changes,
            history: collaborators.history,
            highlighter: collaborators.highlighter,
        }
    }

    /// Register input callbacks and the frame listener. Idempotent.
    pub fn initialize(
        this: &Rc<RefCell<Self>>,
        filter: &Rc<EditModeInput>,
        frame: &FrameDispatcher,
    ) {
        if this.borrow().initialized {
            log::warn!("EditStateController already initialized");
            return;
        }

        let listener: SharedListener = this.clone();
        frame.register(&listener, true);

        let weak = Rc::downgrade(this);
        let trigger_callback = filter.add_callback(Button::Trigger.mask(), {
            let weak = weak.clone();
            move |event| match weak.upgrade() {
                Some(controller) => controller.borrow_mut().on_trigger(event),
                None => false,
            }
        });
        let secondary_callback = filter.add_callback(Button::Secondary.mask(), {
            let weak = weak.clone();
            move |event| match weak.upgrade() {
                Some(controller) => controller.borrow_mut().on_secondary(event),
                None => false,
            }
        });
        let thumbstick_callback = filter.add_callback(Button::Thumbstick.mask(), {
            let weak = weak.clone();
            move |event| match weak.upgrade() {
                Some(controller) => controller.borrow_mut().on_thumbstick(event),
                None => false,
            }
        });
        let menu_callback = filter.add_callback(Button::Menu.mask(), {
            let weak = weak.clone();
            move |event| match weak.upgrade() {
                Some(controller) => controller.borrow_mut().on_menu(event),
                None => false,
            }
        });

        let mut controller = this.borrow_mut();
        controller.trigger_callback = trigger_callback;
        controller.secondary_callback = secondary_callback;
        controller.thumbstick_callback = thumbstick_callback;
        controller.menu_callback = menu_callback;
        controller.initialized = true;
        log::info!("EditStateController initialized");
    }

    /// Unregister everything and return to Idle.
    pub fn shutdown(
        this: &Rc<RefCell<Self>>,
        filter: &Rc<EditModeInput>,
        frame: &FrameDispatcher,
    ) {
        {
            let mut controller = this.borrow_mut();
            if !controller.initialized {
                return;
            }
            if controller.state != EditState::Idle {
                controller.enter_idle();
            }
            filter.remove_callback(controller.trigger_callback);
            filter.remove_callback(controller.secondary_callback);
            filter.remove_callback(controller.thumbstick_callback);
            filter.remove_callback(controller.menu_callback);
            controller.trigger_callback = INVALID_CALLBACK_ID;
            controller.secondary_callback = INVALID_CALLBACK_ID;
            controller.thumbstick_callback = INVALID_CALLBACK_ID;
            controller.menu_callback = INVALID_CALLBACK_ID;
            controller.initialized = false;
        }
        let listener: SharedListener = this.clone();
        frame.unregister(&listener);
        log::info!("EditStateController shutdown");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == EditState::Idle
    }

    pub fn is_placing(&self) -> bool {
        self.state == EditState::RemotePlacement
    }

    pub fn is_in_any_selection_mode(&self) -> bool {
        matches!(self.state, EditState::RaySelecting | EditState::VolumeSelecting)
    }

    /// Ids of the objects being placed. Empty outside `RemotePlacement`.
    pub fn placement_targets(&self) -> Vec<ObjectId> {
        self.placement.iter().map(|t| t.id).collect()
    }

    /// Ray hit point captured at trigger press, for grab-offset math.
    pub fn press_hit_point(&self) -> Option<Vec3> {
        self.press_hit_point
    }

    /// Called by the gate when edit mode engages.
    pub fn on_edit_mode_enter(&mut self) {
        log::info!("EditStateController: edit mode entered, starting in RaySelecting");
        self.enter_ray_selecting();
    }

    /// Called by the gate when edit mode disengages: tear down to Idle and
    /// drop every piece of interaction state.
    pub fn on_edit_mode_exit(&mut self) {
        log::info!("EditStateController: edit mode exited, resetting to Idle");
        if self.state != EditState::Idle {
            self.enter_idle();
        }
        self.selection.borrow_mut().clear();
        self.hover.borrow_mut().clear();
        self.sphere_hover.borrow_mut().clear();
        // Safety net for highlights applied outside the trackers.
        self.highlighter.borrow_mut().unhighlight_all();

        self.trigger_held = false;
        self.entered_placement_from_hold = false;
        self.multi_select_held = false;
        self.clear_press_tracking();
    }

    /// Promote the current selection into remote placement (menu entry
    /// point). No-op outside the selection modes.
    pub fn confirm_selection(&mut self) {
        if !self.is_in_any_selection_mode() {
            return;
        }
        log::info!("EditStateController: confirm selection");
        if self.selection.borrow().is_empty() {
            log::info!("EditStateController: confirm with no objects selected");
            self.enter_idle();
            return;
        }
        self.enter_remote_placement();
    }

    /// Called by the placement driver when it wants out (e.g. an external
    /// revert). The placement keeps its current transforms.
    pub fn request_exit_placement(&mut self) {
        log::info!("EditStateController: exit placement requested (from {})", self.state);
        self.enter_idle();
    }

    /// Cancel whatever is in progress and return to Idle. A placement in
    /// flight is discarded and the captured transforms restored; the
    /// selection is cleared. No-op from Idle.
    pub fn cancel(&mut self) {
        log::info!("EditStateController: cancel (from {})", self.state);
        match self.state {
            EditState::Idle => {}
            EditState::RaySelecting | EditState::VolumeSelecting => {
                self.selection.borrow_mut().clear();
                self.enter_idle();
            }
            EditState::RemotePlacement => {
                self.driver.borrow_mut().cancel();
                self.restore_placement_transforms();
                self.selection.borrow_mut().clear();
                self.entered_placement_from_hold = false;
                self.enter_idle();
            }
        }
    }

    fn on_trigger(&mut self, event: ButtonEvent) -> bool {
        if event.hand.is_left() {
            return false;
        }

        if event.released {
            self.trigger_held = false;
            match self.state {
                EditState::Idle => {
                    // Shouldn't normally be Idle inside edit mode; recover.
                    self.enter_ray_selecting();
                }
                EditState::RaySelecting => {
                    if self.trigger_hold_time < REMOTE_PLACEMENT_HOLD_TIME {
                        self.quick_tap_ray_select();
                    }
                }
                EditState::VolumeSelecting => {
                    if self.trigger_hold_time < REMOTE_PLACEMENT_HOLD_TIME {
                        self.quick_tap_sphere_select();
                    }
                }
                EditState::RemotePlacement => {
                    if self.entered_placement_from_hold {
                        self.finalize_placement();
                    }
                }
            }
            self.clear_press_tracking();
        } else {
            self.trigger_held = true;
            self.trigger_hold_time = 0.0;
            match self.state {
                EditState::Idle => self.enter_ray_selecting(),
                EditState::RaySelecting => {
                    let hover = self.hover.borrow();
                    self.press_hover_target = hover.hovered();
                    self.press_hit_point = hover.hit_point();
                }
                EditState::VolumeSelecting => {
                    // No single hover target in volume mode; the whole
                    // candidate set is read at release or hold time.
                    self.press_hover_target = None;
                    self.press_hit_point = None;
                }
                EditState::RemotePlacement => {}
            }
        }

        // The trigger always belongs to the editor while edit mode is
        // active, even with no hover target under it.
        true
    }

    fn on_secondary(&mut self, event: ButtonEvent) -> bool {
        if event.hand.is_left() {
            return false;
        }
        self.multi_select_held = !event.released;
        // Left unconsumed so other systems can watch the modifier too.
        false
    }

    fn on_thumbstick(&mut self, event: ButtonEvent) -> bool {
        if event.hand.is_left() || event.released {
            return false;
        }
        match self.state {
            EditState::RaySelecting => {
                log::info!("EditStateController: thumbstick click, switching to VolumeSelecting");
                self.enter_volume_selecting();
                true
            }
            EditState::VolumeSelecting => {
                log::info!("EditStateController: thumbstick click, switching to RaySelecting");
                self.enter_ray_selecting();
                true
            }
            // No mode switches mid-placement.
            EditState::RemotePlacement | EditState::Idle => false,
        }
    }

    fn on_menu(&mut self, event: ButtonEvent) -> bool {
        if event.hand.is_left() || event.released {
            return false;
        }
        if !self.is_in_any_selection_mode() {
            return false;
        }
        let mut world = self.world.borrow_mut();
        self.history.borrow_mut().undo(&mut *world);
        true
    }

    fn quick_tap_ray_select(&mut self) {
        let Some(target) = self.press_hover_target else {
            log::trace!("EditStateController: quick tap with no hover target");
            return;
        };
        if !self.world.borrow().is_valid(target) {
            log::trace!("EditStateController: quick tap but {target} is no longer valid");
            return;
        }
        let mut selection = self.selection.borrow_mut();
        if self.multi_select_held {
            log::info!("EditStateController: quick tap, multi-select toggle {target}");
            selection.toggle(target);
        } else {
            log::info!("EditStateController: quick tap, single-select {target}");
            selection.set_single(target);
        }
    }

    fn quick_tap_sphere_select(&mut self) {
        let hovered: Vec<ObjectId> = self.sphere_hover.borrow().hovered().to_vec();
        if hovered.is_empty() {
            log::trace!("EditStateController: sphere quick tap with no objects in sphere");
            return;
        }
        let mut selection = self.selection.borrow_mut();
        if self.multi_select_held {
            log::info!(
                "EditStateController: sphere quick tap, adding {} objects to selection",
                hovered.len()
            );
            for id in hovered {
                if !selection.is_selected(id) {
                    selection.add(id);
                }
            }
        } else {
            log::info!(
                "EditStateController: sphere quick tap, selecting {} objects",
                hovered.len()
            );
            selection.clear();
            for id in hovered {
                selection.add(id);
            }
        }
    }

    /// Hold threshold reached in ray mode. Re-validates the press-time
    /// hover target; a stale target aborts the transition and leaves the
    /// machine in `RaySelecting`.
    fn try_hold_promote_ray(&mut self) {
        let Some(target) = self.press_hover_target else {
            return;
        };
        if !self.world.borrow().is_valid(target) {
            log::warn!(
                "EditStateController: hold target {target} became invalid, staying in {}",
                self.state
            );
            self.press_hover_target = None;
            self.press_hit_point = None;
            return;
        }

        {
            let mut selection = self.selection.borrow_mut();
            if selection.is_selected(target) {
                // Part of the current selection: move everything together.
                log::info!(
                    "EditStateController: hold threshold on selected {target}, moving {} objects",
                    selection.count()
                );
            } else {
                log::info!(
                    "EditStateController: hold threshold, single-select {target} and place"
                );
                selection.set_single(target);
            }
        }

        self.entered_placement_from_hold = true;
        self.enter_remote_placement();
    }

    /// Hold threshold reached in volume mode: select the whole candidate
    /// set and place it. Keeps waiting while the sphere is empty.
    fn try_hold_promote_sphere(&mut self) {
        let hovered: Vec<ObjectId> = self.sphere_hover.borrow().hovered().to_vec();
        if hovered.is_empty() {
            return;
        }
        log::info!(
            "EditStateController: sphere hold threshold, selecting {} objects and placing",
            hovered.len()
        );
        {
            let mut selection = self.selection.borrow_mut();
            if self.multi_select_held {
                for id in hovered {
                    if !selection.is_selected(id) {
                        selection.add(id);
                    }
                }
            } else {
                selection.clear();
                for id in hovered {
                    selection.add(id);
                }
            }
        }
        self.entered_placement_from_hold = true;
        self.enter_remote_placement();
    }

    fn finalize_placement(&mut self) {
        log::info!("EditStateController: trigger released in RemotePlacement, finalizing");
        self.driver.borrow_mut().end();

        let mut placed = Vec::with_capacity(self.placement.len());
        {
            let world = self.world.borrow();
            let mut changes = self.changes.borrow_mut();
            for target in &self.placement {
                match world.transform_of(target.id) {
                    Some(final_transform) => {
                        changes.record_placement(target.id, final_transform);
                        placed.push(PlacedObject {
                            id: target.id,
                            old_transform: target.initial_transform,
                            new_transform: final_transform,
                        });
                    }
                    None => log::warn!(
                        "EditStateController: {} vanished before finalize, skipping",
                        target.id
                    ),
                }
            }
        }
        if !placed.is_empty() {
            self.history.borrow_mut().record(Box::new(PlacementAction::new(placed)));
        }

        self.entered_placement_from_hold = false;
        match self.previous_selection_mode {
            EditState::VolumeSelecting => self.enter_volume_selecting(),
            _ => self.enter_ray_selecting(),
        }
    }

    fn restore_placement_transforms(&mut self) {
        let mut world = self.world.borrow_mut();
        for target in &self.placement {
            if !world.set_transform(target.id, target.initial_transform) {
                log::warn!(
                    "EditStateController: could not restore transform of {}",
                    target.id
                );
            }
        }
    }

    fn enter_idle(&mut self) {
        let old_state = self.state;
        match old_state {
            EditState::RaySelecting => self.ray_scanner.borrow_mut().stop(),
            EditState::VolumeSelecting => self.sphere_scanner.borrow_mut().stop(),
            _ => {}
        }
        self.state = EditState::Idle;
        self.placement.clear();
        log::info!("EditStateController: {old_state} -> Idle");
    }

    fn enter_ray_selecting(&mut self) {
        let old_state = self.state;
        if old_state == EditState::VolumeSelecting {
            self.sphere_scanner.borrow_mut().stop();
        }
        self.state = EditState::RaySelecting;
        self.placement.clear();
        self.ray_scanner.borrow_mut().start();
        log::info!("EditStateController: {old_state} -> RaySelecting");
    }

    fn enter_volume_selecting(&mut self) {
        let old_state = self.state;
        if old_state == EditState::RaySelecting {
            self.ray_scanner.borrow_mut().stop();
        }
        self.state = EditState::VolumeSelecting;
        self.placement.clear();
        self.sphere_scanner.borrow_mut().start();
        log::info!("EditStateController: {old_state} -> VolumeSelecting");
    }

    fn enter_remote_placement(&mut self) {
        let old_state = self.state;

        // Capture transforms first: with nothing live to place the
        // transition is aborted without disturbing the current mode.
        let ids = self.selection.borrow().ids();
        let mut targets = Vec::with_capacity(ids.len());
        {
            let world = self.world.borrow();
            for id in &ids {
                match world.transform_of(*id) {
                    Some(transform) => targets.push(PlacementTarget {
                        id: *id,
                        initial_transform: transform,
                    }),
                    None => log::warn!(
                        "EditStateController: selected {id} is not live, skipping placement"
                    ),
                }
            }
        }
        if targets.is_empty() {
            log::warn!("EditStateController: no live objects to place, staying in {old_state}");
            self.entered_placement_from_hold = false;
            return;
        }

        if self.is_in_any_selection_mode() {
            self.previous_selection_mode = old_state;
        }
        match old_state {
            EditState::RaySelecting => self.ray_scanner.borrow_mut().stop(),
            EditState::VolumeSelecting => self.sphere_scanner.borrow_mut().stop(),
            _ => {}
        }

        let grab_point = self.press_hit_point;
        // Prevent the hold logic from retriggering on later frames.
        self.press_hover_target = None;
        self.press_hit_point = None;

        let target_ids: Vec<ObjectId> = targets.iter().map(|t| t.id).collect();
        self.placement = targets;
        self.state = EditState::RemotePlacement;
        self.driver.borrow_mut().begin(&target_ids, grab_point);
        log::info!("EditStateController: {old_state} -> RemotePlacement");
    }

    fn clear_press_tracking(&mut self) {
        self.press_hover_target = None;
        self.press_hit_point = None;
        self.trigger_hold_time = 0.0;
    }
}

impl FrameUpdateListener for EditStateController {
    fn on_frame_update(&mut self, delta_time: f32) {
        if self.trigger_held {
            self.trigger_hold_time += delta_time;
        }

        match self.state {
            EditState::Idle | EditState::RemotePlacement => {}
            EditState::RaySelecting => {
                if self.trigger_held && self.trigger_hold_time >= REMOTE_PLACEMENT_HOLD_TIME {
                    self.try_hold_promote_ray();
                }
            }
            EditState::VolumeSelecting => {
                if self.trigger_held && self.trigger_hold_time >= REMOTE_PLACEMENT_HOLD_TIME {
                    self.try_hold_promote_sphere();
                }
            }
        }
    }
}
