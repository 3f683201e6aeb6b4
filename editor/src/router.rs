//! Raw controller event router.
//!
//! The platform layer feeds button edges and axis samples into
//! [`ButtonRouter`]; subsystems subscribe with a button mask and a
//! priority. Higher priority callbacks run first; equal priorities keep
//! registration order. Dispatch walks a snapshot of the registry so
//! callbacks can subscribe or unsubscribe reentrantly, and every matching
//! callback runs even after one claims consumption.
//!
//! Held-state tracking drops repeated edges (a press for a button already
//! held, a release for one that is not), so subscribers only ever see
//! clean transitions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vredit_core::input::{AxisEvent, ButtonEvent, Hand};

/// Handle for removing a registered callback.
pub type CallbackId = u32;

/// Sentinel id never returned by a registration.
pub const INVALID_CALLBACK_ID: CallbackId = 0;

/// Button callback; return `true` to consume/block the input.
pub type ButtonCallback = Rc<dyn Fn(ButtonEvent) -> bool>;

/// Axis callback; return `true` to consume/block the axis.
pub type AxisCallback = Rc<dyn Fn(AxisEvent) -> bool>;

struct ButtonEntry {
    id: CallbackId,
    mask: u64,
    priority: i32,
    callback: ButtonCallback,
}

struct AxisEntry {
    id: CallbackId,
    axis: u32,
    priority: i32,
    callback: AxisCallback,
}

/// Priority-ordered registry of raw button and axis callbacks.
pub struct ButtonRouter {
    buttons: RefCell<Vec<ButtonEntry>>,
    axes: RefCell<Vec<AxisEntry>>,
    next_id: Cell<CallbackId>,
    held: [Cell<u64>; 2],
}

fn hand_index(hand: Hand) -> usize {
    if hand.is_left() {
        0
    } else {
        1
    }
}

impl ButtonRouter {
    pub fn new() -> Self {
        Self {
            buttons: RefCell::new(Vec::new()),
            axes: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            held: [Cell::new(0), Cell::new(0)],
        }
    }

    fn take_id(&self) -> CallbackId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Register a callback for the buttons in `mask`. Higher `priority`
    /// callbacks are invoked first (use 100+ for UI that should consume
    /// before gameplay handlers).
    pub fn add_button_callback(
        &self,
        mask: u64,
        priority: i32,
        callback: impl Fn(ButtonEvent) -> bool + 'static,
    ) -> CallbackId {
        let id = self.take_id();
        let mut buttons = self.buttons.borrow_mut();
        let pos = buttons
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(buttons.len());
        buttons.insert(
            pos,
            ButtonEntry {
                id,
                mask,
                priority,
                callback: Rc::new(callback),
            },
        );
        log::info!("ButtonRouter: added button callback {id} for mask {mask:#X} with priority {priority}");
        id
    }

    /// Remove a button callback. No-op for unknown ids.
    pub fn remove_button_callback(&self, id: CallbackId) {
        if id == INVALID_CALLBACK_ID {
            return;
        }
        let mut buttons = self.buttons.borrow_mut();
        if let Some(pos) = buttons.iter().position(|e| e.id == id) {
            let entry = buttons.remove(pos);
            log::info!(
                "ButtonRouter: removed button callback {id} for mask {:#X}",
                entry.mask
            );
        }
    }

    /// Register a callback for one axis index.
    pub fn add_axis_callback(
        &self,
        axis: u32,
        priority: i32,
        callback: impl Fn(AxisEvent) -> bool + 'static,
    ) -> CallbackId {
        let id = self.take_id();
        let mut axes = self.axes.borrow_mut();
        let pos = axes
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(axes.len());
        axes.insert(
            pos,
            AxisEntry {
                id,
                axis,
                priority,
                callback: Rc::new(callback),
            },
        );
        log::info!("ButtonRouter: added axis callback {id} for axis {axis} with priority {priority}");
        id
    }

    /// Remove an axis callback. No-op for unknown ids.
    pub fn remove_axis_callback(&self, id: CallbackId) {
        if id == INVALID_CALLBACK_ID {
            return;
        }
        let mut axes = self.axes.borrow_mut();
        if let Some(pos) = axes.iter().position(|e| e.id == id) {
            let entry = axes.remove(pos);
            log::info!("ButtonRouter: removed axis callback {id} for axis {}", entry.axis);
        }
    }

    /// Deliver a button edge. Returns `true` if any callback consumed it.
    ///
    /// Repeated edges for the same hand/button are dropped before
    /// dispatch.
    pub fn dispatch_button(&self, event: ButtonEvent) -> bool {
        let held = &self.held[hand_index(event.hand)];
        let bit = event.button.mask();
        if event.released {
            if held.get() & bit == 0 {
                log::trace!("ButtonRouter: dropping release of non-held {:?}", event.button);
                return false;
            }
            held.set(held.get() & !bit);
        } else {
            if held.get() & bit != 0 {
                log::trace!("ButtonRouter: dropping repeat press of {:?}", event.button);
                return false;
            }
            held.set(held.get() | bit);
        }

        // Snapshot: callbacks may mutate the registry while we iterate.
        let snapshot: Vec<ButtonCallback> = self
            .buttons
            .borrow()
            .iter()
            .filter(|e| e.mask & bit != 0)
            .map(|e| e.callback.clone())
            .collect();

        let mut consumed = false;
        for callback in snapshot {
            if callback(event) {
                consumed = true;
            }
        }
        consumed
    }

    /// Deliver an axis sample. Returns `true` if any callback consumed it.
    pub fn dispatch_axis(&self, event: AxisEvent) -> bool {
        let snapshot: Vec<AxisCallback> = self
            .axes
            .borrow()
            .iter()
            .filter(|e| e.axis == event.axis)
            .map(|e| e.callback.clone())
            .collect();

        let mut consumed = false;
        for callback in snapshot {
            if callback(event) {
                consumed = true;
            }
        }
        consumed
    }

    pub fn button_callback_count(&self) -> usize {
        self.buttons.borrow().len()
    }

    pub fn axis_callback_count(&self) -> usize {
        self.axes.borrow().len()
    }
}

impl Default for ButtonRouter {
    fn default() -> Self {
        Self::new()
    }
}
