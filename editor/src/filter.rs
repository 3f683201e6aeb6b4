//! Edit-mode input filter.
//!
//! [`EditModeInput`] is a second-stage router: it subscribes a catch-all
//! callback on the raw [`ButtonRouter`](crate::router::ButtonRouter) and
//! only forwards events to its own subscribers while the edit-mode gate is
//! open and no blocking menu is up. It is a pass-through filter, not a
//! queue: blocked events are dropped unconsumed.
//!
//! Unlike a first-match dispatch, every callback whose mask intersects the
//! event runs even after an earlier one claims consumption; independent
//! subscribers may all need to react to the same edge.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vredit_core::input::{ButtonEvent, ALL_BUTTONS};
use vredit_core::interfaces::MenuGuard;

use crate::router::{ButtonCallback, ButtonRouter, CallbackId, INVALID_CALLBACK_ID};
use crate::session::EditSession;

struct FilterEntry {
    id: CallbackId,
    mask: u64,
    callback: ButtonCallback,
}

/// Button-event registry gated on edit mode and blocking menus.
pub struct EditModeInput {
    session: Rc<RefCell<EditSession>>,
    menus: Rc<dyn MenuGuard>,
    callbacks: RefCell<Vec<FilterEntry>>,
    next_id: Cell<CallbackId>,
    router_callback: Cell<CallbackId>,
    initialized: Cell<bool>,
}

impl EditModeInput {
    pub fn new(session: Rc<RefCell<EditSession>>, menus: Rc<dyn MenuGuard>) -> Self {
        Self {
            session,
            menus,
            callbacks: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            router_callback: Cell::new(INVALID_CALLBACK_ID),
            initialized: Cell::new(false),
        }
    }

    /// Hook the filter into the raw router. Idempotent.
    pub fn initialize(this: &Rc<Self>, router: &ButtonRouter) {
        if this.initialized.get() {
            log::warn!("EditModeInput already initialized");
            return;
        }

        let weak = Rc::downgrade(this);
        let id = router.add_button_callback(ALL_BUTTONS, 0, move |event| match weak.upgrade() {
            Some(filter) => filter.on_button_event(event),
            None => false,
        });
        this.router_callback.set(id);
        this.initialized.set(true);
        log::info!("EditModeInput initialized");
    }

    /// Detach from the raw router and drop all subscribers.
    pub fn shutdown(&self, router: &ButtonRouter) {
        if !self.initialized.get() {
            return;
        }
        router.remove_button_callback(self.router_callback.get());
        self.router_callback.set(INVALID_CALLBACK_ID);
        self.callbacks.borrow_mut().clear();
        self.initialized.set(false);
        log::info!("EditModeInput shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Register a callback for the buttons in `mask`. Callbacks only fire
    /// while edit mode is active.
    pub fn add_callback(
        &self,
        mask: u64,
        callback: impl Fn(ButtonEvent) -> bool + 'static,
    ) -> CallbackId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.callbacks.borrow_mut().push(FilterEntry {
            id,
            mask,
            callback: Rc::new(callback),
        });
        log::info!("EditModeInput: added callback {id} for mask {mask:#X}");
        id
    }

    /// Remove a callback. No-op for unknown ids.
    pub fn remove_callback(&self, id: CallbackId) {
        if id == INVALID_CALLBACK_ID {
            return;
        }
        let mut callbacks = self.callbacks.borrow_mut();
        if let Some(pos) = callbacks.iter().position(|e| e.id == id) {
            let entry = callbacks.remove(pos);
            log::info!("EditModeInput: removed callback {id} for mask {:#X}", entry.mask);
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Raw-router entry point. Returns whether any subscriber consumed the
    /// event; blocked events report unconsumed so other raw subscribers
    /// still see them.
    pub fn on_button_event(&self, event: ButtonEvent) -> bool {
        let in_edit_mode = self.session.borrow().is_active();
        if !in_edit_mode {
            return false;
        }
        if self.menus.is_blocking_menu_open() {
            return false;
        }

        let bit = event.button.mask();

        // Snapshot: callbacks may mutate the registry while we iterate.
        let snapshot: Vec<ButtonCallback> = self
            .callbacks
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TomlConfigStore;
    use vredit_core::input::{Button, Hand};

    struct FakeMenus {
        open: Cell<bool>,
    }

    impl MenuGuard for FakeMenus {
        fn is_blocking_menu_open(&self) -> bool {
            self.open.get()
        }
    }

    struct Harness {
        filter: Rc<EditModeInput>,
        session: Rc<RefCell<EditSession>>,
        menus: Rc<FakeMenus>,
    }

    fn harness() -> Harness {
        let config = Rc::new(RefCell::new(TomlConfigStore::in_memory()));
        let session = Rc::new(RefCell::new(EditSession::new(config, None, None)));
        let menus = Rc::new(FakeMenus {
            open: Cell::new(false),
        });
        let filter = Rc::new(EditModeInput::new(session.clone(), menus.clone()));
        Harness {
            filter,
            session,
            menus,
        }
    }

    fn trigger_press() -> ButtonEvent {
        ButtonEvent {
            hand: Hand::Right,
            button: Button::Trigger,
            released: false,
        }
    }

    #[test]
    fn drops_events_while_gate_is_closed() {
        let h = harness();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        h.filter.add_callback(Button::Trigger.mask(), move |_| {
            counter.set(counter.get() + 1);
            true
        });

        assert!(!h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 0);

        h.session.borrow_mut().enter();
        assert!(h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn drops_events_while_blocking_menu_open() {
        let h = harness();
        h.session.borrow_mut().enter();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        h.filter.add_callback(Button::Trigger.mask(), move |_| {
            counter.set(counter.get() + 1);
            true
        });

        h.menus.open.set(true);
        assert!(!h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 0);

        h.menus.open.set(false);
        assert!(h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn all_matching_callbacks_run_and_any_consumes() {
        let h = harness();
        h.session.borrow_mut().enter();
        let calls = Rc::new(Cell::new(0u32));

        for consumes in [true, false, false] {
            let counter = calls.clone();
            h.filter.add_callback(Button::Trigger.mask(), move |_| {
                counter.set(counter.get() + 1);
                consumes
            });
        }

        assert!(h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn mask_mismatch_is_not_dispatched() {
        let h = harness();
        h.session.borrow_mut().enter();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        h.filter.add_callback(Button::Grip.mask(), move |_| {
            counter.set(counter.get() + 1);
            true
        });

        assert!(!h.filter.on_button_event(trigger_press()));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn callback_added_during_dispatch_misses_current_event() {
        let h = harness();
        h.session.borrow_mut().enter();
        let late_calls = Rc::new(Cell::new(0u32));

        let filter = h.filter.clone();
        let late = late_calls.clone();
        h.filter.add_callback(Button::Trigger.mask(), move |_| {
            let late = late.clone();
            filter.add_callback(Button::Trigger.mask(), move |_| {
                late.set(late.get() + 1);
                false
            });
            false
        });

        h.filter.on_button_event(trigger_press());
        assert_eq!(late_calls.get(), 0);
        assert_eq!(h.filter.callback_count(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let h = harness();
        let id = h.filter.add_callback(Button::Trigger.mask(), |_| false);
        h.filter.remove_callback(id);
        h.filter.remove_callback(id);
        assert_eq!(h.filter.callback_count(), 0);
    }

    #[test]
    fn initialize_registers_exactly_once() {
        let h = harness();
        let router = ButtonRouter::new();
        EditModeInput::initialize(&h.filter, &router);
        EditModeInput::initialize(&h.filter, &router);
        assert_eq!(router.button_callback_count(), 1);

        h.filter.shutdown(&router);
        assert_eq!(router.button_callback_count(), 0);
        assert!(!h.filter.is_initialized());
    }
}
