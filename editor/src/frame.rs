//! Per-frame update dispatch.
//!
//! [`FrameDispatcher`] fans the host's synchronous per-frame hook out to
//! registered [`FrameUpdateListener`]s, supplying wall-clock delta time.
//! Listeners may register or unregister other listeners from inside their
//! own update; every tick iterates a snapshot of the list taken before any
//! listener runs, so reentrant mutation never corrupts the iteration.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Instant;

/// Receives per-frame updates with delta time in seconds.
pub trait FrameUpdateListener {
    fn on_frame_update(&mut self, delta_time: f32);
}

/// Shared handle to a frame listener.
pub type SharedListener = Rc<RefCell<dyn FrameUpdateListener>>;

/// Delta time reported on the first tick, when no previous sample exists.
pub const FIRST_TICK_DELTA: f32 = 1.0 / 60.0;

struct ListenerEntry {
    listener: Weak<RefCell<dyn FrameUpdateListener>>,
    only_in_edit_mode: bool,
}

/// Ordered frame-listener registry driven by the host's main thread.
///
/// Entries are weak: listeners stay owned by their subsystems, which
/// register on their own initialize and unregister on their own shutdown.
/// An entry whose owner dropped without unregistering is pruned after the
/// next tick. Interior mutability keeps registration callable from inside
/// a running tick.
pub struct FrameDispatcher {
    listeners: RefCell<Vec<ListenerEntry>>,
    last_tick: Cell<Option<Instant>>,
}

fn listener_ptr(weak: &Weak<RefCell<dyn FrameUpdateListener>>) -> *const () {
    weak.as_ptr() as *const ()
}

impl FrameDispatcher {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            last_tick: Cell::new(None),
        }
    }

    /// Register a listener for frame updates.
    ///
    /// When `only_in_edit_mode` is set the listener is skipped while the
    /// edit-mode gate is closed. Registering the same listener twice is a
    /// no-op with a warning.
    pub fn register(&self, listener: &SharedListener, only_in_edit_mode: bool) {
        let ptr = Rc::as_ptr(listener) as *const ();
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|e| listener_ptr(&e.listener) == ptr) {
            log::warn!("FrameDispatcher: listener already registered");
            return;
        }
        listeners.push(ListenerEntry {
            listener: Rc::downgrade(listener),
            only_in_edit_mode,
        });
        log::info!(
            "FrameDispatcher: registered listener (only_in_edit_mode={}), total: {}",
            only_in_edit_mode,
            listeners.len()
        );
    }

    /// Unregister a listener. No-op if it was never registered.
    pub fn unregister(&self, listener: &SharedListener) {
        let ptr = Rc::as_ptr(listener) as *const ();
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|e| listener_ptr(&e.listener) != ptr);
        if listeners.len() != before {
            log::info!(
                "FrameDispatcher: unregistered listener, remaining: {}",
                listeners.len()
            );
        }
    }

    /// Remove every registered listener.
    pub fn unregister_all(&self) {
        self.listeners.borrow_mut().clear();
        log::info!("FrameDispatcher: unregistered all listeners");
    }

    pub fn registered_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Drive one frame at the given steady-clock instant.
    ///
    /// Delta time is the elapsed time since the previous tick
    /// ([`FIRST_TICK_DELTA`] on the very first one). `in_edit_mode` comes
    /// from the edit-mode gate and controls whether edit-mode-only
    /// listeners run.
    pub fn tick(&self, now: Instant, in_edit_mode: bool) {
        let delta_time = match self.last_tick.get() {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => FIRST_TICK_DELTA,
        };
        self.last_tick.set(Some(now));

        // Snapshot before invoking anything: listeners may mutate the
        // registry reentrantly.
        let snapshot: Vec<(Weak<RefCell<dyn FrameUpdateListener>>, bool)> = self
            .listeners
            .borrow()
            .iter()
            .map(|e| (e.listener.clone(), e.only_in_edit_mode))
            .collect();

        for (weak, only_in_edit_mode) in snapshot {
            if only_in_edit_mode && !in_edit_mode {
                continue;
            }
            if let Some(listener) = weak.upgrade() {
                listener.borrow_mut().on_frame_update(delta_time);
            }
        }

        self.listeners
            .borrow_mut()
            .retain(|e| e.listener.strong_count() > 0);
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
