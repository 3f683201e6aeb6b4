//! The edit-mode gate.
//!
//! [`EditSession`] owns the process-wide "are we in edit mode" flag. While
//! edit mode is active, normal gameplay input is repurposed for object
//! manipulation, so entering suspends the conflicting input consumers (the
//! hand-interaction grab layer's trigger/grip handling, the companion
//! mod's VR input capture) and exiting restores them.
//!
//! Side effects are delta-tracked: the session remembers which settings it
//! actually changed and only ever reverts those, so a setting the user had
//! already disabled is left untouched on both ends.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use vredit_core::config::{keys, ConfigStore};
use vredit_core::interfaces::{
    hand_settings, HandInteraction, HotkeyControl, IntegrationCapabilities,
};

use crate::state::EditStateController;

/// Errors from [`EditSession::initialize`]. All are recoverable: the
/// caller may retry once the missing collaborator is up, and enter/exit
/// keep working in a degraded mode (no side effects on the absent
/// integration).
#[derive(Debug, Error)]
pub enum SessionInitError {
    #[error("hand-interaction integration unavailable")]
    IntegrationUnavailable,
}

/// Boolean edit-mode gate with symmetric enter/exit side effects.
pub struct EditSession {
    initialized: bool,
    active: bool,

    config: Rc<RefCell<dyn ConfigStore>>,
    hand_interaction: Option<Rc<RefCell<dyn HandInteraction>>>,
    hotkeys: Option<Rc<RefCell<dyn HotkeyControl>>>,
    state: Weak<RefCell<EditStateController>>,

    capabilities: IntegrationCapabilities,

    // Original hand-interaction settings, snapshotted at initialize.
    original_enable_trigger: f64,
    original_enable_grip: f64,

    // Delta tracking: only revert what we actually changed.
    trigger_disabled_by_us: bool,
    grip_disabled_by_us: bool,
    original_hotkeys_enabled: bool,
    hotkeys_changed_by_us: bool,
}

impl EditSession {
    pub fn new(
        config: Rc<RefCell<dyn ConfigStore>>,
        hand_interaction: Option<Rc<RefCell<dyn HandInteraction>>>,
        hotkeys: Option<Rc<RefCell<dyn HotkeyControl>>>,
    ) -> Self {
        Self {
            initialized: false,
            active: false,
            config,
            hand_interaction,
            hotkeys,
            state: Weak::new(),
            capabilities: IntegrationCapabilities::default(),
            original_enable_trigger: 1.0,
            original_enable_grip: 1.0,
            trigger_disabled_by_us: false,
            grip_disabled_by_us: false,
            original_hotkeys_enabled: false,
            hotkeys_changed_by_us: false,
        }
    }

    /// Wire the state machine notified on enter/exit.
    pub fn set_state_controller(&mut self, state: Weak<RefCell<EditStateController>>) {
        self.state = state;
    }

    /// Probe the optional integrations and snapshot their original
    /// settings. Idempotent; safe to retry after an
    /// [`IntegrationUnavailable`](SessionInitError::IntegrationUnavailable)
    /// failure.
    pub fn initialize(&mut self) -> Result<(), SessionInitError> {
        if self.initialized {
            return Ok(());
        }

        // A fresh game session always starts with edit mode off.
        self.config
            .borrow_mut()
            .set_bool(keys::EDIT_MODE_ENABLED, false);

        let hand = match &self.hand_interaction {
            Some(hand) => hand.clone(),
            None => {
                log::warn!("EditSession: hand-interaction integration not available");
                return Err(SessionInitError::IntegrationUnavailable);
            }
        };

        let mut capabilities = IntegrationCapabilities {
            available: true,
            ..IntegrationCapabilities::default()
        };

        let hand = hand.borrow();
        match hand.get_setting(hand_settings::ENABLE_TRIGGER) {
            Some(value) => {
                capabilities.has_trigger_setting = true;
                self.original_enable_trigger = value;
                log::info!("EditSession: original {} = {}", hand_settings::ENABLE_TRIGGER, value);
            }
            None => {
                log::warn!(
                    "EditSession: failed to read {}, assuming 1 (enabled)",
                    hand_settings::ENABLE_TRIGGER
                );
                self.original_enable_trigger = 1.0;
            }
        }
        match hand.get_setting(hand_settings::ENABLE_GRIP) {
            Some(value) => {
                capabilities.has_grip_setting = true;
                self.original_enable_grip = value;
                log::info!("EditSession: original {} = {}", hand_settings::ENABLE_GRIP, value);
            }
            None => {
                log::warn!(
                    "EditSession: failed to read {}, assuming 1 (enabled)",
                    hand_settings::ENABLE_GRIP
                );
                self.original_enable_grip = 1.0;
            }
        }

        self.capabilities = capabilities;
        self.initialized = true;
        log::info!("EditSession: initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// What the startup probe found.
    pub fn capabilities(&self) -> IntegrationCapabilities {
        self.capabilities
    }

    /// Enter edit mode. No-op if already active.
    pub fn enter(&mut self) {
        if self.active {
            log::debug!("EditSession: already in edit mode");
            return;
        }

        log::info!("EditSession: entering edit mode");
        self.suspend_hand_interaction();
        self.block_companion_hotkeys();
        self.active = true;

        self.config
            .borrow_mut()
            .set_bool(keys::EDIT_MODE_ENABLED, true);

        match self.state.upgrade() {
            Some(state) => state.borrow_mut().on_edit_mode_enter(),
            None => log::trace!("EditSession: no state controller wired"),
        }
    }

    /// Exit edit mode. No-op if not active.
    pub fn exit(&mut self) {
        if !self.active {
            log::debug!("EditSession: not in edit mode");
            return;
        }

        log::info!("EditSession: exiting edit mode");

        // Let the state machine tear down while the gate is still open.
        match self.state.upgrade() {
            Some(state) => state.borrow_mut().on_edit_mode_exit(),
            None => log::trace!("EditSession: no state controller wired"),
        }

        self.restore_hand_interaction();
        self.restore_companion_hotkeys();
        self.active = false;

        self.config
            .borrow_mut()
            .set_bool(keys::EDIT_MODE_ENABLED, false);
    }

    fn suspend_hand_interaction(&mut self) {
        if !self.initialized || !self.capabilities.available {
            log::warn!("EditSession: cannot suspend hand interaction - not initialized");
            return;
        }
        let hand = match &self.hand_interaction {
            Some(hand) => hand.clone(),
            None => return,
        };
        let mut hand = hand.borrow_mut();

        // Skip settings the user already disabled; nothing to revert then.
        if !self.trigger_disabled_by_us && self.original_enable_trigger != 0.0 {
            if hand.set_setting(hand_settings::ENABLE_TRIGGER, 0.0) {
                self.trigger_disabled_by_us = true;
                log::debug!("EditSession: disabled hand-interaction trigger");
            } else {
                log::warn!("EditSession: failed to disable hand-interaction trigger");
            }
        }
        if !self.grip_disabled_by_us && self.original_enable_grip != 0.0 {
            if hand.set_setting(hand_settings::ENABLE_GRIP, 0.0) {
                self.grip_disabled_by_us = true;
                log::debug!("EditSession: disabled hand-interaction grip");
            } else {
                log::warn!("EditSession: failed to disable hand-interaction grip");
            }
        }
    }

    fn restore_hand_interaction(&mut self) {
        let hand = match &self.hand_interaction {
            Some(hand) => hand.clone(),
            None => {
                if self.trigger_disabled_by_us || self.grip_disabled_by_us {
                    log::warn!("EditSession: cannot restore hand interaction - integration gone");
                }
                return;
            }
        };
        let mut hand = hand.borrow_mut();

        if self.trigger_disabled_by_us {
            if hand.set_setting(hand_settings::ENABLE_TRIGGER, self.original_enable_trigger) {
                self.trigger_disabled_by_us = false;
                log::debug!(
                    "EditSession: restored hand-interaction trigger to {}",
                    self.original_enable_trigger
                );
            } else {
                log::warn!("EditSession: failed to restore hand-interaction trigger");
            }
        }
        if self.grip_disabled_by_us {
            if hand.set_setting(hand_settings::ENABLE_GRIP, self.original_enable_grip) {
                self.grip_disabled_by_us = false;
                log::debug!(
                    "EditSession: restored hand-interaction grip to {}",
                    self.original_enable_grip
                );
            } else {
                log::warn!("EditSession: failed to restore hand-interaction grip");
            }
        }
    }

    fn block_companion_hotkeys(&mut self) {
        let hotkeys = match &self.hotkeys {
            Some(hotkeys) if hotkeys.borrow().is_available() => hotkeys.clone(),
            _ => {
                log::debug!("EditSession: companion hotkey control not available");
                return;
            }
        };
        if self.hotkeys_changed_by_us {
            return;
        }
        if hotkeys.borrow_mut().set_hotkeys_enabled(true) {
            self.hotkeys_changed_by_us = true;
            log::info!("EditSession: enabled companion hotkey capture (blocking its VR input)");
        } else {
            log::warn!("EditSession: failed to enable companion hotkey capture");
        }
    }

    fn restore_companion_hotkeys(&mut self) {
        if !self.hotkeys_changed_by_us {
            return;
        }
        let hotkeys = match &self.hotkeys {
            Some(hotkeys) if hotkeys.borrow().is_available() => hotkeys.clone(),
            _ => {
                log::debug!("EditSession: companion hotkey control gone, skipping restore");
                self.hotkeys_changed_by_us = false;
                return;
            }
        };
        if hotkeys
            .borrow_mut()
            .set_hotkeys_enabled(self.original_hotkeys_enabled)
        {
            self.hotkeys_changed_by_us = false;
            log::info!(
                "EditSession: restored companion hotkey capture to {}",
                self.original_hotkeys_enabled
            );
        } else {
            log::warn!("EditSession: failed to restore companion hotkey capture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TomlConfigStore;
    use std::collections::HashMap;

    struct FakeHands {
        settings: HashMap<String, f64>,
        set_calls: Vec<(String, f64)>,
    }

    impl FakeHands {
        fn new(trigger: f64, grip: f64) -> Self {
            let mut settings = HashMap::new();
            settings.insert(hand_settings::ENABLE_TRIGGER.to_string(), trigger);
            settings.insert(hand_settings::ENABLE_GRIP.to_string(), grip);
            Self {
                settings,
                set_calls: Vec::new(),
            }
        }
    }

    impl HandInteraction for FakeHands {
        fn get_setting(&self, name: &str) -> Option<f64> {
            self.settings.get(name).copied()
        }

        fn set_setting(&mut self, name: &str, value: f64) -> bool {
            if !self.settings.contains_key(name) {
                return false;
            }
            self.settings.insert(name.to_string(), value);
            self.set_calls.push((name.to_string(), value));
            true
        }
    }

    struct FakeHotkeys {
        available: bool,
        enabled: bool,
        changes: Vec<bool>,
    }

    impl HotkeyControl for FakeHotkeys {
        fn is_available(&self) -> bool {
            self.available
        }

        fn set_hotkeys_enabled(&mut self, enabled: bool) -> bool {
            self.enabled = enabled;
            self.changes.push(enabled);
            true
        }
    }

    fn config() -> Rc<RefCell<TomlConfigStore>> {
        Rc::new(RefCell::new(TomlConfigStore::in_memory()))
    }

    fn session_with(
        hands: &Rc<RefCell<FakeHands>>,
        hotkeys: &Rc<RefCell<FakeHotkeys>>,
        config: &Rc<RefCell<TomlConfigStore>>,
    ) -> EditSession {
        EditSession::new(
            config.clone(),
            Some(hands.clone()),
            Some(hotkeys.clone()),
        )
    }

    #[test]
    fn initialize_probes_capabilities() {
        let hands = Rc::new(RefCell::new(FakeHands::new(1.0, 0.0)));
        let hotkeys = Rc::new(RefCell::new(FakeHotkeys {
            available: true,
            enabled: false,
            changes: Vec::new(),
        }));
        let config = config();
        let mut session = session_with(&hands, &hotkeys, &config);

        session.initialize().unwrap();
        let caps = session.capabilities();
        assert!(caps.available);
        assert!(caps.has_trigger_setting);
        assert!(caps.has_grip_setting);
    }

    #[test]
    fn enter_is_idempotent_with_exactly_once_side_effects() {
        let hands = Rc::new(RefCell::new(FakeHands::new(1.0, 1.0)));
        let hotkeys = Rc::new(RefCell::new(FakeHotkeys {
            available: true,
            enabled: false,
            changes: Vec::new(),
        }));
        let config = config();
        let mut session = session_with(&hands, &hotkeys, &config);
        session.initialize().unwrap();

        session.enter();
        session.enter();

        assert!(session.is_active());
        assert_eq!(hands.borrow().set_calls.len(), 2); // trigger + grip, once
        assert_eq!(hotkeys.borrow().changes, vec![true]);
        assert!(config.borrow().get_bool(keys::EDIT_MODE_ENABLED, false));
    }

    #[test]
    fn exit_reverts_exactly_once_and_is_idempotent() {
        let hands = Rc::new(RefCell::new(FakeHands::new(1.0, 1.0)));
        let hotkeys = Rc::new(RefCell::new(FakeHotkeys {
            available: true,
            enabled: false,
            changes: Vec::new(),
        }));
        let config = config();
        let mut session = session_with(&hands, &hotkeys, &config);
        session.initialize().unwrap();

        session.enter();
        session.exit();
        session.exit();

        assert!(!session.is_active());
        let hands = hands.borrow();
        assert_eq!(hands.set_calls.len(), 4); // 2 disables + 2 restores
        assert_eq!(
            hands.settings[hand_settings::ENABLE_TRIGGER],
            1.0
        );
        assert_eq!(hands.settings[hand_settings::ENABLE_GRIP], 1.0);
        assert_eq!(hotkeys.borrow().changes, vec![true, false]);
        assert!(!config.borrow().get_bool(keys::EDIT_MODE_ENABLED, true));
    }

    #[test]
    fn user_disabled_setting_is_never_touched() {
        // Grip already disabled by the user: edit mode must not disable or
        // restore it.
        let hands = Rc::new(RefCell::new(FakeHands::new(1.0, 0.0)));
        let hotkeys = Rc::new(RefCell::new(FakeHotkeys {
            available: false,
            enabled: false,
            changes: Vec::new(),
        }));
        let config = config();
        let mut session = session_with(&hands, &hotkeys, &config);
        session.initialize().unwrap();

        session.enter();
        session.exit();

        let hands = hands.borrow();
        assert!(hands
            .set_calls
            .iter()
            .all(|(name, _)| name != hand_settings::ENABLE_GRIP));
        assert_eq!(hands.settings[hand_settings::ENABLE_GRIP], 0.0);
        assert!(hotkeys.borrow().changes.is_empty());
    }

    #[test]
    fn degraded_without_integration() {
        let config = config();
        let mut session = EditSession::new(config.clone(), None, None);

        assert!(matches!(
            session.initialize(),
            Err(SessionInitError::IntegrationUnavailable)
        ));
        assert!(!session.is_initialized());

        // The gate itself still works.
        session.enter();
        assert!(session.is_active());
        session.exit();
        assert!(!session.is_active());
    }
}
