//! Configuration store contract and option keys.
//!
//! The editor reads its options through [`ConfigStore`]; the backing store
//! (TOML file, game config menu, in-memory test double) is up to the host.

/// Typed access to configuration options by key.
///
/// Readers pass a default that is returned for unknown keys, so a partial
/// store never breaks callers.
pub trait ConfigStore {
    fn get_bool(&self, key: &str, default: bool) -> bool;

    fn set_bool(&mut self, key: &str, value: bool);

    fn get_f32(&self, key: &str, default: f32) -> f32;

    fn set_f32(&mut self, key: &str, value: f32);
}

/// Option keys, `section:name` style.
pub mod keys {
    /// Mirror of the edit-mode active flag, kept in sync by the edit
    /// session so settings UIs can display and toggle it.
    pub const EDIT_MODE_ENABLED: &str = "general:edit-mode-enabled";

    /// Whether the first-run tutorial has been shown. Internal tracking
    /// for [`TutorialFlow`](crate::interfaces::TutorialFlow)
    /// implementations; no settings-menu counterpart.
    pub const TUTORIAL_SHOWN: &str = "general:tutorial-shown";

    /// Put a hand inside a static object and double-tap the trigger to
    /// toggle edit mode. Default: enabled.
    pub const QUICK_EDIT_ENABLED: &str = "controls:quick-edit-enabled";

    /// Maximum ray-selection distance in game units.
    pub const MAX_RAY_DISTANCE: &str = "selection:max-ray-distance";

    /// Radius of the volume-selection sphere in game units.
    pub const SPHERE_RADIUS: &str = "selection:sphere-radius";
}
