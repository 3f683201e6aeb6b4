//! # vredit Core
//!
//! Core crate for the vredit in-game VR object editor: platform-agnostic
//! input and math types, stable object identifiers, and the contracts the
//! edit controllers use to talk to the host engine.
//!
//! Nothing in this crate touches the VR runtime or the game engine directly.
//! Hosts implement the traits in [`world`], [`interfaces`], [`selection`],
//! and [`config`]; the `vredit-editor` crate drives them.

pub mod config;
pub mod input;
pub mod interfaces;
pub mod math;
pub mod object;
pub mod selection;
pub mod world;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core crate version at startup.
pub fn init() {
    log::info!("vredit Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
