//! Stable world-object identifiers.

use std::fmt;

/// Stable identifier for a world object reference.
///
/// The editor never holds owning pointers into the host scene graph; it
/// stores this id and re-validates liveness through
/// [`WorldObjects::is_valid`](crate::world::WorldObjects::is_valid) before
/// every use. The id stays stable while the object exists, even across
/// unload/reload of its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_padded_hex() {
        assert_eq!(ObjectId(0x10C0E3).to_string(), "0010C0E3");
        assert_eq!(ObjectId(0xFF000800).to_string(), "FF000800");
    }
}
