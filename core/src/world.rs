//! World query contracts: object liveness, transforms, raycasts, VR poses.
//!
//! The host engine owns the scene graph and the physics world; the editor
//! reaches both only through these traits.

use crate::input::Hand;
use crate::math::{Transform, Vec3};
use crate::object::ObjectId;

/// A ray in world space. `direction` is expected to be normalized.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Result of a world geometry ray test.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    pub point: Vec3,
    /// The object reference that was hit, if the geometry belongs to one.
    pub object: Option<ObjectId>,
}

/// Casts rays against solid world geometry.
///
/// Implementations are expected to pre-filter to selectable collision layers
/// (static geometry and props, not actors or UI).
pub trait RayCaster {
    /// Returns the closest hit within `max_distance`, or `None`.
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Access to world object references by stable id.
///
/// Objects can be unloaded at any time between frames, so every id must be
/// checked with [`is_valid`](Self::is_valid) (or tolerate `None`/`false`
/// returns) before use.
pub trait WorldObjects {
    /// Whether the object still resolves to a live reference.
    fn is_valid(&self, id: ObjectId) -> bool;

    /// Current world transform of the object, if it is live.
    fn transform_of(&self, id: ObjectId) -> Option<Transform>;

    /// Set the object's world transform. Returns `false` if the object is
    /// no longer live.
    fn set_transform(&mut self, id: ObjectId, transform: Transform) -> bool;

    /// All selectable objects whose geometry intersects the given sphere.
    fn objects_in_sphere(&self, center: Vec3, radius: f32) -> Vec<ObjectId>;
}

/// Tracked VR device poses.
///
/// Any accessor may return `None` while tracking is lost or before the
/// first pose arrives.
pub trait VrPoses {
    fn head_position(&self) -> Option<Vec3>;

    fn hand_position(&self, hand: Hand) -> Option<Vec3>;

    /// The pointing ray of a controller (origin at the controller tip).
    fn hand_aim(&self, hand: Hand) -> Option<Ray>;
}
