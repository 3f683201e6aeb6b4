//! Math type aliases and the world-object transform type.
//!
//! All editor math is f32. The aliases follow the host engine's handedness;
//! nothing here assumes a particular up axis.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// Unit quaternion rotation (f32).
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Position, rotation, and uniform scale of a world object.
///
/// Matches the host engine's object transform representation: game objects
/// carry a single scalar scale, not a per-axis one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Transform {
    /// The identity transform (no translation, no rotation, scale 1).
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: 1.0,
        }
    }

    /// Build a transform from a translation only.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Expand to a homogeneous 4x4 TRS matrix.
    pub fn to_matrix(&self) -> Mat4 {
        let m = self.rotation.to_rotation_matrix();
        let rm = m.matrix();
        let s = self.scale;
        #[rustfmt::skip]
        let result = Mat4::new(
            rm[(0, 0)] * s, rm[(0, 1)] * s, rm[(0, 2)] * s, self.translation.x,
            rm[(1, 0)] * s, rm[(1, 1)] * s, rm[(1, 2)] * s, self.translation.y,
            rm[(2, 0)] * s, rm[(2, 1)] * s, rm[(2, 2)] * s, self.translation.z,
            0.0,            0.0,            0.0,            1.0,
        );
        result
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::identity().to_matrix(), Mat4::identity());
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let m = t.to_matrix();
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn scale_applies_to_rotation_block() {
        let t = Transform {
            scale: 2.0,
            ..Transform::identity()
        };
        let m = t.to_matrix();
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(1, 1)], 2.0);
        assert_eq!(m[(2, 2)], 2.0);
        assert_eq!(m[(3, 3)], 1.0);
    }
}
