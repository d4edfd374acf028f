use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a placed model.
///
/// Assigned sequentially at scene load time and never reassigned, so it is
/// stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-angle rotation. The angle is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: Vec3,
    pub angle_degrees: f32,
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        axis: Vec3::Y,
        angle_degrees: 0.0,
    };

    pub fn new(axis: Vec3, angle_degrees: f32) -> Self {
        Self {
            axis,
            angle_degrees,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.axis.is_finite() && self.angle_degrees.is_finite()
    }

    /// Rotation matrix. A zero-length axis yields the identity.
    pub fn matrix(&self) -> Mat4 {
        match self.axis.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, self.angle_degrees.to_radians()),
            None => Mat4::IDENTITY,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Spatial transform: position, axis-angle rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
}

impl Transform {
    /// True when no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    /// World matrix: `translate(position) * rotate(angle, axis) * scale(scale)`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.rotation.matrix() * Mat4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn zero_axis_rotation_is_identity() {
        let r = Rotation::new(Vec3::ZERO, 45.0);
        assert_eq!(r.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Rotation::new(Vec3::Y, 90.0),
            scale: Vec3::splat(2.0),
        };
        // +X scaled to 2, rotated 90 deg about Y to -Z, then moved by +10 X.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(10.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn non_finite_components_are_detected() {
        assert!(Transform::default().is_finite());
        let mut t = Transform::default();
        t.position.x = f32::NAN;
        assert!(!t.is_finite());
        let mut t = Transform::default();
        t.rotation.angle_degrees = f32::INFINITY;
        assert!(!t.is_finite());
        let mut t = Transform::default();
        t.scale.z = f32::NEG_INFINITY;
        assert!(!t.is_finite());
    }

    #[test]
    fn model_id_display() {
        assert_eq!(ModelId(3).to_string(), "#3");
    }
}
