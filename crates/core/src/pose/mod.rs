use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation in world space.
///
/// Orientation follows the usual right-handed convention where a camera
/// looks down its local `-Z` axis, so an offset of `(0, 0, -5)` lands five
/// units in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose placed at `eye` and oriented so that its forward axis points at
    /// `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, orientation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position: eye,
            orientation: orientation.normalize(),
        }
    }

    /// Returns this pose moved by `offset` expressed in its own local frame.
    /// The orientation is carried over unchanged.
    pub fn translated_local(&self, offset: Vec3) -> Self {
        Self {
            position: self.position + self.orientation * offset,
            orientation: self.orientation,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Rigid transform with scale, used for scene nodes parented to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Converts a packed `0xRRGGBB` value into normalised RGB components.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn local_offset_follows_orientation() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(FRAC_PI_2));
        let moved = pose.translated_local(Vec3::new(0.0, 0.0, -5.0));

        // Turning left by 90 degrees makes local -Z point down world -X.
        assert_relative_eq!(moved.position.x, -4.0, epsilon = 1e-5);
        assert_relative_eq!(moved.position.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(moved.position.z, 3.0, epsilon = 1e-5);
        assert_eq!(moved.orientation, pose.orientation);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let pose = Pose::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let forward = pose.forward();

        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn decodes_hex_colours() {
        let orange = color_from_hex(0xffa500);
        assert_relative_eq!(orange.x, 1.0);
        assert_relative_eq!(orange.y, 165.0 / 255.0);
        assert_relative_eq!(orange.z, 0.0);
    }
}
