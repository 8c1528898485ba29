//! # Camera Implementation
//!
//! The player's view: an eye position and a yaw/pitch orientation in the
//! world's Z-up frame. Yaw turns about +Z starting from +X; pitch tilts the
//! view up toward +Z.

use cgmath::{Angle, Deg, InnerSpace, Point3, Rad, Vector3};

/// Pitch limit in either direction, short of straight up or down.
const MAX_PITCH: Deg<f32> = Deg(89.0);

/// A first-person camera.
///
/// # Fields
/// - `position`: The eye position in world space
/// - `yaw`: Heading about +Z, zero along +X
/// - `pitch`: Elevation above the horizontal plane
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// # Arguments
    /// * `position` - Initial eye position. Can be any type that converts to `Point3<f32>`.
    /// * `yaw` - Initial heading. Can be any type that converts to `Rad<f32>`.
    /// * `pitch` - Initial elevation, clamped to the pitch limit.
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        };
        camera.clamp_pitch();
        camera
    }

    /// Gets the camera's view direction.
    ///
    /// # Returns
    /// A unit vector along the line of sight
    pub fn get_view_vec(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_cos * yaw_sin, pitch_sin).normalize()
    }

    /// Horizontal unit vector the camera is facing.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
        Vector3::new(yaw_cos, yaw_sin, 0.0)
    }

    /// Horizontal unit vector to the camera's left.
    pub fn left(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
        Vector3::new(-yaw_sin, yaw_cos, 0.0)
    }

    /// Turns the camera. Positive `horizontal` turns left, positive
    /// `vertical` looks up.
    pub fn rotate(&mut self, horizontal: Rad<f32>, vertical: Rad<f32>) {
        self.yaw = (self.yaw + horizontal).normalize();
        self.pitch += vertical;
        self.clamp_pitch();
    }

    fn clamp_pitch(&mut self) {
        let limit: Rad<f32> = MAX_PITCH.into();
        if self.pitch < -limit {
            self.pitch = -limit;
        } else if self.pitch > limit {
            self.pitch = limit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_follows_yaw_and_pitch() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(90.0), Deg(0.0));
        let view = camera.get_view_vec();
        assert!(view.x.abs() < 1e-6 && (view.y - 1.0).abs() < 1e-6);
        assert!((camera.left() - Vector3::new(-1.0, 0.0, 0.0)).magnitude() < 1e-6);

        let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(45.0));
        let view = camera.get_view_vec();
        assert!((view.x - view.z).abs() < 1e-6);
        assert_eq!(camera.forward(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn pitch_stops_short_of_vertical() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        camera.rotate(Rad(0.0), Deg(120.0).into());
        assert!((Deg::from(camera.pitch).0 - 89.0).abs() < 1e-3);
        camera.rotate(Rad(0.0), Deg(-300.0).into());
        assert!((Deg::from(camera.pitch).0 + 89.0).abs() < 1e-3);
        assert!(camera.get_view_vec().z > -1.0);
    }
}
