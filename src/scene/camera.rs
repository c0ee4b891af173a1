use nalgebra as na;
use na::{matrix, vector, Matrix4, Point3, Rotation3, Vector3};

const ZOOM_STEP: f32 = 0.5;
const MIN_DISTANCE: f32 = 0.5;
const STRAFE_DEGREES: f32 = 3.0;

/// Look-at camera, driven by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vector3<f32>,
    pub center: Vector3<f32>,
    pub up: Vector3<f32>,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        return Self {
            eye: vector![0.0, 0.0, 15.0],
            center: vector![0.0, 0.0, 0.0],
            up: vector![0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        };
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Matrix4<f32> {
        return Matrix4::look_at_rh(&Point3::from(self.eye), &Point3::from(self.center), &self.up);
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width as f32 / height.max(1) as f32;
        return Matrix4::new_perspective(aspect, self.fov_degrees.to_radians(), self.near, self.far);
    }

    /// Moves the eye toward the center, never closer than a minimal distance.
    pub fn zoom_in(&mut self) {
        let offset = self.eye - self.center;
        let distance = offset.norm();
        if distance - ZOOM_STEP < MIN_DISTANCE {
            return;
        }
        self.eye = self.center + offset * ((distance - ZOOM_STEP) / distance);
    }

    pub fn zoom_out(&mut self) {
        let offset = self.eye - self.center;
        let distance = offset.norm();
        if distance + ZOOM_STEP > self.far {
            return;
        }
        self.eye = self.center + offset * ((distance + ZOOM_STEP) / distance);
    }

    /// Orbits the eye around the center, about the up axis.
    pub fn move_left(&mut self) {
        self.orbit(-STRAFE_DEGREES);
    }

    pub fn move_right(&mut self) {
        self.orbit(STRAFE_DEGREES);
    }

    fn orbit(&mut self, degrees: f32) {
        let Some(axis) = na::Unit::try_new(self.up, 1e-6) else {
            return;
        };
        let rotation = Rotation3::from_axis_angle(&axis, degrees.to_radians());
        self.eye = self.center + rotation * (self.eye - self.center);
    }
}

/// NDC to pixels: x from [-1, 1] to [0, width], y flipped so that row 0 is the top,
/// z from [-1, 1] to depth [0, 1].
pub fn viewport_matrix(width: u32, height: u32) -> Matrix4<f32> {
    let w = width as f32;
    let h = height as f32;
    return matrix![w / 2.0, 0.0,      0.0, w / 2.0;
                   0.0,     -h / 2.0, 0.0, h / 2.0;
                   0.0,     0.0,      0.5, 0.5;
                   0.0,     0.0,      0.0, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::to_hom_point;

    #[test]
    fn center_projects_to_screen_middle() {
        let camera = Camera::default();
        let clip = camera.projection_matrix(200, 100) * camera.view_matrix() * to_hom_point(camera.center);
        let ndc = clip.xyz() / clip.w;
        let screen = viewport_matrix(200, 100) * to_hom_point(ndc);
        assert!((screen.x - 100.0).abs() < 1e-3);
        assert!((screen.y - 50.0).abs() < 1e-3);
        assert!(screen.z > 0.0 && screen.z < 1.0);
    }

    #[test]
    fn nearer_points_get_smaller_depth() {
        let camera = Camera::default();
        let depth = |z: f32| {
            let clip = camera.projection_matrix(64, 64) * camera.view_matrix() * to_hom_point(vector![0.0, 0.0, z]);
            return (viewport_matrix(64, 64) * to_hom_point(clip.xyz() / clip.w)).z;
        };
        assert!(depth(5.0) < depth(0.0));
        assert!(depth(0.0) < depth(-20.0));
    }

    #[test]
    fn zoom_keeps_direction_and_minimum_distance() {
        let mut camera = Camera::default();
        camera.zoom_in();
        assert!((camera.eye - vector![0.0, 0.0, 14.5]).norm() < 1e-5);
        for _ in 0..100 {
            camera.zoom_in();
        }
        assert!((camera.eye - camera.center).norm() >= MIN_DISTANCE);
        camera.zoom_out();
        assert!(camera.eye.z > 0.0);
    }

    #[test]
    fn strafing_keeps_distance() {
        let mut camera = Camera::default();
        camera.move_left();
        camera.move_left();
        camera.move_right();
        assert!(((camera.eye - camera.center).norm() - 15.0).abs() < 1e-4);
        assert!(camera.eye.x != 0.0);
    }
}
