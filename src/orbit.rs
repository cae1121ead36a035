use std::f32::consts::{PI, TAU};

use glam::Vec3;
use log::debug;
use winit::{dpi::PhysicalPosition, event::MouseScrollDelta};

use crate::entity::Camera;

const POLAR_EPSILON: f32 = 1e-4;
const ZOOM_STEP: f32 = 0.95;

/// Damped orbit camera: drag rotates around the target, scroll dollies in and out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    radius: f32,
    polar: f32,
    azimuth: f32,
    pending_polar: f32,
    pending_azimuth: f32,
    pending_zoom: f32,
    damping_factor: f32,
    min_radius: f32,
    max_radius: f32,
    viewport_height: f32,
    dragging: bool,
}

impl OrbitControls {
    pub fn new(position: Vec3, target: Vec3, viewport_height: f32) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (polar, azimuth) = if radius > 0. {
            (
                (offset.y / radius).clamp(-1., 1.).acos(),
                offset.x.atan2(offset.z),
            )
        } else {
            (PI * 0.5, 0.)
        };

        Self {
            target,
            radius,
            polar,
            azimuth,
            pending_polar: 0.,
            pending_azimuth: 0.,
            pending_zoom: 1.,
            damping_factor: 0.05,
            min_radius: 0.5,
            max_radius: 50.,
            viewport_height: viewport_height.max(1.),
            dragging: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.);
    }

    pub fn on_mouse_button(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    /// Ends a drag whose button release may never arrive, e.g. when the
    /// cursor leaves the window or focus moves elsewhere.
    pub fn cancel_drag(&mut self) {
        if self.dragging {
            debug!("orbit drag cancelled");
        }
        self.dragging = false;
    }

    /// Raw pointer motion in pixels; ignored unless a drag is in progress.
    pub fn on_mouse_move(&mut self, (x, y): (f64, f64)) {
        if !self.dragging {
            return;
        }
        self.pending_azimuth -= TAU * x as f32 / self.viewport_height;
        self.pending_polar -= TAU * y as f32 / self.viewport_height;
    }

    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        let y = match delta {
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32,
            MouseScrollDelta::LineDelta(_, y) => y * 60.0,
        };
        if y > 0. {
            self.pending_zoom *= ZOOM_STEP;
        } else if y < 0. {
            self.pending_zoom /= ZOOM_STEP;
        }
    }

    /// Applies a damped share of the accumulated input and moves the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        self.azimuth += self.pending_azimuth * self.damping_factor;
        self.polar += self.pending_polar * self.damping_factor;
        self.polar = self.polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        self.radius = (self.radius * self.pending_zoom).clamp(self.min_radius, self.max_radius);
        self.pending_zoom = 1.;

        self.pending_azimuth *= 1. - self.damping_factor;
        self.pending_polar *= 1. - self.damping_factor;

        camera.position = self.position();
        camera.target = self.target;
        debug!(
            "orbit radius {:.3} polar {:.3} azimuth {:.3}",
            self.radius, self.polar, self.azimuth
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::new(4., 2., 4.), Vec3::ZERO, 720.)
    }

    #[test]
    fn starts_at_the_given_position() {
        let controls = controls();
        assert!((controls.position() - Vec3::new(4., 2., 4.)).length() < 1e-5);
        assert!((controls.radius - 6.).abs() < 1e-5);
    }

    #[test]
    fn update_without_input_keeps_camera_still() {
        let mut controls = controls();
        let mut camera = Camera::default();
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert!((camera.position - Vec3::new(4., 2., 4.)).length() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn motion_without_drag_is_ignored() {
        let mut controls = controls();
        controls.on_mouse_move((100., 50.));
        assert_eq!(controls.pending_azimuth, 0.);
        assert_eq!(controls.pending_polar, 0.);
    }

    #[test]
    fn cancelled_drag_ignores_later_motion() {
        let mut controls = controls();
        controls.on_mouse_button(true);
        controls.on_mouse_move((10., 0.));
        let pending = controls.pending_azimuth;
        assert!(pending != 0.);

        controls.cancel_drag();
        controls.on_mouse_move((500., 500.));
        assert_eq!(controls.pending_azimuth, pending);
        assert_eq!(controls.pending_polar, 0.);
    }

    #[test]
    fn drag_rotates_with_inertia_that_decays() {
        let mut controls = controls();
        let mut camera = Camera::default();
        controls.on_mouse_button(true);
        controls.on_mouse_move((120., 0.));
        controls.on_mouse_button(false);

        let start = controls.azimuth;
        controls.update(&mut camera);
        let first_step = (controls.azimuth - start).abs();
        assert!(first_step > 0.);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(controls.pending_azimuth.abs() < 1e-6);

        let settled = controls.azimuth;
        controls.update(&mut camera);
        assert!((controls.azimuth - settled).abs() < first_step * 1e-3);
        assert!((camera.position.length() - 6.).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_stays_clamped() {
        let mut controls = controls();
        let mut camera = Camera::default();
        controls.on_mouse_button(true);
        controls.on_mouse_move((0., 1e6));
        for _ in 0..100 {
            controls.update(&mut camera);
            assert!(controls.polar >= POLAR_EPSILON && controls.polar <= PI - POLAR_EPSILON);
        }
        controls.on_mouse_move((0., -1e6));
        for _ in 0..100 {
            controls.update(&mut camera);
            assert!(controls.polar >= POLAR_EPSILON && controls.polar <= PI - POLAR_EPSILON);
        }
    }

    #[test]
    fn scroll_zooms_within_limits() {
        let mut controls = controls();
        let mut camera = Camera::default();
        controls.on_mouse_scroll(MouseScrollDelta::LineDelta(0., 1.));
        controls.update(&mut camera);
        assert!((controls.radius - 6. * ZOOM_STEP).abs() < 1e-4);

        for _ in 0..200 {
            controls.on_mouse_scroll(MouseScrollDelta::LineDelta(0., -1.));
            controls.update(&mut camera);
        }
        assert_eq!(controls.radius, 50.);

        for _ in 0..200 {
            controls.on_mouse_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0., 4.)));
            controls.update(&mut camera);
        }
        assert_eq!(controls.radius, 0.5);
    }
}
