use glam::{Mat4, Vec3};

use crate::{color::Color, config::Config, debug::FIREFLIES_SIZE, window::Viewport};

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Uniform inputs of the firefly shader.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FirefliesParams {
    pub time: f32,
    pub pixel_ratio: f32,
    pub size: f32,
}

/// Uniform inputs of the portal shader.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PortalParams {
    pub time: f32,
    pub color_start: Color,
    pub color_end: Color,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub viewport: Viewport,
    pub fireflies: FirefliesParams,
    pub portal: PortalParams,
    pub pole_light_color: Color,
    pub clear_color: Color,
}

impl Scene {
    pub fn new(config: &Config, viewport: Viewport) -> Self {
        let camera = Camera {
            position: Vec3::from(config.camera.position),
            target: Vec3::from(config.camera.target),
            fov: config.camera.fov,
            aspect_ratio: viewport.aspect(),
            near: config.camera.near,
            far: config.camera.far,
        };

        Self {
            camera,
            viewport,
            fireflies: FirefliesParams {
                time: 0.,
                pixel_ratio: viewport.pixel_ratio(),
                size: FIREFLIES_SIZE.snap(config.fireflies.size),
            },
            portal: PortalParams {
                time: 0.,
                color_start: config.portal.color_start,
                color_end: config.portal.color_end,
            },
            pole_light_color: config.renderer.pole_light_color,
            clear_color: config.renderer.clear_color,
        }
    }

    /// Writes the frame's elapsed time into every time-dependent shader input.
    pub fn set_time(&mut self, elapsed: f32) {
        self.fireflies.time = elapsed;
        self.portal.time = elapsed;
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect_ratio = viewport.aspect();
        self.fireflies.pixel_ratio = viewport.pixel_ratio();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(&Config::default(), Viewport::new(1280., 720., 1.))
    }

    #[test]
    fn builds_from_config() {
        let scene = scene();
        assert_eq!(scene.camera.position, Vec3::new(4., 2., 4.));
        assert_eq!(scene.camera.aspect_ratio, 1280. / 720.);
        assert_eq!(scene.fireflies.size, 80.);
        assert_eq!(scene.fireflies.pixel_ratio, 1.);
        assert_eq!(scene.portal.color_start, Color::from_u32(0x23cdca));
        assert_eq!(scene.portal.time, 0.);
    }

    #[test]
    fn configured_fireflies_size_starts_on_the_slider() {
        let viewport = Viewport::new(1280., 720., 1.);
        let mut config = Config::default();
        for (configured, expected) in [(9000., 500.), (-3., 0.), (80.4, 80.), (250., 250.)] {
            config.fireflies.size = configured;
            assert_eq!(Scene::new(&config, viewport).fireflies.size, expected);
        }
    }

    #[test]
    fn resize_updates_aspect_and_pixel_ratio() {
        let mut scene = scene();
        scene.resize(Viewport::new(1920., 1080., 3.));
        assert_eq!(scene.camera.aspect_ratio, 1920. / 1080.);
        assert_eq!(scene.fireflies.pixel_ratio, 2.);
        assert_eq!(scene.viewport.device_pixel_ratio, 3.);
    }

    #[test]
    fn time_reaches_both_shaders() {
        let mut scene = scene();
        scene.set_time(12.5);
        assert_eq!(scene.fireflies.time, 12.5);
        assert_eq!(scene.portal.time, 12.5);
    }

    #[test]
    fn camera_projects_target_to_screen_center() {
        let camera = scene().camera;
        let clip = camera.view_projection_matrix() * camera.target.extend(1.);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0. && ndc.z < 1.);
    }
}
