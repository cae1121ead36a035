use anyhow::Result;
use log::{debug, info};
use winit::{
    dpi::PhysicalSize,
    event::{MouseScrollDelta, VirtualKeyCode},
    window::Window,
};

use crate::{
    assets::SceneAssets,
    config::Config,
    debug::DebugPanel,
    entity::Scene,
    fireflies,
    frame_loop::{FrameHandler, FrameTime},
    orbit::OrbitControls,
    renderer::Renderer,
    window::Viewport,
};

pub struct App {
    window: Window,
    title: String,
    scene: Scene,
    renderer: Renderer,
    orbit: OrbitControls,
    debug_panel: DebugPanel,
}

impl App {
    pub async fn new(window: Window, config: &Config, assets: &SceneAssets) -> Result<Self> {
        let viewport = Viewport::from_physical(window.inner_size(), window.scale_factor());
        let scene = Scene::new(config, viewport);
        info!("{:#?}", &scene);

        let field = fireflies::generate(config.fireflies.count, &mut fireflies::seeded_rng())?;
        info!("Generated {} fireflies", field.len());

        let renderer = Renderer::new(&window, &scene, assets, &field, &config.renderer).await?;

        let orbit = OrbitControls::new(scene.camera.position, scene.camera.target, viewport.height);

        Ok(Self {
            window,
            title: config.window.title.clone(),
            scene,
            renderer,
            orbit,
            debug_panel: DebugPanel::default(),
        })
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn on_resize(&mut self, size: PhysicalSize<u32>) {
        self.apply_size(size, self.window.scale_factor());
    }

    pub fn on_scale_factor_changed(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        self.apply_size(size, scale_factor);
    }

    fn apply_size(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        // Minimised windows report a zero size; keep the last good targets.
        if size.width == 0 || size.height == 0 {
            debug!("Ignoring empty resize");
            return;
        }

        let viewport = Viewport::from_physical(size, scale_factor);
        self.scene.resize(viewport);
        self.orbit.set_viewport_height(viewport.height);
        self.renderer.resize(size.into(), viewport.render_size());
        info!(
            "Resized to {}x{} @{} (render {:?})",
            viewport.width,
            viewport.height,
            viewport.device_pixel_ratio,
            viewport.render_size()
        );
    }

    pub fn on_mouse_button(&mut self, pressed: bool) {
        self.orbit.on_mouse_button(pressed);
    }

    pub fn on_pointer_lost(&mut self) {
        self.orbit.cancel_drag();
    }

    pub fn on_mouse_move(&mut self, delta: (f64, f64)) {
        self.orbit.on_mouse_move(delta);
    }

    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        self.orbit.on_mouse_scroll(delta);
    }

    pub fn on_key_down(&mut self, keycode: VirtualKeyCode) {
        if self.debug_panel.on_key(keycode, &mut self.scene) {
            let status = self.debug_panel.status(&self.scene);
            self.window
                .set_title(&format!("{} | {}", self.title, status));
        }
    }
}

impl FrameHandler for App {
    fn update_time(&mut self, time: FrameTime) {
        self.scene.set_time(time.elapsed());
    }

    fn update_controls(&mut self) {
        self.orbit.update(&mut self.scene.camera);
    }

    fn render(&mut self) -> Result<()> {
        self.renderer.render(&self.scene)
    }
}
