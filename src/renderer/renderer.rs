use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    assets::SceneAssets,
    config::RendererConfig,
    entity::Scene,
    fireflies::ParticleField,
    renderer::{
        basic::{BasicRenderer, BasicRendererBuilder},
        fireflies::{FirefliesRenderer, FirefliesRendererBuilder},
        portal::PortalRenderer,
        postprocessing::CopyRenderPass,
        render_target::{RenderTargets, COLOR_TEXTURE_FORMAT, DEPTH_TEXTURE_FORMAT},
        samplers::Samplers,
    },
    window::Size,
};

pub struct Renderer {
    surface: wgpu::Surface,
    surface_configuration: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    sample_count: u32,
    samplers: Samplers,
    render_targets: RenderTargets,
    basic_renderer: BasicRenderer,
    portal_renderer: PortalRenderer,
    fireflies_renderer: FirefliesRenderer,
    copy_pass: CopyRenderPass,
}

impl Renderer {
    pub async fn new(
        window: &winit::window::Window,
        scene: &Scene,
        assets: &SceneAssets,
        field: &ParticleField,
        config: &RendererConfig,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;
        info!("Using adapter {:?}", adapter.get_info());

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .context("No device found")?;

        let surface_size: Size = window.inner_size().into();
        let surface_configuration = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_size.width.max(1),
            height: surface_size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &surface_configuration);

        let sample_count = match config.msaa_samples {
            1 | 4 => config.msaa_samples,
            n => {
                warn!("Unsupported MSAA sample count {}, using 4", n);
                4
            }
        };

        let samplers = Samplers::new(&device);
        let render_targets = RenderTargets::new(&device, scene.viewport.render_size(), sample_count);

        let basic_renderer = BasicRendererBuilder::new(&assets.meshes, &assets.baked_texture)
            .color_target_format(COLOR_TEXTURE_FORMAT)
            .depth_format(DEPTH_TEXTURE_FORMAT)
            .sample_count(sample_count)
            .build(&device, &queue, &samplers)?;

        let portal_renderer = PortalRenderer::new(
            &device,
            &assets.meshes.portal_light,
            COLOR_TEXTURE_FORMAT,
            DEPTH_TEXTURE_FORMAT,
            sample_count,
        );

        let fireflies_renderer = FirefliesRendererBuilder::new(field)
            .color_target_format(COLOR_TEXTURE_FORMAT)
            .depth_format(DEPTH_TEXTURE_FORMAT)
            .sample_count(sample_count)
            .build(&device)?;

        let copy_pass = CopyRenderPass::new(
            &device,
            &samplers,
            &render_targets.color.texture_view,
            surface_format,
        );

        Ok(Self {
            surface,
            surface_configuration,
            device,
            queue,
            sample_count,
            samplers,
            render_targets,
            basic_renderer,
            portal_renderer,
            fireflies_renderer,
            copy_pass,
        })
    }

    /// `surface_size` is the window's physical size; the scene targets follow `render_size`.
    pub fn resize(&mut self, surface_size: Size, render_size: Size) {
        if surface_size.is_empty() || render_size.is_empty() {
            return;
        }
        self.surface_configuration.width = surface_size.width;
        self.surface_configuration.height = surface_size.height;
        self.surface
            .configure(&self.device, &self.surface_configuration);

        self.render_targets = RenderTargets::new(&self.device, render_size, self.sample_count);
        self.copy_pass.set_source(
            &self.device,
            &self.samplers,
            &self.render_targets.color.texture_view,
        );
    }

    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.surface
                    .configure(&self.device, &self.surface_configuration);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next surface texture");
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to get next surface texture"),
        };

        self.basic_renderer.update(&self.queue, scene);
        self.portal_renderer.update(&self.queue, scene);
        self.fireflies_renderer.update(&self.queue, scene);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Command Encoder"),
            });

        {
            let (view, resolve_target) = self.render_targets.color_attachment();
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear_color.to_linear_wgpu()),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.render_targets.depth.texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            self.basic_renderer.draw(&mut rpass);
            self.portal_renderer.draw(&mut rpass);
            // Transparent, so drawn last against the finished depth buffer.
            self.fireflies_renderer.draw(&mut rpass);
        }

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Copy Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            self.copy_pass.draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));

        surface_texture.present();

        Ok(())
    }
}
