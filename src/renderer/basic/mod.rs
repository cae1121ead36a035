use std::mem::size_of;

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::{
    assets::{PortalMeshes, TextureData},
    color::Color,
    entity::Scene,
    renderer::{mesh, mesh::GpuMesh, samplers::Samplers},
};

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    view_proj: Mat4,
    color: Vec4,
}

impl Uniforms {
    fn new(scene: &Scene, color: Color) -> Self {
        Self {
            view_proj: scene.camera.view_projection_matrix(),
            color: color.to_linear_vec4(),
        }
    }
}

/// Unlit material: a colour multiplied by a texture.
struct Material {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Material {
    fn new(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniform Buffer", label)),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self {
            uniform_buffer,
            bind_group,
        }
    }
}

/// Draws the baked-lighting mesh and the two pole lights.
pub struct BasicRenderer {
    baked_mesh: GpuMesh,
    baked_material: Material,
    pole_light_meshes: [GpuMesh; 2],
    pole_light_material: Material,
    render_pipeline: wgpu::RenderPipeline,
}

impl BasicRenderer {
    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        queue.write_buffer(
            &self.baked_material.uniform_buffer,
            0,
            bytes_of(&Uniforms::new(scene, Color::from_u32(0xffffff))),
        );
        queue.write_buffer(
            &self.pole_light_material.uniform_buffer,
            0,
            bytes_of(&Uniforms::new(scene, scene.pole_light_color)),
        );
    }

    pub fn draw<'rpass>(&'rpass self, rpass: &mut wgpu::RenderPass<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);

        rpass.set_bind_group(0, &self.baked_material.bind_group, &[]);
        self.baked_mesh.draw(rpass);

        rpass.set_bind_group(0, &self.pole_light_material.bind_group, &[]);
        for mesh in &self.pole_light_meshes {
            mesh.draw(rpass);
        }
    }
}

pub struct BasicRendererBuilder<'a> {
    meshes: &'a PortalMeshes,
    baked_texture: &'a TextureData,
    color_format: Option<wgpu::TextureFormat>,
    depth_format: Option<wgpu::TextureFormat>,
    sample_count: u32,
}

impl<'a> BasicRendererBuilder<'a> {
    pub fn new(meshes: &'a PortalMeshes, baked_texture: &'a TextureData) -> Self {
        Self {
            meshes,
            baked_texture,
            color_format: None,
            depth_format: None,
            sample_count: 1,
        }
    }

    pub fn color_target_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    pub fn depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        samplers: &Samplers,
    ) -> anyhow::Result<BasicRenderer> {
        let color_format = self
            .color_format
            .ok_or_else(|| anyhow::anyhow!("No color format provided"))?;
        let depth_format = self
            .depth_format
            .ok_or_else(|| anyhow::anyhow!("No depth format provided"))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Basic Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<Uniforms>() as _),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let baked_texture = create_texture(
            device,
            queue,
            "Baked Texture",
            self.baked_texture.width,
            self.baked_texture.height,
            &self.baked_texture.pixels,
        );
        let white_texture = create_texture(device, queue, "White Texture", 1, 1, &[255; 4]);

        let baked_material = Material::new(
            device,
            "Baked Material",
            &bind_group_layout,
            &baked_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            &samplers.bilinear,
        );
        let pole_light_material = Material::new(
            device,
            "Pole Light Material",
            &bind_group_layout,
            &white_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            &samplers.bilinear,
        );

        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("basic.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Basic Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[mesh::vertex_buffer_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[color_format.into()],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                ..Default::default()
            },
            multiview: None,
        });

        Ok(BasicRenderer {
            baked_mesh: GpuMesh::new(device, "Baked", &self.meshes.baked),
            baked_material,
            pole_light_meshes: [
                GpuMesh::new(device, "Pole Light A", &self.meshes.pole_light_a),
                GpuMesh::new(device, "Pole Light B", &self.meshes.pole_light_b),
            ],
            pole_light_material,
            render_pipeline,
        })
    }
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> wgpu::Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        },
        pixels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, window::Viewport};

    #[test]
    fn pole_light_color_is_linear() {
        let scene = Scene::new(&Config::default(), Viewport::new(1280., 720., 1.));
        let uniforms = Uniforms::new(&scene, scene.pole_light_color);
        assert_eq!(uniforms.color, Color::from_u32(0xffffe5).to_linear_vec4());
        assert_eq!(uniforms.view_proj, scene.camera.view_projection_matrix());
    }
}
