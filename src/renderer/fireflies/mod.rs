use std::mem::size_of;

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::{const_vec3, vec2, Mat4, Vec2, Vec3};
use log::info;
use wgpu::util::DeviceExt;

use crate::{
    entity::Scene,
    fireflies::{FireflyInstance, ParticleField},
};

const QUAD_VERTICES: [Vec3; 4] = [
    const_vec3!([-0.5, -0.5, 0.]),
    const_vec3!([-0.5, 0.5, 0.]),
    const_vec3!([0.5, -0.5, 0.]),
    const_vec3!([0.5, 0.5, 0.]),
];
const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32];

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    v_mat: Mat4,
    p_mat: Mat4,
    resolution: Vec2,
    time: f32,
    pixel_ratio: f32,
    size: f32,
    _pad0: [f32; 3],
}

impl Uniforms {
    fn new(scene: &Scene) -> Self {
        let Scene {
            camera,
            viewport,
            fireflies,
            ..
        } = scene;

        let render_size = viewport.render_size();

        Self {
            v_mat: camera.view_matrix(),
            p_mat: camera.projection_matrix(),
            resolution: vec2(render_size.width as f32, render_size.height as f32),
            time: fireflies.time,
            pixel_ratio: fireflies.pixel_ratio,
            size: fireflies.size,
            ..Default::default()
        }
    }
}

/// Camera-facing additive quads, one instance per firefly.
pub struct FirefliesRenderer {
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    bind_group: wgpu::BindGroup,
    render_pipeline: wgpu::RenderPipeline,
}

impl FirefliesRenderer {
    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&Uniforms::new(scene)));
    }

    pub fn draw<'rpass>(&'rpass self, rpass: &mut wgpu::RenderPass<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..(QUAD_INDICES.len() as _), 0, 0..self.instance_count);
    }
}

pub struct FirefliesRendererBuilder<'a> {
    field: &'a ParticleField,
    color_format: Option<wgpu::TextureFormat>,
    depth_format: Option<wgpu::TextureFormat>,
    sample_count: u32,
}

impl<'a> FirefliesRendererBuilder<'a> {
    pub fn new(field: &'a ParticleField) -> Self {
        Self {
            field,
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

    pub fn build(self, device: &wgpu::Device) -> anyhow::Result<FirefliesRenderer> {
        let color_format = self
            .color_format
            .ok_or_else(|| anyhow::anyhow!("No color format provided"))?;
        let depth_format = self
            .depth_format
            .ok_or_else(|| anyhow::anyhow!("No depth format provided"))?;

        if self.field.is_empty() {
            anyhow::bail!("No fireflies to draw");
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Firefly Vertex Buffer"),
            contents: bytes_of(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Firefly Index Buffer"),
            contents: bytes_of(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instances: Vec<FireflyInstance> = self.field.instances().collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Firefly Instance Buffer"),
            contents: cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_count = instances.len() as u32;
        info!("Uploaded {} fireflies", instance_count);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Firefly Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<Uniforms>() as _),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("fireflies.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Firefly Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: size_of::<Vec3>() as _,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: size_of::<FireflyInstance>() as _,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[wgpu::ColorTargetState {
                    format: color_format,
                    // Additive: each firefly brightens whatever is behind it.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                }],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
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

        Ok(FirefliesRenderer {
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            instance_count,
            bind_group,
            render_pipeline,
        })
    }
}
