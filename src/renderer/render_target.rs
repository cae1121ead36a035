use crate::window::Size;

pub const COLOR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct RenderTarget {
    /// Owns the storage behind `texture_view`.
    _texture: wgpu::Texture,
    pub texture_view: wgpu::TextureView,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: Size,
        sample_count: u32,
    ) -> Self {
        let usage = if sample_count > 1 {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            texture_view,
        }
    }
}

/// Offscreen targets the scene is drawn into before being copied to the surface.
pub struct RenderTargets {
    /// Single-sampled colour, sampled by the copy pass.
    pub color: RenderTarget,
    /// Multisampled colour resolved into `color`; absent without MSAA.
    pub multisampled: Option<RenderTarget>,
    pub depth: RenderTarget,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, size: Size, sample_count: u32) -> Self {
        let color = RenderTarget::new(device, "Color Target Texture", COLOR_TEXTURE_FORMAT, size, 1);
        let multisampled = (sample_count > 1).then(|| {
            RenderTarget::new(
                device,
                "Multisampled Color Target Texture",
                COLOR_TEXTURE_FORMAT,
                size,
                sample_count,
            )
        });
        let depth = RenderTarget::new(
            device,
            "Depth Texture",
            DEPTH_TEXTURE_FORMAT,
            size,
            sample_count,
        );

        Self {
            color,
            multisampled,
            depth,
        }
    }

    /// View to draw into and the view to resolve into, if any.
    pub fn color_attachment(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.multisampled {
            Some(multisampled) => (&multisampled.texture_view, Some(&self.color.texture_view)),
            None => (&self.color.texture_view, None),
        }
    }
}
