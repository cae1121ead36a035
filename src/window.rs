/// Upper bound for the device pixel ratio used when sizing render targets.
pub const MAX_PIXEL_RATIO: f32 = 2.;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Size {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// Output surface dimensions in logical pixels plus the display's pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn from_physical(size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self::new(
            logical.width as f32,
            logical.height as f32,
            scale_factor as f32,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
    }

    /// Size of the offscreen targets the scene is drawn into.
    pub fn render_size(&self) -> Size {
        let pixel_ratio = self.pixel_ratio();
        Size {
            width: ((self.width * pixel_ratio).round() as u32).max(1),
            height: ((self.height * pixel_ratio).round() as u32).max(1),
        }
    }
}
