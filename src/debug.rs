//! Live tuning of scene parameters from the keyboard.
//!
//! Each control writes straight through to exactly one scene parameter; nothing
//! flows back from the scene into the controls.

use log::info;
use winit::event::VirtualKeyCode;

use crate::{
    color::{Channel, Color},
    entity::Scene,
};

const COLOR_STEP: i16 = 16;
const COARSE_STEPS: f32 = 10.;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    /// Snaps to the nearest step and clamps into range.
    pub fn snap(&self, value: f32) -> f32 {
        let stepped = ((value - self.min) / self.step).round() * self.step + self.min;
        stepped.clamp(self.min, self.max)
    }
}

pub const FIREFLIES_SIZE: Slider = Slider {
    min: 0.,
    max: 500.,
    step: 1.,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorControl {
    PortalColorStart,
    PortalColorEnd,
    ClearColor,
}

impl ColorControl {
    fn target(self, scene: &mut Scene) -> &mut Color {
        match self {
            ColorControl::PortalColorStart => &mut scene.portal.color_start,
            ColorControl::PortalColorEnd => &mut scene.portal.color_end,
            ColorControl::ClearColor => &mut scene.clear_color,
        }
    }

    pub fn get(self, scene: &Scene) -> Color {
        match self {
            ColorControl::PortalColorStart => scene.portal.color_start,
            ColorControl::PortalColorEnd => scene.portal.color_end,
            ColorControl::ClearColor => scene.clear_color,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    Color(ColorControl),
    FirefliesSize,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::Color(ColorControl::PortalColorStart),
        Control::Color(ColorControl::PortalColorEnd),
        Control::Color(ColorControl::ClearColor),
        Control::FirefliesSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Control::Color(ColorControl::PortalColorStart) => "portalColorStart",
            Control::Color(ColorControl::PortalColorEnd) => "portalColorEnd",
            Control::Color(ColorControl::ClearColor) => "clearColor",
            Control::FirefliesSize => "firefliesSize",
        }
    }
}

pub fn set_color(scene: &mut Scene, control: ColorControl, color: Color) {
    *control.target(scene) = color;
    info!("{} = {}", Control::Color(control).name(), color);
}

/// Returns the value actually written after snapping.
pub fn set_fireflies_size(scene: &mut Scene, value: f32) -> f32 {
    let size = FIREFLIES_SIZE.snap(value);
    scene.fireflies.size = size;
    info!("{} = {}", Control::FirefliesSize.name(), size);
    size
}

#[derive(Debug, Clone)]
pub struct DebugPanel {
    selected: usize,
    channel: Channel,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self {
            selected: 0,
            channel: Channel::Red,
        }
    }
}

impl DebugPanel {
    pub fn selected(&self) -> Control {
        Control::ALL[self.selected]
    }

    /// Handles a key press. Returns `true` when the panel or the scene changed.
    pub fn on_key(&mut self, keycode: VirtualKeyCode, scene: &mut Scene) -> bool {
        match keycode {
            VirtualKeyCode::Tab => {
                self.selected = (self.selected + 1) % Control::ALL.len();
                info!("Selected {}", self.selected().name());
                true
            }
            VirtualKeyCode::Left => self.select_channel(self.channel.prev()),
            VirtualKeyCode::Right => self.select_channel(self.channel.next()),
            VirtualKeyCode::Up => self.adjust(scene, 1.),
            VirtualKeyCode::Down => self.adjust(scene, -1.),
            VirtualKeyCode::PageUp => self.adjust(scene, COARSE_STEPS),
            VirtualKeyCode::PageDown => self.adjust(scene, -COARSE_STEPS),
            _ => false,
        }
    }

    fn select_channel(&mut self, channel: Channel) -> bool {
        if !matches!(self.selected(), Control::Color(_)) {
            return false;
        }
        self.channel = channel;
        true
    }

    fn adjust(&self, scene: &mut Scene, steps: f32) -> bool {
        match self.selected() {
            Control::Color(control) => {
                let color = control
                    .get(scene)
                    .offset_channel(self.channel, COLOR_STEP * steps.signum() as i16);
                set_color(scene, control, color);
            }
            Control::FirefliesSize => {
                let size = scene.fireflies.size + steps * FIREFLIES_SIZE.step;
                set_fireflies_size(scene, size);
            }
        }
        true
    }

    /// One-line summary of the selected control, shown in the window title.
    pub fn status(&self, scene: &Scene) -> String {
        match self.selected() {
            Control::Color(control) => format!(
                "{} = {} [{:?}]",
                Control::Color(control).name(),
                control.get(scene),
                self.channel
            ),
            Control::FirefliesSize => format!(
                "{} = {}",
                Control::FirefliesSize.name(),
                scene.fireflies.size
            ),
        }
    }
}
