use std::{fmt, str::FromStr};

use glam::{vec4, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub fn next(self) -> Self {
        match self {
            Channel::Red => Channel::Green,
            Channel::Green => Channel::Blue,
            Channel::Blue => Channel::Red,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Channel::Red => Channel::Blue,
            Channel::Green => Channel::Red,
            Channel::Blue => Channel::Green,
        }
    }
}

impl Color {
    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: (hex >> 16) as u8,
            g: (hex >> 8) as u8,
            b: hex as u8,
        }
    }

    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| ConfigError::InvalidColor(s.to_owned()))?;
        let hex =
            u32::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidColor(s.to_owned()))?;
        Ok(Self::from_u32(hex))
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    /// Shifts one channel by `delta`, saturating at 0 and 255.
    pub fn offset_channel(self, channel: Channel, delta: i16) -> Self {
        let shift = |v: u8| (v as i16 + delta).clamp(0, 255) as u8;
        let mut color = self;
        match channel {
            Channel::Red => color.r = shift(color.r),
            Channel::Green => color.g = shift(color.g),
            Channel::Blue => color.b = shift(color.b),
        }
        color
    }

    /// Linear channel values for shader uniforms written into an sRGB target.
    pub fn to_linear_vec4(self) -> Vec4 {
        vec4(
            srgb_to_linear(self.r) as f32,
            srgb_to_linear(self.g) as f32,
            srgb_to_linear(self.b) as f32,
            1.,
        )
    }

    /// Decodes the sRGB channel values into a linear clear colour.
    pub fn to_linear_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: srgb_to_linear(self.r),
            g: srgb_to_linear(self.g),
            b: srgb_to_linear(self.b),
            a: 1.,
        }
    }
}

fn srgb_to_linear(v: u8) -> f64 {
    let c = v as f64 / 255.;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Inverse of the decode an sRGB render target applies on write.
#[cfg(test)]
pub(crate) fn linear_to_srgb(c: f32) -> u8 {
    let v = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1. / 2.4) - 0.055
    };
    (v.clamp(0., 1.) * 255.).round() as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
