use std::{ops::Range, time::SystemTime};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use log::info;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;

use crate::error::SceneError;

pub const HORIZONTAL_RANGE: Range<f32> = -2.0..2.0;
pub const VERTICAL_RANGE: Range<f32> = 0.0..2.0;
pub const SCALE_RANGE: Range<f32> = 0.0..1.0;

/// Per-particle vertex data as consumed by the firefly pipeline.
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct FireflyInstance {
    pub position: Vec3,
    pub scale: f32,
}

/// Positions (xyz interleaved) and scales of a fixed-size point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<f32>,
    scales: Vec<f32>,
}

impl ParticleField {
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn instances(&self) -> impl Iterator<Item = FireflyInstance> + '_ {
        self.positions()
            .chunks_exact(3)
            .zip(self.scales())
            .map(|(p, &scale)| FireflyInstance {
                position: Vec3::new(p[0], p[1], p[2]),
                scale,
            })
    }
}

pub fn generate<R>(count: usize, rng: &mut R) -> Result<ParticleField, SceneError>
where
    R: Rng + ?Sized,
{
    if count == 0 {
        return Err(SceneError::InvalidArgument(
            "firefly count must be positive".to_owned(),
        ));
    }

    let mut positions = Vec::with_capacity(count * 3);
    let mut scales = Vec::with_capacity(count);
    for _ in 0..count {
        positions.push(rng.gen_range(HORIZONTAL_RANGE));
        positions.push(rng.gen_range(VERTICAL_RANGE));
        positions.push(rng.gen_range(HORIZONTAL_RANGE));
        scales.push(rng.gen_range(SCALE_RANGE));
    }

    Ok(ParticleField { positions, scales })
}

/// RNG seeded from the wall clock, so every run scatters the fireflies differently.
pub fn seeded_rng() -> Pcg64Mcg {
    let rand_seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    info!("Seeded RNG with {}", rand_seed);
    Pcg64Mcg::seed_from_u64(rand_seed)
}
