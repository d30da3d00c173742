use glam::Vec3;
use rand::{rngs::StdRng, Rng};

use super::{field_rng, FieldKind, ParticleBuffer, ParticleField};
use crate::{config::AmbientFieldConfig, pose::Transform, timeline::FrameContext};

/// Randomly coloured particles drifting upward and wrapping from the top of
/// the volume back to the bottom.
#[derive(Debug, Clone)]
pub struct AmbientField {
    buffer: ParticleBuffer,
    lower: f32,
    upper: f32,
    max_step: f32,
    point_size: f32,
    visible: bool,
    rng: StdRng,
}

impl AmbientField {
    /// Seeds `config.count` particles uniformly across a square of side
    /// `config.extent` centred at the origin, with heights drawn between the
    /// recycling bounds.
    pub fn new(config: &AmbientFieldConfig) -> Self {
        let mut rng = field_rng(config.seed);
        let mut buffer = ParticleBuffer::with_capacity(config.count);
        let span = config.upper_bound - config.lower_bound;

        for _ in 0..config.count {
            let position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * config.extent,
                (config.lower_bound + rng.gen::<f32>() * span).min(config.upper_bound),
                (rng.gen::<f32>() - 0.5) * config.extent,
            );
            let color = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            buffer.push(position, color);
        }

        Self::from_buffer(buffer, config, rng)
    }

    /// Builds a field from explicit positions, each given a random colour.
    pub fn from_positions(positions: &[Vec3], config: &AmbientFieldConfig) -> Self {
        let mut rng = field_rng(config.seed);
        let mut buffer = ParticleBuffer::with_capacity(positions.len());
        for &position in positions {
            buffer.push(position, Vec3::new(rng.gen(), rng.gen(), rng.gen()));
        }
        Self::from_buffer(buffer, config, rng)
    }

    fn from_buffer(buffer: ParticleBuffer, config: &AmbientFieldConfig, rng: StdRng) -> Self {
        Self {
            buffer,
            lower: config.lower_bound,
            upper: config.upper_bound,
            max_step: config.max_step,
            point_size: config.point_size,
            visible: true,
            rng,
        }
    }

    /// Overwrites one particle's position, e.g. to force a recycle.
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if let Some(slot) = self.buffer.positions.get_mut(index) {
            *slot = position;
        }
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.lower, self.upper)
    }
}

impl ParticleField for AmbientField {
    fn kind(&self) -> FieldKind {
        FieldKind::Ambient
    }

    fn advance(&mut self, _ctx: &FrameContext) {
        let rng = &mut self.rng;
        for position in &mut self.buffer.positions {
            position.y += rng.gen::<f32>() * self.max_step;
            if position.y > self.upper {
                position.y = self.lower;
            }
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    fn transform(&self) -> Transform {
        Transform::default()
    }

    fn point_size(&self) -> f32 {
        self.point_size
    }
}
