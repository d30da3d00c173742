use std::f64::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng;

use super::{field_rng, FieldKind, ParticleBuffer, ParticleField};
use crate::{
    config::SpiralFieldConfig,
    pose::{color_from_hex, Transform},
    timeline::FrameContext,
};

/// Single-colour spiral galaxy. Positions are seeded once; animation only
/// moves the field as a rigid body.
#[derive(Debug, Clone)]
pub struct SpiralField {
    buffer: ParticleBuffer,
    tilt: f32,
    scale: Vec3,
    spin_rate: f32,
    orbit_radius: f32,
    orbit_rate: f32,
    point_size: f32,
    transform: Transform,
    visible: bool,
}

impl SpiralField {
    pub fn new(config: &SpiralFieldConfig) -> Self {
        let mut rng = field_rng(config.seed);
        let color = color_from_hex(config.color);
        let mut buffer = ParticleBuffer::with_capacity(config.count);

        let last = config.count.saturating_sub(1).max(1) as f32;
        for index in 0..config.count {
            let t = index as f32 / last;
            let depth = (rng.gen::<f32>() - 0.5) * 2.0 * config.depth_jitter;
            buffer.push(spiral_point(t, config.turns, depth), color);
        }

        let mut field = Self {
            buffer,
            tilt: config.tilt,
            scale: config.scale,
            spin_rate: config.spin_rate,
            orbit_radius: config.orbit_radius,
            orbit_rate: config.orbit_rate,
            point_size: config.point_size,
            transform: Transform::default(),
            visible: false,
        };
        field.transform = field.transform_at(0.0);
        field
    }

    /// Rigid transform after `seconds` of wall-clock time.
    pub fn transform_at(&self, seconds: f64) -> Transform {
        let spin = (self.spin_rate as f64 * seconds).rem_euclid(TAU) as f32;
        let orbit = (self.orbit_rate as f64 * seconds).rem_euclid(TAU) as f32;

        Transform {
            translation: Vec3::new(
                self.orbit_radius * orbit.cos(),
                0.0,
                self.orbit_radius * orbit.sin(),
            ),
            rotation: Quat::from_rotation_x(self.tilt) * Quat::from_rotation_z(spin),
            scale: self.scale,
        }
    }
}

/// Point at normalised index `t`: radius `t`, angle `turns * t`.
pub(crate) fn spiral_point(t: f32, turns: f32, depth: f32) -> Vec3 {
    let theta = turns * t;
    Vec3::new(t * theta.cos(), t * theta.sin(), depth)
}

impl ParticleField for SpiralField {
    fn kind(&self) -> FieldKind {
        FieldKind::Spiral
    }

    fn advance(&mut self, ctx: &FrameContext) {
        self.transform = self.transform_at(ctx.elapsed.as_secs_f64());
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
        self.transform
    }

    fn point_size(&self) -> f32 {
        self.point_size
    }
}
