//! Point-cloud simulation.
//!
//! Each field owns a flat buffer allocated once at startup. Fields never
//! allocate or drop particles afterwards; they either recycle positions in
//! place or move the whole cloud as a rigid body.

mod ambient;
mod spiral;

use glam::Vec3;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{pose::Transform, timeline::FrameContext};

pub use ambient::AmbientField;
pub use spiral::SpiralField;

/// Identifies which of the two point clouds a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Ambient,
    Spiral,
}

/// Structure-of-arrays particle storage. A particle is its index.
#[derive(Debug, Clone, Default)]
pub struct ParticleBuffer {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

impl ParticleBuffer {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
        }
    }

    pub fn push(&mut self, position: Vec3, color: Vec3) {
        self.positions.push(position);
        self.colors.push(color);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Shared contract of the particle fields.
pub trait ParticleField {
    fn kind(&self) -> FieldKind;

    /// Steps the simulation for one frame, mutating state in place.
    fn advance(&mut self, ctx: &FrameContext);

    /// Shows or hides the field. Never touches buffers or simulation time.
    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    fn buffer(&self) -> &ParticleBuffer;

    /// Field-wide transform relative to the anchor.
    fn transform(&self) -> Transform;

    fn point_size(&self) -> f32;
}

pub(crate) fn field_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
