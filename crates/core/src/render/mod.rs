use glam::{Mat4, Vec3};

use crate::{config::RenderConfig, particles::ParticleField, pose::Pose, scene::SceneGraph, Result};

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// Render camera. Each frame its pose comes from the tracker; capture moves
/// it temporarily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    pub fn new(fov_y_degrees: f32) -> Self {
        Self {
            pose: Pose::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.pose.matrix().inverse()
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, NEAR, FAR)
    }
}

/// Tightly packed 8-bit RGB pixels, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl FrameImage {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[offset], self.rgb[offset + 1], self.rgb[offset + 2]]
    }
}

/// Rendering backend abstraction.
pub trait Renderer {
    /// Draws the scene graph as seen from `camera`.
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()>;

    /// Reads back the surface produced by the most recent [`render`](Self::render).
    fn read_pixels(&mut self) -> Result<FrameImage>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub points_drawn: usize,
    pub model_drawn: bool,
    pub text_drawn: bool,
}

/// CPU point splatter used when no GPU backend is attached. Visible particle
/// fields are projected one pixel per point; models and text are only
/// accounted for in [`RenderStats`].
#[derive(Debug)]
pub struct HeadlessRenderer {
    surface: FrameImage,
    stats: RenderStats,
}

impl HeadlessRenderer {
    /// Zero dimensions are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: FrameImage::blank(width.max(1), height.max(1)),
            stats: RenderStats::default(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.width, config.height)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    fn splat(&mut self, field: &dyn ParticleField, view_projection: Mat4, anchor: Mat4) -> usize {
        let width = self.surface.width;
        let height = self.surface.height;
        let mvp = view_projection * anchor * field.transform().matrix();
        let buffer = field.buffer();
        let mut drawn = 0;

        for (position, color) in buffer.positions.iter().zip(&buffer.colors) {
            let Some(ndc) = project(mvp, *position) else {
                continue;
            };
            let x = (((ndc.x + 1.0) * 0.5 * width as f32) as u32).min(width.saturating_sub(1));
            let y = (((1.0 - ndc.y) * 0.5 * height as f32) as u32).min(height.saturating_sub(1));
            let offset = (y as usize * width as usize + x as usize) * 3;
            let rgb = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
            self.surface.rgb[offset] = rgb.x as u8;
            self.surface.rgb[offset + 1] = rgb.y as u8;
            self.surface.rgb[offset + 2] = rgb.z as u8;
            drawn += 1;
        }
        drawn
    }
}

fn project(mvp: Mat4, point: Vec3) -> Option<Vec3> {
    let clip = mvp * point.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let inside = ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0 && (0.0..=1.0).contains(&ndc.z);
    inside.then_some(ndc)
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()> {
        self.surface.rgb.fill(0);

        let aspect = self.surface.width as f32 / self.surface.height as f32;
        let view_projection = camera.projection(aspect) * camera.view_matrix();
        let anchor = scene.anchor().matrix();

        let mut points = 0;
        for field in scene.fields() {
            if field.is_visible() {
                points += self.splat(field, view_projection, anchor);
            }
        }

        self.stats = RenderStats {
            frames: self.stats.frames + 1,
            points_drawn: points,
            model_drawn: scene.model_shown(),
            text_drawn: scene.text().is_some(),
        };
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<FrameImage> {
        Ok(self.surface.clone())
    }
}
