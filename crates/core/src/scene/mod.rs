use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    assets::{FontAsset, ModelAsset},
    config::{AppConfig, SceneConfig, TextConfig},
    particles::{AmbientField, ParticleField, SpiralField},
    pose::{color_from_hex, Pose, Transform},
};

/// Visibility of every toggled entity, captured as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityFlags {
    pub model: bool,
    pub ambient: bool,
    pub spiral: bool,
}

impl VisibilityFlags {
    pub const SEARCHING: Self = Self {
        model: false,
        ambient: true,
        spiral: false,
    };

    pub const PLACED: Self = Self {
        model: true,
        ambient: false,
        spiral: true,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    Directional {
        color: Vec3,
        intensity: f32,
        position: Vec3,
        target: Vec3,
    },
    /// Cone light aimed at the model it is attached to.
    Spot {
        color: Vec3,
        intensity: f32,
        position: Vec3,
        angle: f32,
    },
}

/// The loaded 3D model together with its presentation settings.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub asset: ModelAsset,
    pub transform: Transform,
    pub spot_light: Light,
}

/// Extruded greeting built from a font after placement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDecoration {
    pub content: String,
    pub font_family: String,
    pub size: f32,
    pub depth: f32,
    pub color: Vec3,
    pub transform: Transform,
}

impl TextDecoration {
    pub fn build(font: &FontAsset, config: &TextConfig) -> Self {
        Self {
            content: config.content.clone(),
            font_family: font.family.clone(),
            size: config.size,
            depth: config.depth,
            color: color_from_hex(config.color),
            transform: Transform {
                translation: config.position,
                scale: Vec3::splat(config.scale),
                ..Default::default()
            },
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines().map(str::trim)
    }
}

/// Everything parented to the anchor, plus the anchor pose itself.
///
/// The model and text slots stay empty until their assets arrive, and the
/// render loop runs happily either way.
#[derive(Debug)]
pub struct SceneGraph {
    anchor: Pose,
    ambient: AmbientField,
    spiral: SpiralField,
    model: Option<ModelNode>,
    model_visible: bool,
    text: Option<TextDecoration>,
    lights: Vec<Light>,
    config: SceneConfig,
}

impl SceneGraph {
    pub fn new(config: &AppConfig) -> Self {
        let ambient = AmbientField::new(&config.ambient);
        let spiral = SpiralField::new(&config.spiral);
        Self::with_fields(ambient, spiral, config.scene.clone())
    }

    /// Builds a scene around pre-seeded fields.
    pub fn with_fields(mut ambient: AmbientField, mut spiral: SpiralField, config: SceneConfig) -> Self {
        ambient.set_visible(VisibilityFlags::SEARCHING.ambient);
        spiral.set_visible(VisibilityFlags::SEARCHING.spiral);

        Self {
            anchor: Pose::IDENTITY,
            ambient,
            spiral,
            model: None,
            model_visible: VisibilityFlags::SEARCHING.model,
            text: None,
            lights: vec![
                Light::Directional {
                    color: Vec3::ONE,
                    intensity: 0.8,
                    position: Vec3::new(0.0, 5.0, 0.0),
                    target: Vec3::ZERO,
                },
                Light::Ambient {
                    color: Vec3::ONE,
                    intensity: 0.4,
                },
            ],
            config,
        }
    }

    pub fn anchor(&self) -> Pose {
        self.anchor
    }

    pub fn set_anchor(&mut self, pose: Pose) {
        self.anchor = pose;
    }

    pub fn ambient(&self) -> &AmbientField {
        &self.ambient
    }

    pub fn ambient_mut(&mut self) -> &mut AmbientField {
        &mut self.ambient
    }

    pub fn spiral(&self) -> &SpiralField {
        &self.spiral
    }

    pub fn spiral_mut(&mut self) -> &mut SpiralField {
        &mut self.spiral
    }

    pub fn fields(&self) -> [&dyn ParticleField; 2] {
        [&self.ambient, &self.spiral]
    }

    pub fn model(&self) -> Option<&ModelNode> {
        self.model.as_ref()
    }

    pub fn text(&self) -> Option<&TextDecoration> {
        self.text.as_ref()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn visibility(&self) -> VisibilityFlags {
        VisibilityFlags {
            model: self.model_visible,
            ambient: self.ambient.is_visible(),
            spiral: self.spiral.is_visible(),
        }
    }

    /// Whether a model is both loaded and switched on.
    pub fn model_shown(&self) -> bool {
        self.model_visible && self.model.is_some()
    }

    pub fn apply_visibility(&mut self, flags: VisibilityFlags) {
        self.model_visible = flags.model;
        self.ambient.set_visible(flags.ambient);
        self.spiral.set_visible(flags.spiral);
    }

    /// Attaches the loaded model with its scale and spot light. Visibility is
    /// left to the placement flags.
    pub fn attach_model(&mut self, asset: ModelAsset) {
        self.model = Some(ModelNode {
            asset,
            transform: Transform {
                scale: self.config.model_scale,
                ..Default::default()
            },
            spot_light: Light::Spot {
                color: Vec3::ONE,
                intensity: 2.0,
                position: Vec3::new(0.0, 3.0, 0.0),
                angle: PI / 8.0,
            },
        });
    }

    pub fn attach_text(&mut self, font: &FontAsset) {
        self.text = Some(TextDecoration::build(font, &self.config.text));
    }
}
