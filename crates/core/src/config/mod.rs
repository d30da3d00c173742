use std::{f32::consts::FRAC_PI_2, path::Path};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{timeline::AdvancePolicy, AnchorFieldError, Result};

/// Top-level configuration structure for the application.
///
/// Every section falls back to its defaults, so a config file only needs to
/// mention the values it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub placement: PlacementConfig,
    pub ambient: AmbientFieldConfig,
    pub spiral: SpiralFieldConfig,
    pub scene: SceneConfig,
    pub assets: AssetConfig,
    pub capture: CaptureConfig,
    pub render: RenderConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values that would break the placement or simulation
    /// invariants at runtime.
    pub fn validate(&self) -> Result<()> {
        if !self.placement.anchor_offset.is_finite() {
            return Err(invalid("placement.anchor_offset must be finite"));
        }
        if !(self.ambient.lower_bound < self.ambient.upper_bound) {
            return Err(invalid("ambient.lower_bound must be below ambient.upper_bound"));
        }
        if !(self.ambient.max_step >= 0.0) {
            return Err(invalid("ambient.max_step must not be negative"));
        }
        if !(self.ambient.extent >= 0.0) {
            return Err(invalid("ambient.extent must not be negative"));
        }
        if !(self.ambient.lower_bound.is_finite() && self.ambient.upper_bound.is_finite()) {
            return Err(invalid("ambient bounds must be finite"));
        }
        if !self.spiral.turns.is_finite() || !self.spiral.depth_jitter.is_finite() {
            return Err(invalid("spiral.turns and spiral.depth_jitter must be finite"));
        }
        let motion = [self.spiral.spin_rate, self.spiral.orbit_rate, self.spiral.orbit_radius];
        if !motion.iter().all(|value| value.is_finite()) {
            return Err(invalid("spiral spin_rate, orbit_rate and orbit_radius must be finite"));
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(invalid("capture.jpeg_quality must be within 1..=100"));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid("render surface must be at least one pixel"));
        }
        if !(self.render.fov_y_degrees > 0.0 && self.render.fov_y_degrees < 180.0) {
            return Err(invalid("render.fov_y_degrees must be within (0, 180)"));
        }
        if self.schedule.target_fps == 0 {
            return Err(invalid("schedule.target_fps must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> AnchorFieldError {
    AnchorFieldError::InvalidConfig(reason.to_string())
}

/// Where the anchor floats relative to the live camera while searching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub anchor_offset: Vec3,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            anchor_offset: Vec3::new(0.0, 0.0, -5.0),
        }
    }
}

/// Rising "rain" shown before placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientFieldConfig {
    pub count: usize,
    /// Side length of the seeding cube, centred on the origin.
    pub extent: f32,
    pub lower_bound: f32,
    pub upper_bound: f32,
    /// Exclusive upper limit of the random per-frame rise.
    pub max_step: f32,
    pub point_size: f32,
    pub seed: Option<u64>,
}

impl Default for AmbientFieldConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            extent: 10.0,
            lower_bound: -5.0,
            upper_bound: 5.0,
            max_step: 0.01,
            point_size: 0.006,
            seed: None,
        }
    }
}

/// Spinning galaxy shown after placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralFieldConfig {
    pub count: usize,
    /// Angle gained per unit of the normalised index.
    pub turns: f32,
    /// Half-width of the uniform depth jitter.
    pub depth_jitter: f32,
    pub color: u32,
    pub point_size: f32,
    /// Z-axis spin in radians per second.
    pub spin_rate: f32,
    pub orbit_radius: f32,
    /// Orbital angular speed in radians per second.
    pub orbit_rate: f32,
    /// Fixed tilt about X applied before the spin.
    pub tilt: f32,
    pub scale: Vec3,
    pub seed: Option<u64>,
}

impl Default for SpiralFieldConfig {
    fn default() -> Self {
        Self {
            count: 200_000,
            turns: 50.0,
            depth_jitter: 1.0,
            color: 0xffa500,
            point_size: 0.05,
            spin_rate: 6.0,
            orbit_radius: 2.0,
            orbit_rate: 10.0,
            tilt: FRAC_PI_2,
            scale: Vec3::new(0.5, 0.5, 0.01),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub model_scale: Vec3,
    pub text: TextConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_scale: Vec3::new(0.15, 0.25, 0.25),
            text: TextConfig::default(),
        }
    }
}

/// Greeting built from the font once placement is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub size: f32,
    pub depth: f32,
    pub scale: f32,
    pub position: Vec3,
    pub color: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "FANISKO \n WISHES YOU".to_string(),
            size: 0.2,
            depth: 0.05,
            scale: 0.8,
            position: Vec3::new(-1.0, 2.0, 0.0),
            color: 0xf4a146,
        }
    }
}

/// Asset locations handed to the host loader. `None` skips the load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub model_url: Option<String>,
    pub audio_url: Option<String>,
    pub font_url: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model_url: Some("assets/diwali_3d_poster.glb".to_string()),
            audio_url: Some("assets/music.mp3".to_string()),
            font_url: Some("assets/helvetiker_regular.typeface.json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub overview_position: Vec3,
    pub overview_target: Vec3,
    pub jpeg_quality: u8,
    pub share: ShareLabels,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            overview_position: Vec3::new(0.0, 0.0, 5.0),
            overview_target: Vec3::ZERO,
            jpeg_quality: 80,
            share: ShareLabels::default(),
        }
    }
}

/// Static text passed to the sharing dialog with every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareLabels {
    pub file_name_prepend: String,
    pub share_url: String,
    pub share_title: String,
    pub share_text: String,
    pub save_label: String,
    pub share_label: String,
    pub open_files_hint: String,
    pub tap_and_hold_hint: String,
}

impl Default for ShareLabels {
    fn default() -> Self {
        Self {
            file_name_prepend: "Anchorfield".to_string(),
            share_url: String::new(),
            share_title: "Happy Diwali!".to_string(),
            share_text: "Happy Diwali!".to_string(),
            save_label: "SAVE".to_string(),
            share_label: "SHARE".to_string(),
            open_files_hint: "Now open files app to share".to_string(),
            tap_and_hold_hint: "Tap and hold the image to save to your Photos app".to_string(),
        }
    }
}

/// Surface used by the headless renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fov_y_degrees: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fov_y_degrees: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub advance_policy: AdvancePolicy,
    pub target_fps: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            advance_policy: AdvancePolicy::AllFields,
            target_fps: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "ambient": { "count": 3 }, "schedule": { "advance_policy": "active_phase" } }"#,
        )
        .unwrap();

        assert_eq!(config.ambient.count, 3);
        assert_eq!(config.ambient.upper_bound, 5.0);
        assert_eq!(config.spiral.count, 200_000);
        assert_eq!(config.schedule.advance_policy, AdvancePolicy::ActivePhase);
        assert_eq!(AppConfig::default().schedule.advance_policy, AdvancePolicy::AllFields);
        assert_eq!(config.placement.anchor_offset, Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn defaults_survive_a_json_round_trip() {
        let raw = AppConfig::default().to_json_pretty().unwrap();
        let parsed = AppConfig::from_json_str(&raw).unwrap();
        assert_eq!(parsed.capture.share, ShareLabels::default());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = AppConfig::from_json_str(
            r#"{ "ambient": { "lower_bound": 5.0, "upper_bound": -5.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnchorFieldError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_finite_spiral_motion() {
        let mut config = AppConfig::default();
        config.spiral.orbit_rate = f32::INFINITY;
        assert!(matches!(config.validate(), Err(AnchorFieldError::InvalidConfig(_))));

        let mut config = AppConfig::default();
        config.spiral.spin_rate = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let mut config = AppConfig::default();
        config.capture.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }
}
