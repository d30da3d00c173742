use base64::Engine;
use glam::Vec3;
use image::{codecs::jpeg::JpegEncoder, ColorType};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{CaptureConfig, ShareLabels},
    pose::Pose,
    render::{Camera, FrameImage, Renderer},
    scene::SceneGraph,
    AnchorFieldError, Result,
};

/// Encoded still taken from the overview vantage point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl Snapshot {
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.jpeg);
        format!("data:image/jpeg;base64,{encoded}")
    }
}

/// Everything the external sharing dialog needs for one snapshot.
#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub snapshot: Snapshot,
    pub labels: ShareLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareOutcome {
    Saved,
    Shared,
    Closed,
}

/// External sharing UI.
pub trait ShareSink {
    fn share(&mut self, request: &ShareRequest) -> Result<ShareOutcome>;
}

/// Renders one extra frame from a fixed overview pose and hands the result
/// to the share dialog. The main loop's camera is left exactly as found.
#[derive(Debug, Clone)]
pub struct CaptureAdapter {
    overview: Pose,
    quality: u8,
    labels: ShareLabels,
}

impl CaptureAdapter {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            overview: Pose::look_at(config.overview_position, config.overview_target, Vec3::Y),
            quality: config.jpeg_quality.clamp(1, 100),
            labels: config.share.clone(),
        }
    }

    pub fn overview(&self) -> Pose {
        self.overview
    }

    /// Moves `camera` to the overview pose, renders and reads back one frame,
    /// then restores the camera before encoding. Restoration happens even
    /// when the render fails.
    pub fn capture<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        scene: &SceneGraph,
        camera: &mut Camera,
    ) -> Result<Snapshot> {
        let saved = *camera;
        camera.pose = self.overview;

        let frame = renderer
            .render(scene, camera)
            .and_then(|()| renderer.read_pixels());

        *camera = saved;
        self.encode(&frame?)
    }

    pub fn share_request(&self, snapshot: Snapshot) -> ShareRequest {
        ShareRequest {
            snapshot,
            labels: self.labels.clone(),
        }
    }

    pub fn encode(&self, frame: &FrameImage) -> Result<Snapshot> {
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.rgb.len() != expected {
            return Err(AnchorFieldError::Capture(format!(
                "surface holds {} bytes, expected {expected}",
                frame.rgb.len()
            )));
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode(
            &frame.rgb,
            frame.width,
            frame.height,
            ColorType::Rgb8,
        )?;

        info!(
            width = frame.width,
            height = frame.height,
            bytes = jpeg.len(),
            "snapshot encoded"
        );
        Ok(Snapshot {
            width: frame.width,
            height: frame.height,
            jpeg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, render::HeadlessRenderer};
    use glam::Quat;

    struct BrokenRenderer;

    impl Renderer for BrokenRenderer {
        fn render(&mut self, _scene: &SceneGraph, _camera: &Camera) -> Result<()> {
            Err(AnchorFieldError::Render("context lost".to_string()))
        }

        fn read_pixels(&mut self) -> Result<FrameImage> {
            Ok(FrameImage::blank(1, 1))
        }
    }

    fn scene() -> SceneGraph {
        let mut config = AppConfig::default();
        config.ambient.count = 32;
        config.spiral.count = 32;
        SceneGraph::new(&config)
    }

    #[test]
    fn produces_a_jpeg_and_restores_the_camera() {
        let adapter = CaptureAdapter::new(&CaptureConfig::default());
        let mut renderer = HeadlessRenderer::new(32, 24);
        let mut camera = Camera::new(60.0);
        camera.pose = Pose::new(Vec3::new(0.3, 1.7, -0.2), Quat::from_rotation_y(0.42));
        let before = camera;

        let snapshot = adapter.capture(&mut renderer, &scene(), &mut camera).unwrap();

        assert_eq!(camera, before);
        assert_eq!((snapshot.width, snapshot.height), (32, 24));
        assert_eq!(&snapshot.jpeg[..2], &[0xff, 0xd8]);
        assert!(snapshot.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn failed_render_still_restores_the_camera() {
        let adapter = CaptureAdapter::new(&CaptureConfig::default());
        let mut camera = Camera::new(45.0);
        camera.pose.position = Vec3::new(9.0, 8.0, 7.0);
        let before = camera;

        let err = adapter
            .capture(&mut BrokenRenderer, &scene(), &mut camera)
            .unwrap_err();

        assert!(matches!(err, AnchorFieldError::Render(_)));
        assert_eq!(camera, before);
    }

    #[test]
    fn rejects_truncated_surfaces() {
        let adapter = CaptureAdapter::new(&CaptureConfig::default());
        let frame = FrameImage {
            width: 4,
            height: 4,
            rgb: vec![0; 5],
        };
        assert!(matches!(adapter.encode(&frame), Err(AnchorFieldError::Capture(_))));
    }
}
