use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    assets::{AssetKind, AssetLoader, AssetStore, LoadedAsset},
    audio::SharedAudioHandle,
    config::AppConfig,
    particles::ParticleField,
    placement::{PlacementController, PlacementState},
    pose::Pose,
    render::Camera,
    scene::{SceneGraph, VisibilityFlags},
    timeline::{AdvancePolicy, FrameContext},
    AnchorFieldError, Result,
};

/// Discrete user input delivered between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Tap-to-place. Only the first one has any effect.
    ConfirmPlacement,
    /// Snapshot-and-share. Repeatable.
    Capture,
}

/// All mutable state of one AR session.
pub struct Session {
    placement: PlacementController,
    scene: SceneGraph,
    camera: Camera,
    audio: SharedAudioHandle,
    assets: AssetStore,
    loader: Box<dyn AssetLoader>,
    font_url: Option<String>,
}

impl Session {
    /// Builds the scene from `config` and starts loading the model and the
    /// soundtrack.
    pub fn new(config: &AppConfig, loader: Box<dyn AssetLoader>) -> Self {
        Self::with_scene(config, SceneGraph::new(config), loader)
    }

    pub fn with_scene(config: &AppConfig, scene: SceneGraph, loader: Box<dyn AssetLoader>) -> Self {
        let mut session = Self {
            placement: PlacementController::new(config.placement.anchor_offset),
            scene,
            camera: Camera::new(config.render.fov_y_degrees),
            audio: SharedAudioHandle::new(),
            assets: AssetStore::new(),
            loader,
            font_url: config.assets.font_url.clone(),
        };

        if let Some(url) = &config.assets.model_url {
            session.assets.request(session.loader.as_ref(), AssetKind::Model, url);
        }
        if let Some(url) = &config.assets.audio_url {
            session.assets.request(session.loader.as_ref(), AssetKind::Audio, url);
        }
        session
    }

    pub fn state(&self) -> PlacementState {
        self.placement.state()
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn audio(&self) -> &SharedAudioHandle {
        &self.audio
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn visibility(&self) -> VisibilityFlags {
        self.scene.visibility()
    }

    pub(crate) fn scene_and_camera(&mut self) -> (&SceneGraph, &mut Camera) {
        (&self.scene, &mut self.camera)
    }

    pub fn update_camera(&mut self, pose: Pose) {
        self.camera.pose = pose;
    }

    /// Re-anchors the scene in front of the camera while searching. Once
    /// placed this leaves the anchor untouched.
    pub fn update_anchor(&mut self) -> Pose {
        if self.placement.state() == PlacementState::Searching {
            let anchor = self.placement.tick(self.camera.pose);
            self.scene.set_anchor(anchor);
        }
        self.scene.anchor()
    }

    /// Locks the anchor where it is and switches the scene to its placed
    /// look. Returns `Ok(false)` for repeated confirmations, which change
    /// nothing. Confirming before any frame anchors in front of the current
    /// camera pose.
    pub fn confirm_placement(&mut self) -> Result<bool> {
        if !self.placement.confirm_from(self.camera.pose) {
            debug!("placement already confirmed; ignoring");
            return Ok(false);
        }

        let anchor = self.placement.anchor();
        self.scene.set_anchor(anchor);
        self.scene.apply_visibility(VisibilityFlags::PLACED);
        self.audio.start()?;

        if let Some(url) = &self.font_url {
            self.assets.request(self.loader.as_ref(), AssetKind::Font, url);
        }

        info!(position = ?anchor.position, "placement confirmed");
        Ok(true)
    }

    /// Applies every asset load that finished since the last frame. Failed
    /// loads are logged and recorded; the scene simply goes without them.
    pub fn poll_assets(&mut self) -> Result<usize> {
        let completed = self.assets.poll_completed();
        let count = completed.len();

        for (request, result) in completed {
            match result {
                Ok(LoadedAsset::Model(model)) => {
                    debug!(url = %request.url, "model loaded");
                    self.scene.attach_model(model);
                }
                Ok(LoadedAsset::Font(font)) => {
                    debug!(url = %request.url, "font loaded");
                    self.scene.attach_text(&font);
                }
                Ok(LoadedAsset::Audio(sink)) => {
                    debug!(url = %request.url, "audio loaded");
                    self.audio.attach(sink)?;
                }
                Err(err) => {
                    let err = match err {
                        err @ AnchorFieldError::AssetLoad { .. } => err,
                        other => AnchorFieldError::asset_load(request.kind, &request.url, other),
                    };
                    warn!(%err, "continuing without asset");
                    self.assets.record_failure(request, &err);
                }
            }
        }
        Ok(count)
    }

    /// Steps the particle fields. With [`AdvancePolicy::ActivePhase`] only
    /// the field belonging to the current phase moves.
    pub fn advance_fields(&mut self, ctx: &FrameContext, policy: AdvancePolicy) {
        let placed = self.placement.is_placed();
        match policy {
            AdvancePolicy::ActivePhase if placed => self.scene.spiral_mut().advance(ctx),
            AdvancePolicy::ActivePhase => self.scene.ambient_mut().advance(ctx),
            AdvancePolicy::AllFields => {
                self.scene.ambient_mut().advance(ctx);
                self.scene.spiral_mut().advance(ctx);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("placement", &self.placement)
            .field("scene", &self.scene)
            .field("camera", &self.camera)
            .field("assets", &self.assets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use futures::{future, FutureExt};
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{
        assets::{AssetFuture, FontAsset, ModelAsset},
        audio::{tests::CountingSink, AudioSink},
    };

    struct FakeLoader {
        plays: Arc<AtomicUsize>,
        fail_font: bool,
    }

    impl AssetLoader for FakeLoader {
        fn load_model(&self, url: &str) -> AssetFuture<ModelAsset> {
            future::ready(Ok(ModelAsset::new(url, 2048))).boxed()
        }

        fn load_font(&self, url: &str) -> AssetFuture<FontAsset> {
            let result = if self.fail_font {
                Err(AnchorFieldError::msg("font server unreachable"))
            } else {
                Ok(FontAsset::new(url, "helvetiker", 512))
            };
            future::ready(result).boxed()
        }

        fn load_audio(&self, _url: &str) -> AssetFuture<Box<dyn AudioSink>> {
            let sink: Box<dyn AudioSink> = Box::new(CountingSink(self.plays.clone()));
            future::ready(Ok(sink)).boxed()
        }
    }

    fn session(fail_font: bool) -> (Session, Arc<AtomicUsize>) {
        let mut config = AppConfig::default();
        config.ambient.count = 16;
        config.spiral.count = 16;
        let plays = Arc::new(AtomicUsize::new(0));
        let loader = FakeLoader {
            plays: plays.clone(),
            fail_font,
        };
        (Session::new(&config, Box::new(loader)), plays)
    }

    #[test]
    fn confirmation_flips_visibility_and_starts_audio_once() {
        let (mut session, plays) = session(false);
        session.poll_assets().unwrap();
        assert_eq!(session.visibility(), VisibilityFlags::SEARCHING);

        assert!(session.confirm_placement().unwrap());
        assert!(!session.confirm_placement().unwrap());

        assert_eq!(session.state(), PlacementState::Placed);
        assert_eq!(session.visibility(), VisibilityFlags::PLACED);
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn font_loads_only_after_confirmation() {
        let (mut session, _) = session(false);
        session.poll_assets().unwrap();
        assert!(!session.assets().was_requested(AssetKind::Font));

        session.confirm_placement().unwrap();
        session.poll_assets().unwrap();
        assert!(session.scene().text().is_some());
    }

    #[test]
    fn font_failure_leaves_scene_without_text() {
        let (mut session, _) = session(true);
        session.confirm_placement().unwrap();
        session.poll_assets().unwrap();

        assert!(session.scene().text().is_none());
        let failures = session.assets().failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].request.kind, AssetKind::Font);
    }

    #[test]
    fn anchor_freezes_after_confirmation() {
        let (mut session, _) = session(false);
        session.update_camera(Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY));
        let frozen = session.update_anchor();
        assert_eq!(frozen.position, Vec3::new(1.0, 0.0, -5.0));

        session.confirm_placement().unwrap();
        session.update_camera(Pose::new(Vec3::new(-3.0, 2.0, 4.0), Quat::from_rotation_y(1.0)));
        assert_eq!(session.update_anchor(), frozen);
    }

    #[test]
    fn confirming_before_any_frame_anchors_in_front_of_the_camera() {
        let (mut session, _) = session(false);
        session.update_camera(Pose::new(Vec3::new(2.0, 1.0, 0.0), Quat::IDENTITY));

        session.confirm_placement().unwrap();
        assert_eq!(session.scene().anchor().position, Vec3::new(2.0, 1.0, -5.0));
        assert_eq!(session.placement().anchor(), session.scene().anchor());
    }

    #[test]
    fn active_phase_policy_moves_only_the_current_field() {
        let (mut session, _) = session(false);
        let spiral_before = session.scene().spiral().transform();
        let ctx = FrameContext {
            frame: 1,
            elapsed: Duration::from_millis(500),
            delta: Duration::from_millis(16),
        };

        session.advance_fields(&ctx, AdvancePolicy::ActivePhase);
        assert_eq!(session.scene().spiral().transform(), spiral_before);

        session.advance_fields(&ctx, AdvancePolicy::AllFields);
        assert_ne!(session.scene().spiral().transform(), spiral_before);
    }
}
