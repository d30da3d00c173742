use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::{
    capture::{CaptureAdapter, ShareOutcome, ShareSink, Snapshot},
    config::AppConfig,
    placement::PlacementState,
    render::Renderer,
    session::{InputEvent, Session},
    tracking::{AnchorProvider, TrackingGrant},
    Result,
};

/// Source of elapsed session time.
///
/// Time-based animation keys off this rather than the frame counter, so
/// motion looks the same on 30 Hz and 120 Hz displays.
#[derive(Debug, Clone)]
pub enum FrameClock {
    Wall { started: Instant },
    /// Advanced explicitly, for deterministic tests and offline runs.
    Manual { elapsed: Duration },
}

impl FrameClock {
    pub fn start() -> Self {
        Self::Wall {
            started: Instant::now(),
        }
    }

    pub fn manual() -> Self {
        Self::Manual {
            elapsed: Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Wall { started } => started.elapsed(),
            Self::Manual { elapsed } => *elapsed,
        }
    }

    /// Moves a manual clock forward. Wall clocks ignore this.
    pub fn advance(&mut self, delta: Duration) {
        if let Self::Manual { elapsed } = self {
            *elapsed += delta;
        }
    }
}

/// Timing information handed to the particle fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameContext {
    pub frame: u64,
    pub elapsed: Duration,
    pub delta: Duration,
}

/// Which particle fields are stepped each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Only the field belonging to the current phase: ambient while
    /// searching, spiral once placed.
    ActivePhase,
    /// Every field, visible or not.
    #[default]
    AllFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub state: PlacementState,
    pub elapsed: Duration,
    pub assets_completed: usize,
}

/// Host-side frame pump for [`FrameScheduler::run_forever`].
pub trait FrameHost {
    /// Blocks until the next display refresh and returns the input gathered
    /// since the previous one. `None` means the host is tearing down.
    fn next_frame(&mut self) -> Option<Vec<InputEvent>>;
}

/// Per-frame driver: tracking update, simulation, render, in that order.
pub struct FrameScheduler<R, T> {
    session: Session,
    renderer: R,
    tracker: T,
    clock: FrameClock,
    policy: AdvancePolicy,
    capture: CaptureAdapter,
    share: Option<Box<dyn ShareSink>>,
    frame: u64,
    last_elapsed: Duration,
}

impl<R: Renderer, T: AnchorProvider> FrameScheduler<R, T> {
    /// Starts the tracker and wires up the loop. Requires the grant issued by
    /// [`crate::tracking::initialize`].
    pub fn new(
        _grant: TrackingGrant,
        config: &AppConfig,
        session: Session,
        renderer: R,
        mut tracker: T,
    ) -> Result<Self> {
        tracker.start()?;
        info!(policy = ?config.schedule.advance_policy, "tracking started");

        Ok(Self {
            session,
            renderer,
            tracker,
            clock: FrameClock::start(),
            policy: config.schedule.advance_policy,
            capture: CaptureAdapter::new(&config.capture),
            share: None,
            frame: 0,
            last_elapsed: Duration::ZERO,
        })
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.last_elapsed = clock.elapsed();
        self.clock = clock;
        self
    }

    pub fn with_share_sink(mut self, sink: Box<dyn ShareSink>) -> Self {
        self.share = Some(sink);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one frame. A render failure ends the session.
    pub fn tick(&mut self) -> Result<FrameReport> {
        let elapsed = self.clock.elapsed();
        let ctx = FrameContext {
            frame: self.frame,
            elapsed,
            delta: elapsed.saturating_sub(self.last_elapsed),
        };

        let assets_completed = self.session.poll_assets()?;

        let camera = self.tracker.camera_pose();
        self.session.update_camera(camera);
        if self.session.state() == PlacementState::Searching {
            self.session.update_anchor();
        }

        self.session.advance_fields(&ctx, self.policy);

        self.renderer
            .render(self.session.scene(), self.session.camera())?;

        trace!(frame = self.frame, ?elapsed, "frame rendered");
        self.frame += 1;
        self.last_elapsed = elapsed;

        Ok(FrameReport {
            frame: ctx.frame,
            state: self.session.state(),
            elapsed,
            assets_completed,
        })
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::ConfirmPlacement => {
                if !self.session.placement().has_tracked() {
                    let camera = self.tracker.camera_pose();
                    self.session.update_camera(camera);
                }
                self.session.confirm_placement()?;
            }
            InputEvent::Capture => {
                self.capture()?;
            }
        }
        Ok(())
    }

    /// Takes a snapshot from the overview pose and offers it to the share
    /// sink, if one is attached.
    pub fn capture(&mut self) -> Result<Snapshot> {
        let (scene, camera) = self.session.scene_and_camera();
        let snapshot = self.capture.capture(&mut self.renderer, scene, camera)?;

        if let Some(sink) = self.share.as_mut() {
            let request = self.capture.share_request(snapshot.clone());
            match sink.share(&request) {
                Ok(ShareOutcome::Saved) => info!("image was saved"),
                Ok(ShareOutcome::Shared) => info!("share button was pressed"),
                Ok(ShareOutcome::Closed) => info!("share dialog was closed"),
                Err(err) => warn!(%err, "share dialog failed"),
            }
        }
        Ok(snapshot)
    }

    /// Pumps frames until the host tears down. Input is applied before the
    /// frame it arrived ahead of.
    pub fn run_forever<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        while let Some(events) = host.next_frame() {
            for event in events {
                self.handle_input(event)?;
            }
            self.tick()?;
        }
        info!(frames = self.frame, "host ended the session");
        Ok(())
    }
}

impl<R, T> std::fmt::Debug for FrameScheduler<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("session", &self.session)
            .field("clock", &self.clock)
            .field("policy", &self.policy)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use futures::{future, FutureExt};
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{
        assets::{AssetFuture, AssetKind, AssetLoader, FontAsset, ModelAsset},
        audio::AudioSink,
        pose::Pose,
        render::{Camera, FrameImage, HeadlessRenderer},
        scene::{SceneGraph, VisibilityFlags},
        AnchorFieldError,
    };

    struct MissingAssets;

    impl AssetLoader for MissingAssets {
        fn load_model(&self, url: &str) -> AssetFuture<ModelAsset> {
            future::ready(Err(AnchorFieldError::asset_load(AssetKind::Model, url, "404"))).boxed()
        }

        fn load_font(&self, url: &str) -> AssetFuture<FontAsset> {
            future::ready(Err(AnchorFieldError::asset_load(AssetKind::Font, url, "404"))).boxed()
        }

        fn load_audio(&self, url: &str) -> AssetFuture<Box<dyn AudioSink>> {
            future::ready(Err(AnchorFieldError::asset_load(AssetKind::Audio, url, "404"))).boxed()
        }
    }

    struct OrbitingTracker {
        started: bool,
        reads: usize,
    }

    impl AnchorProvider for OrbitingTracker {
        fn start(&mut self) -> Result<()> {
            self.started = true;
            Ok(())
        }

        fn camera_pose(&mut self) -> Pose {
            self.reads += 1;
            let angle = self.reads as f32 * 0.1;
            Pose::new(Vec3::new(angle.sin(), 1.6, angle.cos()), Quat::from_rotation_y(angle))
        }
    }

    struct LostContext;

    impl Renderer for LostContext {
        fn render(&mut self, _scene: &SceneGraph, _camera: &Camera) -> Result<()> {
            Err(AnchorFieldError::Render("context lost".to_string()))
        }

        fn read_pixels(&mut self) -> Result<FrameImage> {
            Ok(FrameImage::blank(1, 1))
        }
    }

    struct ScriptedHost(VecDeque<Vec<InputEvent>>);

    impl FrameHost for ScriptedHost {
        fn next_frame(&mut self) -> Option<Vec<InputEvent>> {
            self.0.pop_front()
        }
    }

    fn small_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.ambient.count = 32;
        config.spiral.count = 32;
        config.render.width = 16;
        config.render.height = 12;
        config
    }

    fn scheduler<R: Renderer>(renderer: R) -> FrameScheduler<R, OrbitingTracker> {
        let config = small_config();
        let session = Session::new(&config, Box::new(MissingAssets));
        let tracker = OrbitingTracker {
            started: false,
            reads: 0,
        };
        FrameScheduler::new(TrackingGrant::for_tests(), &config, session, renderer, tracker)
            .unwrap()
            .with_clock(FrameClock::manual())
    }

    #[test]
    fn construction_starts_the_tracker() {
        let scheduler = scheduler(HeadlessRenderer::new(16, 12));
        assert!(scheduler.tracker().started);
        assert_eq!(scheduler.frame(), 0);
    }

    #[test]
    fn anchor_floats_ahead_of_camera_until_confirmed() {
        let mut scheduler = scheduler(HeadlessRenderer::new(16, 12));

        for _ in 0..3 {
            scheduler.tick().unwrap();
            let session = scheduler.session();
            let expected = session.camera().pose.translated_local(Vec3::new(0.0, 0.0, -5.0));
            assert_eq!(session.scene().anchor(), expected);
        }

        scheduler.handle_input(InputEvent::ConfirmPlacement).unwrap();
        let frozen = scheduler.session().scene().anchor();
        for _ in 0..3 {
            scheduler.tick().unwrap();
            assert_eq!(scheduler.session().scene().anchor(), frozen);
        }
    }

    #[test]
    fn confirming_before_the_first_frame_reads_the_tracker() {
        let mut scheduler = scheduler(HeadlessRenderer::new(16, 12));
        scheduler.handle_input(InputEvent::ConfirmPlacement).unwrap();

        assert_eq!(scheduler.tracker().reads, 1);
        let camera = scheduler.session().camera().pose;
        let expected = camera.translated_local(Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(scheduler.session().scene().anchor(), expected);
        assert_ne!(scheduler.session().scene().anchor(), Pose::IDENTITY);

        scheduler.tick().unwrap();
        assert_eq!(scheduler.session().scene().anchor(), expected);
    }

    #[test]
    fn missing_assets_do_not_stop_the_loop() {
        let mut scheduler = scheduler(HeadlessRenderer::new(16, 12));
        let report = scheduler.tick().unwrap();

        assert_eq!(report.assets_completed, 2);
        assert_eq!(scheduler.session().assets().failures().len(), 2);

        scheduler.handle_input(InputEvent::ConfirmPlacement).unwrap();
        scheduler.tick().unwrap();
        assert_eq!(scheduler.session().visibility(), VisibilityFlags::PLACED);
        assert!(scheduler.session().scene().model().is_none());
        assert!(scheduler.session().scene().text().is_none());
        assert_eq!(scheduler.renderer().stats().frames, 2);
    }

    #[test]
    fn render_failure_is_fatal() {
        let mut scheduler = scheduler(LostContext);
        assert!(matches!(scheduler.tick(), Err(AnchorFieldError::Render(_))));
    }

    #[test]
    fn delta_tracks_the_clock() {
        let mut scheduler = scheduler(HeadlessRenderer::new(16, 12));
        scheduler.clock_mut().advance(Duration::from_millis(40));
        let report = scheduler.tick().unwrap();

        assert_eq!(report.elapsed, Duration::from_millis(40));
        assert_eq!(report.frame, 0);
        assert_eq!(scheduler.frame(), 1);
    }

    #[test]
    fn run_forever_applies_input_then_stops_with_the_host() {
        let mut scheduler = scheduler(HeadlessRenderer::new(16, 12));
        let mut host = ScriptedHost(VecDeque::from(vec![
            vec![],
            vec![InputEvent::ConfirmPlacement],
            vec![InputEvent::Capture, InputEvent::ConfirmPlacement],
            vec![],
        ]));

        scheduler.run_forever(&mut host).unwrap();

        assert_eq!(scheduler.frame(), 4);
        assert_eq!(scheduler.session().state(), PlacementState::Placed);
        // One capture pass on top of four regular frames.
        assert_eq!(scheduler.renderer().stats().frames, 5);
    }
}
