use std::time::Instant;

use anchorfield_core::{
    glam::{Quat, Vec3},
    AnchorProvider, HostEnvironment, Pose, Result,
};

/// Desktop stand-in for a phone browser: support and permission are decided
/// by command line flags.
#[derive(Debug)]
pub struct SimulatedEnvironment {
    supported: bool,
    grant: bool,
}

impl SimulatedEnvironment {
    pub fn new(supported: bool, grant: bool) -> Self {
        Self { supported, grant }
    }
}

impl HostEnvironment for SimulatedEnvironment {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_permission(&mut self) -> bool {
        tracing::info!(granted = self.grant, "camera permission prompt answered");
        self.grant
    }

    fn show_incompatible_ui(&mut self) {
        tracing::error!("this device cannot run the experience; open it in a supported browser");
    }

    fn show_permission_denied_ui(&mut self) {
        tracing::error!("camera access is required; reload and allow access to continue");
    }
}

/// Tracker that imitates a handheld camera gently swaying in place.
#[derive(Debug, Default)]
pub struct SimulatedTracker {
    started: Option<Instant>,
}

impl SimulatedTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnchorProvider for SimulatedTracker {
    fn start(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn camera_pose(&mut self) -> Pose {
        let t = self
            .started
            .map(|started| started.elapsed().as_secs_f32())
            .unwrap_or_default();

        let position = Vec3::new(0.2 * t.sin(), 1.6 + 0.05 * (2.0 * t).sin(), 0.1 * t.cos());
        let orientation = Quat::from_rotation_y(0.3 * (0.5 * t).sin());
        Pose::new(position, orientation)
    }
}
