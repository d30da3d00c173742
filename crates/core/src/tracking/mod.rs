//! Startup gate and the tracking collaborator.
//!
//! A [`TrackingGrant`] can only be obtained through [`initialize`], and the
//! frame scheduler refuses to exist without one. Sessions whose host is
//! unsupported or whose permission prompt was refused therefore never reach
//! code that reads a live camera pose.

use tracing::{info, warn};

use crate::{pose::Pose, AnchorFieldError, Result};

/// Host capabilities consulted once at startup.
pub trait HostEnvironment {
    /// Whether the host can provide camera frames and motion data at all.
    fn is_supported(&self) -> bool;

    /// Runs the one-shot permission prompt and reports the user's answer.
    fn request_permission(&mut self) -> bool;

    /// Shows the remediation screen for unsupported hosts.
    fn show_incompatible_ui(&mut self);

    /// Explains that camera access is required after a refusal.
    fn show_permission_denied_ui(&mut self);
}

/// Source of camera poses estimated from the live video and motion feed.
pub trait AnchorProvider {
    /// Begins tracking. Called once, after permission has been granted.
    fn start(&mut self) -> Result<()>;

    /// Latest world-space camera pose estimate.
    fn camera_pose(&mut self) -> Pose;
}

/// Proof that the environment is supported and the user granted access.
#[derive(Debug)]
pub struct TrackingGrant {
    _private: (),
}

#[cfg(test)]
impl TrackingGrant {
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

/// Runs the startup checks in order: environment support, then permission.
pub fn initialize<E: HostEnvironment + ?Sized>(env: &mut E) -> Result<TrackingGrant> {
    if !env.is_supported() {
        warn!("environment lacks camera or motion support");
        env.show_incompatible_ui();
        return Err(AnchorFieldError::UnsupportedEnvironment);
    }

    if !env.request_permission() {
        warn!("camera permission denied; tracking will not start");
        env.show_permission_denied_ui();
        return Err(AnchorFieldError::PermissionDenied);
    }

    info!("camera permission granted");
    Ok(TrackingGrant { _private: () })
}
