use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// Placement phase of a session. The only transition is
/// `Searching -> Placed`, and it happens at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementState {
    /// The anchor floats at a fixed offset in front of the camera.
    Searching,
    /// The anchor is frozen where the user confirmed it.
    Placed,
}

/// Decides each frame whether the anchor follows the camera or holds still.
#[derive(Debug, Clone)]
pub struct PlacementController {
    state: PlacementState,
    offset: Vec3,
    anchor: Pose,
    tracked: bool,
}

impl PlacementController {
    /// Creates a controller that keeps the anchor at `offset` in the
    /// camera's local frame until confirmation.
    pub fn new(offset: Vec3) -> Self {
        Self {
            state: PlacementState::Searching,
            offset,
            anchor: Pose::IDENTITY,
            tracked: false,
        }
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn is_placed(&self) -> bool {
        self.state == PlacementState::Placed
    }

    /// Last computed (or frozen) anchor pose.
    pub fn anchor(&self) -> Pose {
        self.anchor
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Whether the anchor has been derived from a camera pose at least once.
    pub fn has_tracked(&self) -> bool {
        self.tracked
    }

    /// Recomputes the anchor from the camera while searching; returns the
    /// frozen pose once placed.
    pub fn tick(&mut self, camera: Pose) -> Pose {
        if self.state == PlacementState::Searching {
            self.anchor = camera.translated_local(self.offset);
            self.tracked = true;
        }
        self.anchor
    }

    /// Freezes the anchor at its last computed pose. Returns `true` only for
    /// the call that performed the transition; duplicates are ignored.
    ///
    /// Callers that may confirm before the first [`tick`](Self::tick) should
    /// use [`confirm_from`](Self::confirm_from) instead.
    pub fn confirm(&mut self) -> bool {
        match self.state {
            PlacementState::Searching => {
                self.state = PlacementState::Placed;
                true
            }
            PlacementState::Placed => false,
        }
    }

    /// Like [`confirm`](Self::confirm), but derives the anchor from `camera`
    /// first if no frame has been tracked yet.
    pub fn confirm_from(&mut self, camera: Pose) -> bool {
        if !self.tracked {
            self.tick(camera);
        }
        self.confirm()
    }
}
