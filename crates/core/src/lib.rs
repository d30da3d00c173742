//! Core library for the Anchorfield instant-placement experience.
//!
//! A session anchors a small scene a few metres in front of the camera,
//! lets the user confirm where it should stay, then swaps a rising ambient
//! particle field for a spinning spiral galaxy. Each module owns one piece of
//! that flow (placement, particle simulation, scheduling, capture), while
//! tracking, rendering, audio playback and asset fetching are reached
//! through traits implemented by the host.

pub mod assets;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod particles;
pub mod placement;
pub mod pose;
pub mod render;
pub mod scene;
pub mod session;
pub mod timeline;
pub mod tracking;

pub use glam;

pub use assets::{AssetFuture, AssetKind, AssetLoader, AssetStore, FontAsset, LoadedAsset, ModelAsset};
pub use audio::{AudioSink, SharedAudioHandle};
pub use capture::{CaptureAdapter, ShareOutcome, ShareRequest, ShareSink, Snapshot};
pub use config::AppConfig;
pub use error::{AnchorFieldError, Result};
pub use particles::{AmbientField, FieldKind, ParticleBuffer, ParticleField, SpiralField};
pub use placement::{PlacementController, PlacementState};
pub use pose::{Pose, Transform};
pub use render::{Camera, FrameImage, HeadlessRenderer, RenderStats, Renderer};
pub use scene::{SceneGraph, TextDecoration, VisibilityFlags};
pub use session::{InputEvent, Session};
pub use timeline::{AdvancePolicy, FrameClock, FrameContext, FrameHost, FrameReport, FrameScheduler};
pub use tracking::{initialize, AnchorProvider, HostEnvironment, TrackingGrant};
