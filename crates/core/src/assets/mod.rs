use std::{
    fmt,
    task::{Context, Poll},
};

use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
    task::noop_waker_ref,
    FutureExt,
};
use serde::{Deserialize, Serialize};

use crate::{audio::AudioSink, AnchorFieldError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Model,
    Font,
    Audio,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Model => "model",
            Self::Font => "font",
            Self::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Opaque handle to a loaded 3D model. Parsing belongs to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    pub source: String,
    pub byte_len: usize,
}

impl ModelAsset {
    pub fn new(source: impl Into<String>, byte_len: usize) -> Self {
        Self {
            source: source.into(),
            byte_len,
        }
    }
}

/// Typeface used to build the text decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub source: String,
    pub family: String,
    pub byte_len: usize,
}

impl FontAsset {
    pub fn new(source: impl Into<String>, family: impl Into<String>, byte_len: usize) -> Self {
        Self {
            source: source.into(),
            family: family.into(),
            byte_len,
        }
    }
}

pub enum LoadedAsset {
    Model(ModelAsset),
    Font(FontAsset),
    Audio(Box<dyn AudioSink>),
}

impl fmt::Debug for LoadedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => f.debug_tuple("Model").field(model).finish(),
            Self::Font(font) => f.debug_tuple("Font").field(font).finish(),
            Self::Audio(_) => f.debug_tuple("Audio").finish(),
        }
    }
}

pub type AssetFuture<T> = BoxFuture<'static, Result<T>>;

/// Host-side loaders. Each call starts a load and returns immediately; the
/// returned future resolves once the asset is available or has failed.
pub trait AssetLoader {
    fn load_model(&self, url: &str) -> AssetFuture<ModelAsset>;
    fn load_font(&self, url: &str) -> AssetFuture<FontAsset>;
    fn load_audio(&self, url: &str) -> AssetFuture<Box<dyn AudioSink>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub kind: AssetKind,
    pub url: String,
}

/// Diagnostic record of a load that did not succeed.
#[derive(Debug, Clone)]
pub struct AssetFailure {
    pub request: AssetRequest,
    pub reason: String,
}

type PendingLoad = BoxFuture<'static, (AssetRequest, Result<LoadedAsset>)>;

/// Tracks in-flight loads and what became of them.
///
/// Loads are polled without blocking, once per frame, so the render loop
/// never waits on an asset.
#[derive(Default)]
pub struct AssetStore {
    pending: FuturesUnordered<PendingLoad>,
    requested: Vec<AssetRequest>,
    failures: Vec<AssetFailure>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request<L: AssetLoader + ?Sized>(&mut self, loader: &L, kind: AssetKind, url: &str) {
        let load: BoxFuture<'static, Result<LoadedAsset>> = match kind {
            AssetKind::Model => loader
                .load_model(url)
                .map(|result| result.map(LoadedAsset::Model))
                .boxed(),
            AssetKind::Font => loader
                .load_font(url)
                .map(|result| result.map(LoadedAsset::Font))
                .boxed(),
            AssetKind::Audio => loader
                .load_audio(url)
                .map(|result| result.map(LoadedAsset::Audio))
                .boxed(),
        };

        let request = AssetRequest {
            kind,
            url: url.to_string(),
        };
        let tag = request.clone();
        self.pending.push(load.map(move |result| (tag, result)).boxed());
        self.requested.push(request);
    }

    /// Drains every load that has finished since the last call.
    pub fn poll_completed(&mut self) -> Vec<(AssetRequest, Result<LoadedAsset>)> {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut completed = Vec::new();
        while let Poll::Ready(Some(done)) = self.pending.poll_next_unpin(&mut cx) {
            completed.push(done);
        }
        completed
    }

    pub fn record_failure(&mut self, request: AssetRequest, err: &AnchorFieldError) {
        self.failures.push(AssetFailure {
            request,
            reason: err.to_string(),
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn was_requested(&self, kind: AssetKind) -> bool {
        self.requested.iter().any(|request| request.kind == kind)
    }

    pub fn failures(&self) -> &[AssetFailure] {
        &self.failures
    }
}

impl fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStore")
            .field("pending", &self.pending.len())
            .field("requested", &self.requested)
            .field("failures", &self.failures.len())
            .finish()
    }
}
