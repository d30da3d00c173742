use std::path::{Path, PathBuf};

use anchorfield_core::{
    AnchorFieldError, AssetFuture, AssetKind, AssetLoader, AudioSink, FontAsset, ModelAsset,
    Result,
};
use futures::FutureExt;

/// Loads assets from a local directory using tokio's file APIs. Remote URLs
/// are reported as failures, which the session tolerates.
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, kind: AssetKind, url: &str) -> AssetFuture<(String, Vec<u8>)> {
        let url = url.to_string();
        let path = self.root.join(&url);
        async move {
            if is_remote(&url) {
                return Err(AnchorFieldError::asset_load(
                    kind,
                    url,
                    "remote fetching is not available in the headless host",
                ));
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok((url, bytes)),
                Err(err) => Err(AnchorFieldError::asset_load(kind, url, err)),
            }
        }
        .boxed()
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn font_family(bytes: &[u8], fallback: &Path) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|value| value.get("familyName")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            fallback
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string())
        })
}

impl AssetLoader for FileAssetLoader {
    fn load_model(&self, url: &str) -> AssetFuture<ModelAsset> {
        self.read(AssetKind::Model, url)
            .map(|result| result.map(|(url, bytes)| ModelAsset::new(url, bytes.len())))
            .boxed()
    }

    fn load_font(&self, url: &str) -> AssetFuture<FontAsset> {
        self.read(AssetKind::Font, url)
            .map(|result| {
                result.map(|(url, bytes)| {
                    let family = font_family(&bytes, Path::new(&url));
                    FontAsset::new(url, family, bytes.len())
                })
            })
            .boxed()
    }

    fn load_audio(&self, url: &str) -> AssetFuture<Box<dyn AudioSink>> {
        self.read(AssetKind::Audio, url)
            .map(|result| {
                result.map(|(url, bytes)| {
                    let sink: Box<dyn AudioSink> = Box::new(LoggingAudioSink {
                        source: url,
                        bytes: bytes.len(),
                    });
                    sink
                })
            })
            .boxed()
    }
}

/// Stand-in for a real audio device: reports playback in the log.
#[derive(Debug)]
pub struct LoggingAudioSink {
    source: String,
    bytes: usize,
}

impl AudioSink for LoggingAudioSink {
    fn play(&mut self) -> Result<()> {
        tracing::info!(source = %self.source, bytes = self.bytes, "playing soundtrack");
        Ok(())
    }
}
