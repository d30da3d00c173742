use crate::assets::AssetKind;

/// Result alias that carries the custom [`AnchorFieldError`] type.
pub type Result<T> = std::result::Result<T, AnchorFieldError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum AnchorFieldError {
    /// Free-form message for failures raised by host collaborators.
    #[error("{0}")]
    Message(String),
    /// The host cannot provide camera access or world tracking at all.
    /// Raised before any core component is constructed.
    #[error("this environment does not support instant world tracking")]
    UnsupportedEnvironment,
    /// Camera or motion access was refused. The AR experience never starts,
    /// but the process keeps running.
    #[error("camera or motion permission was denied")]
    PermissionDenied,
    /// A model, font or audio asset could not be loaded. Recoverable: the
    /// associated visual or sound is simply omitted.
    #[error("failed to load {kind} asset `{url}`: {reason}")]
    AssetLoad {
        kind: AssetKind,
        url: String,
        reason: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl AnchorFieldError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Builds an [`AnchorFieldError::AssetLoad`] for the given asset.
    pub fn asset_load(kind: AssetKind, url: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            kind,
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for errors that end the AR experience rather than
    /// degrading it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AssetLoad { .. })
    }
}

impl From<&str> for AnchorFieldError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for AnchorFieldError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
