use crate::size::Size;
use thiserror::Error;

/// Errors raised by camera backends and the session engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("No camera device could be opened (tried {attempted:?}): {details}")]
    DeviceUnavailable {
        attempted: Vec<usize>,
        details: String,
    },

    #[error("Camera rejected configuration at {size}: {details}")]
    ConfigurationRejected { size: Size, details: String },

    #[error("Unsupported drawing target: {kind}")]
    UnsupportedTarget { kind: String },

    #[error("Failed to open camera device {device}: {details}")]
    Open { device: usize, details: String },

    #[error("Failed to commit camera parameters: {details}")]
    Commit { details: String },

    #[error("Preview stream error: {details}")]
    Stream { details: String },

    #[error("Camera device {device} does not exist")]
    InvalidDevice { device: usize },

    #[error("Camera session is not open")]
    NotOpen,
}

impl CameraError {
    /// Whether the error ends the current start attempt.
    ///
    /// `Open` and `Commit` are retried once by the session before being
    /// escalated to `DeviceUnavailable` or `ConfigurationRejected`.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CameraError::Open { .. } | CameraError::Commit { .. })
    }
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event bus closed")]
    ChannelClosed,
}

/// Errors from loading, validating and rendering configuration
#[derive(Error, Debug)]
pub enum CameraViewError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
}

impl CameraViewError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::Config(config::ConfigError::Message(message.into()))
    }
}

pub type Result<T> = std::result::Result<T, CameraViewError>;
