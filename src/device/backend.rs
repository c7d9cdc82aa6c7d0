use crate::error::CameraError;
use crate::frame::FrameData;
use crate::orientation::Facing;
use crate::size::Size;
use crate::surface::{SurfaceKind, SurfaceOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Camera API generation behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Legacy,
    Advanced,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Legacy => write!(f, "legacy"),
            BackendKind::Advanced => write!(f, "advanced"),
        }
    }
}

/// Fixed properties of one physical sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: usize,
    pub facing: Facing,
    /// Mounting angle in degrees
    pub orientation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    Auto,
    ContinuousPicture,
    ContinuousVideo,
    Fixed,
    Infinity,
    Macro,
    Edof,
}

/// Capability snapshot read once per open
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub capture_sizes: Vec<Size>,
    pub preview_sizes: Vec<Size>,
    pub focus_modes: Vec<FocusMode>,
}

/// The device's working parameter object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareParameters {
    pub preview_size: Option<Size>,
    /// Capture rotation in degrees
    pub rotation: u32,
    pub focus_mode: Option<FocusMode>,
}

/// Properties a device may only change while streaming is paused
#[derive(Debug, Clone, PartialEq)]
pub enum LiveProperty {
    DisplayOrientation,
    PreviewTarget(SurfaceKind),
}

/// Push callback invoked on the device's capture thread
pub type FrameCallback = Arc<dyn Fn(FrameData) + Send + Sync>;

/// Exclusive handle to one opened camera device.
///
/// Dropping the box without calling [`DeviceHandle::release`] leaks the
/// hardware on real backends; the session always releases explicitly.
pub trait DeviceHandle: Send {
    fn info(&self) -> &DeviceInfo;

    fn capabilities(&self) -> Capabilities;

    fn parameters(&self) -> HardwareParameters;

    /// Commit a parameter object to the hardware.
    fn set_parameters(&mut self, parameters: &HardwareParameters) -> Result<(), CameraError>;

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), CameraError>;

    fn bind_surface(&mut self, output: &SurfaceOutput) -> Result<(), CameraError>;

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>);

    fn start_preview(&mut self) -> Result<(), CameraError>;

    fn stop_preview(&mut self);

    fn requires_pause_for(&self, property: &LiveProperty) -> bool;

    fn release(self: Box<Self>);
}

/// Enumerates and opens devices for one camera API.
pub trait CameraBackend: Send {
    fn kind(&self) -> BackendKind;

    fn device_count(&self) -> usize;

    fn device_info(&self, id: usize) -> Result<DeviceInfo, CameraError>;

    fn open(&mut self, id: usize) -> Result<Box<dyn DeviceHandle>, CameraError>;
}
