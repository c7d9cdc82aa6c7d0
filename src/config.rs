use crate::device::{BackendKind, FocusMode, SimulatedBackend, SimulatedDevice};
use crate::orientation::Facing;
use crate::parameters::{CameraSelector, Gravity, ParameterSet};
use crate::size::Size;
use crate::error::{CameraViewError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CameraViewConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Initial parameters for the camera session
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Which camera to open first ("back" or "front")
    #[serde(default)]
    pub camera: CameraSelector,

    /// Requested capture resolution; largest supported when omitted
    pub capture_resolution: Option<(u32, u32)>,

    /// Initial screen-orientation reading in degrees
    #[serde(default)]
    pub display_orientation: u32,

    #[serde(default = "default_true")]
    pub autofocus: bool,

    #[serde(default = "default_true")]
    pub adjust_view_bounds: bool,

    #[serde(default)]
    pub adjust_vertical: bool,

    /// Preview scale factor; unset when omitted
    pub scale: Option<f32>,

    #[serde(default)]
    pub gravity: Gravity,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    /// Camera API generation to try first
    #[serde(default)]
    pub kind: BackendKind,

    /// Retry on the legacy backend when the advanced one cannot start
    #[serde(default = "default_true")]
    pub fallback_to_legacy: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SimulatorConfig {
    /// Frames per second generated while streaming
    #[serde(default = "default_simulator_fps")]
    pub fps: u32,

    /// Truncate generated frames to this many bytes; full NV21 buffers when omitted
    pub frame_bytes: Option<usize>,

    #[serde(default = "default_simulator_devices")]
    pub devices: Vec<SimulatedDeviceConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SimulatedDeviceConfig {
    pub facing: Facing,

    /// Sensor mounting angle in degrees
    pub orientation: u32,

    #[serde(default = "default_device_sizes")]
    pub capture_sizes: Vec<(u32, u32)>,

    #[serde(default = "default_focus_modes")]
    pub focus_modes: Vec<FocusMode>,

    #[serde(default)]
    pub fail_open: bool,

    #[serde(default)]
    pub rejected_sizes: Vec<(u32, u32)>,

    #[serde(default)]
    pub pause_for_live_changes: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl CameraViewConfig {
    /// Load configuration from a specific file path.
    ///
    /// Environment variables use the `CAMERAVIEW` prefix and `__` between
    /// keys, e.g. `CAMERAVIEW__SESSION__DISPLAY_ORIENTATION=90`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("session.camera", "back")?
            .set_default("session.display_orientation", 0)?
            .set_default("session.autofocus", true)?
            .set_default("session.adjust_view_bounds", true)?
            .set_default("session.adjust_vertical", false)?
            .set_default("backend.kind", "legacy")?
            .set_default("backend.fallback_to_legacy", true)?
            .set_default("simulator.fps", default_simulator_fps() as i64)?
            .set_default("events.capacity", default_event_capacity() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("CAMERAVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: CameraViewConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some((width, height)) = self.session.capture_resolution {
            if width == 0 || height == 0 {
                return Err(CameraViewError::invalid_config(
                    "Capture resolution must be greater than 0",
                ));
            }
        }

        if self.session.display_orientation >= 360 {
            return Err(CameraViewError::invalid_config(
                "Display orientation must be below 360 degrees",
            ));
        }

        if self.simulator.fps == 0 || self.simulator.fps > MAX_SIMULATOR_FPS {
            return Err(CameraViewError::invalid_config(format!(
                "Simulator fps must be between 1 and {}",
                MAX_SIMULATOR_FPS
            )));
        }

        if self.simulator.devices.is_empty() {
            return Err(CameraViewError::invalid_config(
                "At least one simulated device is required",
            ));
        }

        for (index, device) in self.simulator.devices.iter().enumerate() {
            if device.orientation % 90 != 0 || device.orientation >= 360 {
                return Err(CameraViewError::invalid_config(format!(
                    "Simulated device {} orientation must be 0, 90, 180 or 270",
                    index
                )));
            }
            if device
                .capture_sizes
                .iter()
                .any(|&(width, height)| width == 0 || height == 0)
            {
                return Err(CameraViewError::invalid_config(format!(
                    "Simulated device {} has a zero-sized capture size",
                    index
                )));
            }
        }

        if self.events.capacity == 0 {
            return Err(CameraViewError::invalid_config(
                "Event bus capacity must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl SessionConfig {
    /// Parameter set the session is first started with
    pub fn to_parameters(&self) -> ParameterSet {
        let mut parameters = ParameterSet::new();
        parameters
            .set_camera(self.camera)
            .set_capture_size(self.capture_resolution.map(Size::from))
            .set_display_orientation(self.display_orientation)
            .set_autofocus(self.autofocus)
            .set_adjust_view_bounds(self.adjust_view_bounds)
            .set_adjust_vertical(self.adjust_vertical)
            .set_gravity(self.gravity);
        if let Some(scale) = self.scale {
            parameters.set_scale(scale);
        }
        parameters
    }
}

impl SimulatorConfig {
    /// Build a simulated backend of the given kind from this description
    pub fn build_backend(&self, kind: BackendKind) -> SimulatedBackend {
        let devices = self
            .devices
            .iter()
            .map(SimulatedDeviceConfig::to_device)
            .collect();
        let backend = SimulatedBackend::new(kind, devices).with_fps(self.fps);
        match self.frame_bytes {
            Some(bytes) => backend.with_frame_bytes(bytes),
            None => backend,
        }
    }
}

impl SimulatedDeviceConfig {
    fn to_device(&self) -> SimulatedDevice {
        let sizes: Vec<Size> = self.capture_sizes.iter().copied().map(Size::from).collect();
        SimulatedDevice {
            facing: self.facing,
            orientation: self.orientation,
            capture_sizes: sizes.clone(),
            preview_sizes: sizes,
            focus_modes: self.focus_modes.clone(),
            fail_open: self.fail_open,
            rejected_sizes: self.rejected_sizes.iter().copied().map(Size::from).collect(),
            reject_all: false,
            accepted_commit_limit: None,
            pause_for_live_changes: self.pause_for_live_changes,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera: CameraSelector::Back,
            capture_resolution: None,
            display_orientation: 0,
            autofocus: true,
            adjust_view_bounds: true,
            adjust_vertical: false,
            scale: None,
            gravity: Gravity::Center,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Legacy,
            fallback_to_legacy: default_true(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            fps: default_simulator_fps(),
            frame_bytes: None,
            devices: default_simulator_devices(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

/// Upper bound on simulated frame rate
pub const MAX_SIMULATOR_FPS: u32 = 1000;

// Default value functions
fn default_true() -> bool {
    true
}
fn default_simulator_fps() -> u32 {
    30
}
fn default_event_capacity() -> usize {
    64
}
fn default_device_sizes() -> Vec<(u32, u32)> {
    vec![(1920, 1080), (1280, 720), (640, 480)]
}
fn default_focus_modes() -> Vec<FocusMode> {
    vec![FocusMode::ContinuousPicture, FocusMode::Fixed]
}
fn default_simulator_devices() -> Vec<SimulatedDeviceConfig> {
    vec![
        SimulatedDeviceConfig {
            facing: Facing::Back,
            orientation: 90,
            capture_sizes: default_device_sizes(),
            focus_modes: default_focus_modes(),
            fail_open: false,
            rejected_sizes: Vec::new(),
            pause_for_live_changes: false,
        },
        SimulatedDeviceConfig {
            facing: Facing::Front,
            orientation: 270,
            capture_sizes: default_device_sizes(),
            focus_modes: vec![FocusMode::Fixed],
            fail_open: false,
            rejected_sizes: Vec::new(),
            pause_for_live_changes: false,
        },
    ]
}
