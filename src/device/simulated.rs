//! In-process camera backend.
//!
//! Behaves like a two-sensor phone camera stack. Every hardware call is
//! recorded in a shared [`SimulatorProbe`], and failures (refused opens,
//! rejected sizes, pause-for-change quirks) are scripted per device.

use super::backend::{
    BackendKind, Capabilities, CameraBackend, DeviceHandle, DeviceInfo, FocusMode, FrameCallback,
    HardwareParameters, LiveProperty,
};
use crate::error::CameraError;
use crate::frame::{nv21_len, FrameData};
use crate::orientation::Facing;
use crate::size::Size;
use crate::surface::{SurfaceKind, SurfaceOutput};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Scripted description of one simulated sensor
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub facing: Facing,
    pub orientation: u32,
    pub capture_sizes: Vec<Size>,
    /// Sizes the device accepts for preview; empty accepts anything
    pub preview_sizes: Vec<Size>,
    pub focus_modes: Vec<FocusMode>,
    pub fail_open: bool,
    pub rejected_sizes: Vec<Size>,
    pub reject_all: bool,
    /// Number of commits accepted per open before every later one is rejected
    pub accepted_commit_limit: Option<usize>,
    /// Streaming must pause for display-orientation and holder rebinds
    pub pause_for_live_changes: bool,
}

impl SimulatedDevice {
    pub fn back() -> Self {
        Self {
            facing: Facing::Back,
            orientation: 90,
            capture_sizes: default_sizes(),
            preview_sizes: default_sizes(),
            focus_modes: vec![
                FocusMode::Auto,
                FocusMode::ContinuousPicture,
                FocusMode::Fixed,
            ],
            fail_open: false,
            rejected_sizes: Vec::new(),
            reject_all: false,
            accepted_commit_limit: None,
            pause_for_live_changes: false,
        }
    }

    pub fn front() -> Self {
        Self {
            facing: Facing::Front,
            orientation: 270,
            focus_modes: vec![FocusMode::Fixed],
            ..Self::back()
        }
    }

    pub fn with_capture_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.capture_sizes = sizes;
        self
    }

    pub fn with_preview_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.preview_sizes = sizes;
        self
    }

    pub fn with_focus_modes(mut self, modes: Vec<FocusMode>) -> Self {
        self.focus_modes = modes;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn rejecting(mut self, size: Size) -> Self {
        self.rejected_sizes.push(size);
        self
    }

    pub fn rejecting_all(mut self) -> Self {
        self.reject_all = true;
        self
    }

    /// Accept the first `count` commits after each open, then reject all.
    pub fn rejecting_after(mut self, count: usize) -> Self {
        self.accepted_commit_limit = Some(count);
        self
    }

    pub fn pausing_for_live_changes(mut self) -> Self {
        self.pause_for_live_changes = true;
        self
    }

    fn accepts(&self, size: Option<Size>) -> bool {
        if self.reject_all {
            return false;
        }
        match size {
            Some(size) => {
                !self.rejected_sizes.contains(&size)
                    && (self.preview_sizes.is_empty() || self.preview_sizes.contains(&size))
            }
            None => true,
        }
    }
}

fn default_sizes() -> Vec<Size> {
    vec![
        Size::new(1920, 1080),
        Size::new(1280, 720),
        Size::new(640, 480),
    ]
}

/// Counters and call history recorded by the simulator
#[derive(Debug, Clone, Default)]
pub struct ProbeSnapshot {
    pub open_attempts: Vec<usize>,
    pub commits: Vec<HardwareParameters>,
    pub rejected_commits: usize,
    pub display_orientations: Vec<u32>,
    pub bindings: Vec<SurfaceOutput>,
    pub preview_starts: usize,
    pub preview_stops: usize,
    pub releases: usize,
    pub live_handles: usize,
    pub max_live_handles: usize,
    pub streaming: bool,
    pub frames_emitted: u64,
}

impl ProbeSnapshot {
    /// Hardware writes that reconfigure an open device
    pub fn reconfigurations(&self) -> usize {
        self.commits.len() + self.display_orientations.len()
    }
}

/// Shared view into the simulator, cloned into every handle
#[derive(Clone, Default)]
pub struct SimulatorProbe {
    state: Arc<Mutex<ProbeSnapshot>>,
    callback: Arc<Mutex<Option<FrameCallback>>>,
    frame_counter: Arc<AtomicU64>,
}

impl SimulatorProbe {
    pub fn snapshot(&self) -> ProbeSnapshot {
        self.state.lock().clone()
    }

    /// Push one frame through the installed callback.
    ///
    /// Returns false when the device is not streaming or has no callback.
    pub fn emit_frame(&self, data: Vec<u8>, size: Size) -> bool {
        if !self.state.lock().streaming {
            return false;
        }
        let callback = self.callback.lock().clone();
        let Some(callback) = callback else {
            return false;
        };

        let id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        self.state.lock().frames_emitted += 1;
        trace!("Simulated frame {} ({}, {} bytes)", id, size, data.len());
        callback(FrameData::new(id, data, size));
        true
    }

    fn record<F: FnOnce(&mut ProbeSnapshot)>(&self, update: F) {
        update(&mut self.state.lock());
    }

    fn set_callback(&self, callback: Option<FrameCallback>) {
        *self.callback.lock() = callback;
    }
}

/// Backend producing [`SimulatedHandle`]s
pub struct SimulatedBackend {
    kind: BackendKind,
    devices: Vec<SimulatedDevice>,
    probe: SimulatorProbe,
    frame_interval: Option<Duration>,
    frame_bytes: Option<usize>,
}

impl SimulatedBackend {
    pub fn new(kind: BackendKind, devices: Vec<SimulatedDevice>) -> Self {
        Self {
            kind,
            devices,
            probe: SimulatorProbe::default(),
            frame_interval: None,
            frame_bytes: None,
        }
    }

    /// Back sensor at 90 degrees, front sensor at 270 degrees
    pub fn phone(kind: BackendKind) -> Self {
        Self::new(kind, vec![SimulatedDevice::back(), SimulatedDevice::front()])
    }

    /// Generate frames on a capture thread at the given fps while streaming.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame_interval = (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64));
        self
    }

    /// Truncate generated frames to `bytes` instead of a full NV21 buffer.
    pub fn with_frame_bytes(mut self, bytes: usize) -> Self {
        self.frame_bytes = Some(bytes);
        self
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        self.frame_interval
    }

    pub fn probe(&self) -> SimulatorProbe {
        self.probe.clone()
    }

    fn info_for(&self, id: usize) -> Option<DeviceInfo> {
        self.devices.get(id).map(|device| DeviceInfo {
            id,
            facing: device.facing,
            orientation: device.orientation,
        })
    }
}

impl CameraBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn device_info(&self, id: usize) -> Result<DeviceInfo, CameraError> {
        self.info_for(id)
            .ok_or(CameraError::InvalidDevice { device: id })
    }

    fn open(&mut self, id: usize) -> Result<Box<dyn DeviceHandle>, CameraError> {
        self.probe.record(|state| state.open_attempts.push(id));

        let (Some(device), Some(info)) = (self.devices.get(id).cloned(), self.info_for(id)) else {
            return Err(CameraError::Open {
                device: id,
                details: "no such device".to_string(),
            });
        };

        if device.fail_open {
            warn!("Simulated camera {} refused to open", id);
            return Err(CameraError::Open {
                device: id,
                details: "device busy".to_string(),
            });
        }

        self.probe.record(|state| {
            state.live_handles += 1;
            state.max_live_handles = state.max_live_handles.max(state.live_handles);
        });
        info!("Opened simulated {} camera {} ({:?})", self.kind, id, info.facing);

        Ok(Box::new(SimulatedHandle {
            info,
            device,
            parameters: HardwareParameters::default(),
            probe: self.probe.clone(),
            frame_interval: self.frame_interval,
            frame_bytes: self.frame_bytes,
            accepted_commits: 0,
            worker: None,
        }))
    }
}

struct CaptureWorker {
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Open simulated device
pub struct SimulatedHandle {
    info: DeviceInfo,
    device: SimulatedDevice,
    parameters: HardwareParameters,
    probe: SimulatorProbe,
    frame_interval: Option<Duration>,
    frame_bytes: Option<usize>,
    accepted_commits: usize,
    worker: Option<CaptureWorker>,
}

impl SimulatedHandle {
    fn spawn_worker(&mut self, interval: Duration) -> Result<(), CameraError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let probe = self.probe.clone();
        let size = self.parameters.preview_size.unwrap_or(Size::new(640, 480));
        let bytes = self.frame_bytes.unwrap_or_else(|| nv21_len(size));

        let thread = thread::Builder::new()
            .name(format!("sim-capture-{}", self.info.id))
            .spawn(move || {
                let mut sequence: u64 = 0;
                while flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    if !flag.load(Ordering::Relaxed) {
                        break;
                    }
                    probe.emit_frame(vec![(sequence % 256) as u8; bytes], size);
                    sequence += 1;
                }
            })
            .map_err(|e| CameraError::Stream {
                details: format!("Failed to spawn capture thread: {}", e),
            })?;

        self.worker = Some(CaptureWorker { running, thread });
        Ok(())
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.running.store(false, Ordering::Relaxed);
            if worker.thread.join().is_err() {
                warn!("Simulated capture thread panicked");
            }
        }
    }
}

impl DeviceHandle for SimulatedHandle {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            capture_sizes: self.device.capture_sizes.clone(),
            preview_sizes: self.device.preview_sizes.clone(),
            focus_modes: self.device.focus_modes.clone(),
        }
    }

    fn parameters(&self) -> HardwareParameters {
        self.parameters.clone()
    }

    fn set_parameters(&mut self, parameters: &HardwareParameters) -> Result<(), CameraError> {
        self.probe
            .record(|state| state.commits.push(parameters.clone()));

        let exhausted = self
            .device
            .accepted_commit_limit
            .is_some_and(|limit| self.accepted_commits >= limit);
        if exhausted || !self.device.accepts(parameters.preview_size) {
            self.probe.record(|state| state.rejected_commits += 1);
            return Err(CameraError::Commit {
                details: format!(
                    "preview size {:?} not supported by camera {}",
                    parameters.preview_size, self.info.id
                ),
            });
        }

        debug!("Simulated camera {} accepted {:?}", self.info.id, parameters);
        self.accepted_commits += 1;
        self.parameters = parameters.clone();
        Ok(())
    }

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), CameraError> {
        self.probe
            .record(|state| state.display_orientations.push(degrees));
        Ok(())
    }

    fn bind_surface(&mut self, output: &SurfaceOutput) -> Result<(), CameraError> {
        self.probe.record(|state| state.bindings.push(output.clone()));
        Ok(())
    }

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) {
        self.probe.set_callback(callback);
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.probe.record(|state| {
            state.preview_starts += 1;
            state.streaming = true;
        });
        if let (Some(interval), None) = (self.frame_interval, self.worker.as_ref()) {
            self.spawn_worker(interval)?;
        }
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.probe.record(|state| {
            state.preview_stops += 1;
            state.streaming = false;
        });
        self.stop_worker();
    }

    fn requires_pause_for(&self, property: &LiveProperty) -> bool {
        self.device.pause_for_live_changes
            && matches!(
                property,
                LiveProperty::DisplayOrientation | LiveProperty::PreviewTarget(SurfaceKind::Holder)
            )
    }

    fn release(mut self: Box<Self>) {
        self.stop_worker();
        self.probe.set_callback(None);
        self.probe.record(|state| {
            state.streaming = false;
            state.releases += 1;
            state.live_handles = state.live_handles.saturating_sub(1);
        });
        info!("Released simulated camera {}", self.info.id);
    }
}
