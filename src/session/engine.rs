use super::negotiation::negotiate;
use super::observer::SessionObserver;
use super::state::SessionState;
use crate::device::{
    BackendKind, Capabilities, CameraBackend, DeviceHandle, DeviceInfo, FrameCallback,
    HardwareParameters, LiveProperty,
};
use crate::error::CameraError;
use crate::frame::FrameData;
use crate::orientation::{capture_rotation, display_rotation};
use crate::parameters::ParameterSet;
use crate::size::Size;
use crate::surface::{SurfaceKind, SurfaceTarget};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

type ObserverSlot = Arc<RwLock<Option<Arc<dyn SessionObserver>>>>;

/// Everything that only exists while a device is open
struct OpenDevice {
    handle: Box<dyn DeviceHandle>,
    info: DeviceInfo,
    capabilities: Capabilities,
    working: HardwareParameters,
}

/// Owns at most one open camera device and drives its lifecycle.
///
/// All methods must be called from the single thread that owns the session.
/// Frames arrive on the device's capture thread and are forwarded to the
/// registered [`SessionObserver`] without further synchronisation.
pub struct DeviceSession {
    backend: Box<dyn CameraBackend>,
    surface: Arc<dyn SurfaceTarget>,
    observer: ObserverSlot,
    state: SessionState,
    device_id: usize,
    device: Option<OpenDevice>,
    parameters: ParameterSet,
    showing_preview: bool,
}

impl DeviceSession {
    pub fn new(backend: Box<dyn CameraBackend>, surface: Arc<dyn SurfaceTarget>) -> Self {
        Self {
            backend,
            surface,
            observer: Arc::new(RwLock::new(None)),
            state: SessionState::Closed,
            device_id: 0,
            device: None,
            parameters: ParameterSet::default(),
            showing_preview: false,
        }
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn SessionObserver>>) {
        *self.observer.write() = observer;
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.showing_preview
    }

    /// Device id chosen by the last `start`
    pub fn selected_device(&self) -> usize {
        self.device_id
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device.as_ref().map(|device| &device.info)
    }

    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.device.as_ref().map(|device| &device.capabilities)
    }

    pub fn supported_preview_sizes(&self) -> Option<Vec<Size>> {
        self.device
            .as_ref()
            .map(|device| device.capabilities.preview_sizes.clone())
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Merge `partial` into the stored parameters without reopening.
    pub fn merge_parameters(&mut self, partial: &ParameterSet) {
        self.parameters.merge(partial);
    }

    /// Current (capture, display) rotation in degrees, when open
    pub fn rotations(&self) -> Option<(u32, u32)> {
        self.device.as_ref().map(|device| {
            let screen = self.parameters.display_orientation;
            (
                capture_rotation(device.info.facing, device.info.orientation, screen),
                display_rotation(device.info.facing, device.info.orientation, screen),
            )
        })
    }

    /// Replace the parameter set wholesale, reopening the device if open.
    pub fn set_parameters(&mut self, parameters: ParameterSet) -> Result<(), CameraError> {
        if self.is_open() {
            self.stop();
            self.start(parameters)
        } else {
            self.parameters = parameters;
            Ok(())
        }
    }

    /// Open the device selected by `parameters`, negotiate and start streaming.
    pub fn start(&mut self, parameters: ParameterSet) -> Result<(), CameraError> {
        self.parameters = parameters;
        self.device_id = self.choose_device();
        self.stop();

        self.state = SessionState::Opening;
        info!(
            "Starting {} camera session on device {}",
            self.backend.kind(),
            self.device_id
        );

        if let Err(e) = self.open_and_stream() {
            if e.is_fatal() {
                error!("Camera session failed to start: {}", e);
            } else {
                warn!("Camera session failed to start on a device error: {}", e);
            }
            self.showing_preview = false;
            self.release_device(false);
            self.state = SessionState::Closed;
            return Err(e);
        }

        self.state = SessionState::Previewing;
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer.device_opened();
        }
        Ok(())
    }

    /// Halt streaming and release the device. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(device) = self.device.as_mut() {
            device.handle.set_frame_callback(None);
            device.handle.stop_preview();
        }
        self.showing_preview = false;

        if self.release_device(true) {
            self.state = SessionState::Stopped;
            info!("Camera session stopped");
        } else {
            debug!("Stop requested while {}, nothing to release", self.state);
        }
    }

    /// Stop and forget the observer; the session ends up `Closed`.
    pub fn close(&mut self) {
        self.stop();
        *self.observer.write() = None;
        self.state = SessionState::Closed;
    }

    /// Reapply a new screen-orientation reading to the open device.
    ///
    /// Unchanged readings touch nothing. Streaming is paused only if the
    /// device needs it for display-orientation changes. A failed write
    /// releases the device and leaves the session `Closed`.
    pub fn set_display_orientation(&mut self, degrees: u32) -> Result<(), CameraError> {
        if self.parameters.display_orientation == degrees {
            return Ok(());
        }
        self.parameters.display_orientation = degrees;

        let result = self.apply_orientation(degrees);
        self.close_on_error(result)
    }

    /// Rebind the drawing target and recommit parameters after the surface
    /// changed size or identity.
    pub fn on_surface_changed(&mut self) -> Result<(), CameraError> {
        if !self.is_open() {
            return Ok(());
        }
        info!("Drawing surface changed, rebinding preview");
        let result = self.bind_surface().and_then(|()| self.adjust_parameters());
        self.close_on_error(result)
    }

    fn apply_orientation(&mut self, degrees: u32) -> Result<(), CameraError> {
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };

        let (facing, sensor) = (device.info.facing, device.info.orientation);
        let capture_degrees = capture_rotation(facing, sensor, degrees);
        let display_degrees = display_rotation(facing, sensor, degrees);
        debug!(
            "Screen orientation {} -> capture {} display {}",
            degrees, capture_degrees, display_degrees
        );

        device.working.rotation = capture_degrees;
        device.handle.set_parameters(&device.working)?;

        let pause = self.showing_preview
            && device
                .handle
                .requires_pause_for(&LiveProperty::DisplayOrientation);
        if pause {
            device.handle.stop_preview();
        }
        device.handle.set_display_orientation(display_degrees)?;
        if pause {
            device.handle.start_preview()?;
        }
        Ok(())
    }

    // Reconfiguring an open device either succeeds or ends the session.
    fn close_on_error(&mut self, result: Result<(), CameraError>) -> Result<(), CameraError> {
        if let Err(e) = &result {
            if self.is_open() {
                error!("Reconfiguring the open camera failed, closing: {}", e);
                if let Some(device) = self.device.as_mut() {
                    device.handle.set_frame_callback(None);
                    device.handle.stop_preview();
                }
                self.showing_preview = false;
                self.release_device(true);
                self.state = SessionState::Closed;
            }
        }
        result
    }

    // Device index matching the selector, or 0 when there is none.
    fn choose_device(&self) -> usize {
        let wanted = self.parameters.camera.index();
        (0..self.backend.device_count())
            .find(|&id| id == wanted)
            .unwrap_or(0)
    }

    fn open_and_stream(&mut self) -> Result<(), CameraError> {
        self.open_device()?;
        self.adjust_parameters()?;

        if let Some(device) = self.device.as_mut() {
            let display_degrees = display_rotation(
                device.info.facing,
                device.info.orientation,
                self.parameters.display_orientation,
            );
            device.handle.set_display_orientation(display_degrees)?;
        }

        if self.surface.is_ready() {
            self.bind_surface()?;
        } else {
            debug!("Drawing surface not ready, binding deferred");
        }

        self.showing_preview = true;
        self.begin_streaming()
    }

    fn open_device(&mut self) -> Result<(), CameraError> {
        let first = self.device_id;
        let handle = match self.backend.open(first) {
            Ok(handle) => handle,
            Err(first_error) => {
                let alternate = if first == 0 { 1 } else { 0 };
                warn!(
                    "Camera {} failed to open ({}), trying camera {}",
                    first, first_error, alternate
                );
                match self.backend.open(alternate) {
                    Ok(handle) => {
                        self.device_id = alternate;
                        handle
                    }
                    Err(second_error) => {
                        return Err(CameraError::DeviceUnavailable {
                            attempted: vec![first, alternate],
                            details: format!("{}; {}", first_error, second_error),
                        });
                    }
                }
            }
        };

        let info = handle.info().clone();
        let capabilities = handle.capabilities();
        let working = handle.parameters();
        debug!(
            "Camera {} capabilities: {} capture sizes, focus modes {:?}",
            info.id,
            capabilities.capture_sizes.len(),
            capabilities.focus_modes
        );

        self.device = Some(OpenDevice {
            handle,
            info,
            capabilities,
            working,
        });
        Ok(())
    }

    fn adjust_parameters(&mut self) -> Result<(), CameraError> {
        let Some(device) = self.device.as_mut() else {
            return Err(CameraError::NotOpen);
        };
        let negotiated = negotiate(
            device.handle.as_mut(),
            &device.info,
            &device.capabilities,
            &mut self.parameters,
            &mut device.working,
            self.showing_preview,
        )?;
        info!("Camera {} negotiated {}", device.info.id, negotiated);
        Ok(())
    }

    fn bind_surface(&mut self) -> Result<(), CameraError> {
        let output = self.surface.output();
        if let SurfaceKind::Other(kind) = &output.kind {
            return Err(CameraError::UnsupportedTarget { kind: kind.clone() });
        }
        let Some(device) = self.device.as_mut() else {
            return Err(CameraError::NotOpen);
        };

        let pause = self.showing_preview
            && device
                .handle
                .requires_pause_for(&LiveProperty::PreviewTarget(output.kind.clone()));
        if pause {
            device.handle.stop_preview();
        }
        device.handle.bind_surface(&output)?;
        if pause {
            device.handle.start_preview()?;
        }
        debug!("Bound {} surface {} ({})", output.kind, output.id, output.size);
        Ok(())
    }

    fn begin_streaming(&mut self) -> Result<(), CameraError> {
        let Some(device) = self.device.as_mut() else {
            return Err(CameraError::NotOpen);
        };
        device.handle.start_preview()?;

        let observer = Arc::clone(&self.observer);
        let callback: FrameCallback = Arc::new(move |frame: FrameData| {
            trace!("Frame {} ({} bytes)", frame.id, frame.data.len());
            if let Some(observer) = observer.read().as_ref() {
                observer.frame_received(&frame);
            }
        });
        device.handle.set_frame_callback(Some(callback));
        Ok(())
    }

    // Returns whether a handle was released.
    fn release_device(&mut self, notify: bool) -> bool {
        let Some(device) = self.device.take() else {
            return false;
        };
        device.handle.release();
        info!("Released camera {}", device.info.id);

        if notify {
            let observer = self.observer.read().clone();
            if let Some(observer) = observer {
                observer.device_closed();
            }
        }
        true
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.stop();
    }
}
