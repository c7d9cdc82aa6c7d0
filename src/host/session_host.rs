use super::layout::preferred_layout_size;
use crate::device::{BackendKind, CameraBackend};
use crate::error::CameraError;
use crate::events::{EventBus, EventBusObserver, SessionEvent};
use crate::parameters::ParameterSet;
use crate::session::{DeviceSession, SessionObserver};
use crate::size::Size;
use crate::surface::SurfaceTarget;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Façade the UI layer talks to.
///
/// Owns the active [`DeviceSession`], forwards orientation and surface
/// notifications into it, and swaps to a legacy backend when the advanced
/// one cannot start.
pub struct SessionHost {
    session: DeviceSession,
    fallback: Option<Box<dyn CameraBackend>>,
    surface: Arc<dyn SurfaceTarget>,
    observer: Option<Arc<dyn SessionObserver>>,
    events: Option<EventBus>,
}

impl SessionHost {
    pub fn new(backend: Box<dyn CameraBackend>, surface: Arc<dyn SurfaceTarget>) -> Self {
        Self {
            session: DeviceSession::new(backend, Arc::clone(&surface)),
            fallback: None,
            surface,
            observer: None,
            events: None,
        }
    }

    /// Backend used once if the primary advanced backend fails to start.
    pub fn with_fallback(mut self, backend: Box<dyn CameraBackend>) -> Self {
        self.fallback = Some(backend);
        self
    }

    /// Route session notifications and host events onto `bus`.
    ///
    /// Replaces any observer registered earlier.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.set_observer(Arc::new(EventBusObserver::new(bus.clone())));
        self.events = Some(bus);
        self
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.session.set_observer(Some(Arc::clone(&observer)));
        self.observer = Some(observer);
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.session.backend_kind()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn parameters(&self) -> &ParameterSet {
        self.session.parameters()
    }

    pub fn set_parameters(&mut self, parameters: ParameterSet) -> Result<(), CameraError> {
        self.session.set_parameters(parameters)
    }

    /// Fill unset values from `partial` without touching the device.
    pub fn init_parameters(&mut self, partial: &ParameterSet) {
        self.session.merge_parameters(partial);
    }

    /// Start the session, retrying once on the legacy backend when the
    /// advanced one fails. The retry uses `parameters` as the caller passed
    /// them, not the values the failed negotiation left behind.
    pub fn start(&mut self, parameters: ParameterSet) -> Result<(), CameraError> {
        let requested = parameters.clone();
        let error = match self.session.start(parameters) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if self.session.backend_kind() != BackendKind::Advanced
            || matches!(error, CameraError::UnsupportedTarget { .. })
        {
            return Err(error);
        }
        let Some(fallback) = self.fallback.take() else {
            return Err(error);
        };

        let from = self.session.backend_kind();
        let to = fallback.kind();
        warn!(
            "{} backend failed to start ({}), falling back to {}",
            from, error, to
        );
        self.publish(SessionEvent::BackendFallback {
            from,
            to,
            reason: error.to_string(),
        });

        let mut session = DeviceSession::new(fallback, Arc::clone(&self.surface));
        session.set_observer(self.observer.clone());

        let mut previous = std::mem::replace(&mut self.session, session);
        previous.close();

        self.session.start(requested)
    }

    pub fn restart(&mut self, parameters: ParameterSet) -> Result<(), CameraError> {
        if self.session.is_open() {
            self.session.stop();
        }
        self.start(parameters)
    }

    /// Toggle between the back and front camera and restart.
    pub fn switch_camera(&mut self) -> Result<(), CameraError> {
        let mut parameters = self.session.parameters().clone();
        parameters.camera = parameters.camera.toggled();
        info!("Switching to {:?} camera", parameters.camera);
        self.restart(parameters)
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    /// Stop and drop the observer.
    pub fn close(&mut self) {
        self.session.close();
        self.observer = None;
    }

    /// Forward a screen-orientation reading from the orientation sensor.
    pub fn on_orientation_changed(&mut self, degrees: u32) -> Result<(), CameraError> {
        let changed = self.session.parameters().display_orientation != degrees;
        self.session.set_display_orientation(degrees)?;

        if !changed {
            debug!("Screen orientation unchanged at {}", degrees);
            return Ok(());
        }
        if let Some((capture, display)) = self.session.rotations() {
            self.publish(SessionEvent::OrientationChanged {
                screen: degrees,
                capture,
                display,
            });
        }
        Ok(())
    }

    pub fn on_surface_changed(&mut self) -> Result<(), CameraError> {
        self.session.on_surface_changed()
    }

    /// See [`preferred_layout_size`].
    pub fn preferred_layout_size(&self, available: Size, exact: bool) -> Size {
        preferred_layout_size(available, exact, self.session.parameters().preview_size)
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(bus) = &self.events {
            if bus.publish(event).is_err() {
                debug!("Host event dropped, no subscribers");
            }
        }
    }
}
