use crate::device::BackendKind;
use crate::error::EventBusError;
use crate::frame::FrameData;
use crate::session::SessionObserver;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Session notifications routed out of the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A device was opened and is streaming
    DeviceOpened { timestamp: SystemTime },
    /// The open device was released
    DeviceClosed { timestamp: SystemTime },
    /// A preview buffer arrived from the capture thread
    FrameReceived {
        frame_id: u64,
        bytes: usize,
        width: u32,
        height: u32,
        /// Buffer holds a full NV21 image
        complete: bool,
        timestamp: SystemTime,
    },
    /// A new screen reading was applied to the open device
    OrientationChanged {
        screen: u32,
        capture: u32,
        display: u32,
    },
    /// The primary backend failed and the host switched backends
    BackendFallback {
        from: BackendKind,
        to: BackendKind,
        reason: String,
    },
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::DeviceOpened { .. } => "Camera opened".to_string(),
            SessionEvent::DeviceClosed { .. } => "Camera closed".to_string(),
            SessionEvent::FrameReceived {
                frame_id,
                bytes,
                width,
                height,
                ..
            } => format!("Frame {} ({}x{}, {} bytes)", frame_id, width, height, bytes),
            SessionEvent::OrientationChanged {
                screen,
                capture,
                display,
            } => format!(
                "Screen at {} degrees: capture {} display {}",
                screen, capture, display
            ),
            SessionEvent::BackendFallback { from, to, reason } => {
                format!("Fell back from {} to {} backend: {}", from, to, reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::DeviceOpened { .. } => "device_opened",
            SessionEvent::DeviceClosed { .. } => "device_closed",
            SessionEvent::FrameReceived { .. } => "frame_received",
            SessionEvent::OrientationChanged { .. } => "orientation_changed",
            SessionEvent::BackendFallback { .. } => "backend_fallback",
        }
    }
}

/// Broadcast bus for session events.
///
/// Publishing never blocks, so it is safe from the capture thread.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers, returning how many received it
    pub fn publish(&self, event: SessionEvent) -> Result<usize, EventBusError> {
        match &event {
            SessionEvent::FrameReceived { .. } => trace!("{}", event.description()),
            SessionEvent::BackendFallback { .. } => warn!("{}", event.description()),
            _ => debug!("Publishing event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    All,
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Filtered subscription to an [`EventBus`]
pub struct EventReceiver {
    receiver: broadcast::Receiver<SessionEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(bus: &EventBus, filter: EventFilter, name: impl Into<String>) -> Self {
        Self {
            receiver: bus.subscribe(),
            filter,
            name: name.into(),
        }
    }

    /// Receive the next event passing the filter.
    ///
    /// Lagging skips the dropped events and keeps receiving.
    pub async fn recv(&mut self) -> Result<SessionEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<SessionEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

/// [`SessionObserver`] that republishes every notification on an [`EventBus`]
pub struct EventBusObserver {
    bus: EventBus,
}

impl EventBusObserver {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn forward(&self, event: SessionEvent) {
        // No subscribers is not an error for the session
        if self.bus.publish(event).is_err() {
            trace!("Session event dropped, no subscribers");
        }
    }
}

impl SessionObserver for EventBusObserver {
    fn device_opened(&self) {
        info!("Camera device opened");
        self.forward(SessionEvent::DeviceOpened {
            timestamp: SystemTime::now(),
        });
    }

    fn device_closed(&self) {
        info!("Camera device closed");
        self.forward(SessionEvent::DeviceClosed {
            timestamp: SystemTime::now(),
        });
    }

    fn frame_received(&self, frame: &FrameData) {
        self.forward(SessionEvent::FrameReceived {
            frame_id: frame.id,
            bytes: frame.data.len(),
            width: frame.size.width,
            height: frame.size.height,
            complete: frame.is_complete(),
            timestamp: frame.timestamp,
        });
    }
}
