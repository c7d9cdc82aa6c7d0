pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod frame;
pub mod host;
pub mod orientation;
pub mod parameters;
pub mod session;
pub mod size;
pub mod surface;

pub use config::CameraViewConfig;
pub use device::{BackendKind, CameraBackend, DeviceHandle, SimulatedBackend, SimulatedDevice};
pub use error::{CameraError, CameraViewError, Result};
pub use events::{EventBus, EventBusObserver, EventFilter, EventReceiver, SessionEvent};
pub use frame::{nv21_len, FrameData};
pub use host::SessionHost;
pub use orientation::{capture_rotation, display_rotation, Facing};
pub use parameters::{merge, CameraSelector, Gravity, ParameterSet};
pub use session::{DeviceSession, SessionObserver, SessionState};
pub use size::Size;
pub use surface::{StaticSurface, SurfaceKind, SurfaceTarget};
