//! Camera session lifecycle, orientation reapplication and parameter
//! negotiation on top of a [`CameraBackend`](crate::device::CameraBackend).

mod engine;
pub mod negotiation;
mod observer;
mod state;

pub use engine::DeviceSession;
pub use negotiation::{select_focus_mode, SAFE_FALLBACK_SIZE};
pub use observer::SessionObserver;
pub use state::SessionState;
