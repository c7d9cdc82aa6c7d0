mod backend;
pub mod simulated;
#[cfg(test)]
mod tests;

pub use backend::{
    BackendKind, Capabilities, CameraBackend, DeviceHandle, DeviceInfo, FocusMode, FrameCallback,
    HardwareParameters, LiveProperty,
};
pub use simulated::{ProbeSnapshot, SimulatedBackend, SimulatedDevice, SimulatorProbe};
