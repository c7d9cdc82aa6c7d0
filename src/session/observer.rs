use crate::frame::FrameData;

/// Receives session lifecycle notifications and preview frames.
///
/// `frame_received` runs on the device's capture thread and must return
/// quickly; blocking it stalls the hardware pipeline.
pub trait SessionObserver: Send + Sync {
    fn device_opened(&self) {}

    fn device_closed(&self) {}

    fn frame_received(&self, _frame: &FrameData) {}
}
