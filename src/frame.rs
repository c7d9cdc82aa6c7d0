use crate::size::Size;
use std::sync::Arc;
use std::time::SystemTime;

/// Byte length of an NV21 (YUV 4:2:0 semi-planar) buffer, the preview layout
pub fn nv21_len(size: Size) -> usize {
    size.width as usize * size.height as usize * 3 / 2
}

/// Raw NV21 preview buffer handed to the session observer
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Sequence number within one preview stream
    pub id: u64,
    pub timestamp: SystemTime,
    pub data: Arc<Vec<u8>>,
    pub size: Size,
}

impl FrameData {
    pub fn new(id: u64, data: Vec<u8>, size: Size) -> Self {
        Self {
            id,
            timestamp: SystemTime::now(),
            data: Arc::new(data),
            size,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether the buffer holds a full NV21 image of `size`
    pub fn is_complete(&self) -> bool {
        self.data.len() == nv21_len(self.size)
    }
}
