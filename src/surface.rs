use crate::size::Size;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Kind of drawing target a surface exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Window-backed surface holder
    Holder,
    /// Texture the compositor samples from
    Texture,
    /// Anything the session does not know how to bind
    Other(String),
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Holder => write!(f, "holder"),
            SurfaceKind::Texture => write!(f, "texture"),
            SurfaceKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// What the session binds the device preview to
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOutput {
    pub kind: SurfaceKind,
    /// Changes whenever the underlying surface is recreated
    pub id: u64,
    pub size: Size,
}

/// Drawing target supplied by the UI layer.
///
/// When the underlying surface changes size or identity the owner calls
/// `on_surface_changed` on the host so the session can rebind.
pub trait SurfaceTarget: Send + Sync {
    fn is_ready(&self) -> bool;

    fn output(&self) -> SurfaceOutput;
}

/// Surface with externally controlled readiness, used by the CLI and tests
pub struct StaticSurface {
    ready: AtomicBool,
    output: Mutex<SurfaceOutput>,
}

impl StaticSurface {
    pub fn new(kind: SurfaceKind, size: Size) -> Self {
        Self {
            ready: AtomicBool::new(true),
            output: Mutex::new(SurfaceOutput { kind, id: 1, size }),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    /// Recreate the surface at a new size, bumping its identity.
    pub fn resize(&self, size: Size) {
        let mut output = self.output.lock();
        output.id += 1;
        output.size = size;
    }
}

impl SurfaceTarget for StaticSurface {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn output(&self) -> SurfaceOutput {
        self.output.lock().clone()
    }
}
