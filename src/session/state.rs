use std::fmt;

/// Lifecycle state of a [`DeviceSession`](super::DeviceSession)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Previewing,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Opening => "opening",
            SessionState::Previewing => "previewing",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}
