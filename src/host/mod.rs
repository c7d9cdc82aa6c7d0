mod layout;
mod session_host;

pub use layout::preferred_layout_size;
pub use session_host::SessionHost;
