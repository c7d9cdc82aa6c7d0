use crate::size::Size;

/// Size the preview view should measure itself at.
///
/// An exactly constrained view takes the space it was given. Otherwise it
/// wraps the negotiated preview size, falling back to the available space
/// before anything has been negotiated.
pub fn preferred_layout_size(available: Size, exact: bool, preview: Option<Size>) -> Size {
    if exact {
        return available;
    }
    preview.unwrap_or(available)
}
