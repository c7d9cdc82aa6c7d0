use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Immutable pixel dimensions, ordered by area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Largest size by area; the first enumerated wins a tie.
    pub fn largest(sizes: &[Size]) -> Option<Size> {
        sizes.iter().copied().fold(None, |best, size| match best {
            Some(best) if best.area() >= size.area() => Some(best),
            _ => Some(size),
        })
    }
}

impl Ord for Size {
    fn cmp(&self, other: &Self) -> Ordering {
        // Width breaks area ties so the order stays consistent with Eq
        self.area()
            .cmp(&other.area())
            .then_with(|| self.width.cmp(&other.width))
    }
}

impl PartialOrd for Size {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
