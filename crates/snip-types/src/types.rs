use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point in pixels, either surface-local or screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by the origin of `frame`
    pub fn offset_by(self, origin: Point) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
        }
    }

    /// Express this screen point relative to `origin`
    pub fn relative_to(self, origin: Point) -> Self {
        Self {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }
}

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of two corners, in ascending coordinate order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.right() && point.y < self.bottom()
    }

    /// True when `other` lies entirely inside this region
    pub fn encloses(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Both edges strictly longer than `min_edge`
    pub fn exceeds(&self, min_edge: u32) -> bool {
        self.width > min_edge && self.height > min_edge
    }

    pub fn translate(self, origin: Point) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
            ..self
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

/// Raw RGBA8 pixels handed from the capture backend to the recognizer
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecognizedText {
    pub content: String,
}

impl RecognizedText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let region = Region::from_corners(Point::new(300, 180), Point::new(100, 100));
        assert_eq!(region, Region::new(100, 100, 200, 80));
    }

    #[test]
    fn exceeds_is_strict() {
        assert!(!Region::new(0, 0, 10, 50).exceeds(10));
        assert!(!Region::new(0, 0, 50, 10).exceeds(10));
        assert!(Region::new(0, 0, 11, 11).exceeds(10));
    }

    #[test]
    fn encloses_checks_all_edges() {
        let screen = Region::new(0, 0, 1920, 1080);
        assert!(screen.encloses(&Region::new(100, 100, 200, 80)));
        assert!(!screen.encloses(&Region::new(1800, 100, 200, 80)));
        assert!(!screen.encloses(&Region::new(-1, 0, 10, 10)));
    }

    #[test]
    fn session_id_displays_short_form() {
        let id = SessionId::new();
        assert_eq!(id.to_string().len(), 8);
    }
}
