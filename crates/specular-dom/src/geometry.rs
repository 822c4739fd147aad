//! Element geometry
//!
//! Viewport-relative bounding box plus scroll state. The capture side reads
//! these to build layout snapshots; the replay side writes scroll offsets
//! back when replaying scroll events.

/// Geometry of a rendered element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementGeometry {
    /// Viewport-relative x of the bounding box
    pub x: f64,
    /// Viewport-relative y of the bounding box
    pub y: f64,
    pub width: f64,
    pub height: f64,

    // Scroll state
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ElementGeometry {
    /// Create with a bounding box only
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Scroll to a position, clamped to the scrollable range
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_left = x.max(0.0).min((self.scroll_width - self.client_width).max(0.0));
        self.scroll_top = y.max(0.0).min((self.scroll_height - self.client_height).max(0.0));
    }

    /// Scroll by a delta
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll_left + dx, self.scroll_top + dy);
    }
}
