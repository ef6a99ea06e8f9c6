//! Geometry
//!
//! Rectangles and viewport intersection tests for visibility-based
//! loading decisions.

/// Element bounds in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rect.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Viewport for visibility testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Create a new viewport.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if a rectangle intersects the viewport.
    #[inline]
    pub fn intersects(&self, rect: &Rect) -> bool {
        rect.x < self.right()
            && rect.x + rect.width > self.x
            && rect.y < self.bottom()
            && rect.y + rect.height > self.y
    }

    /// Expand viewport by a margin (for proximity loading).
    #[inline]
    pub fn expand(&self, margin: f32) -> Viewport {
        Viewport {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_intersects() {
        let vp = Viewport::new(0.0, 0.0, 100.0, 100.0);

        // Fully inside
        assert!(vp.intersects(&Rect::new(10.0, 10.0, 20.0, 20.0)));

        // Partially inside
        assert!(vp.intersects(&Rect::new(-10.0, -10.0, 20.0, 20.0)));

        // Fully outside
        assert!(!vp.intersects(&Rect::new(200.0, 200.0, 20.0, 20.0)));

        // Zero-size rect never intersects
        assert!(!vp.intersects(&Rect::new(10.0, 10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_viewport_expand() {
        let vp = Viewport::new(0.0, 0.0, 100.0, 100.0);
        let rect = Rect::new(10.0, 250.0, 20.0, 20.0);

        // Below the fold, but within a 200px margin
        assert!(!vp.intersects(&rect));
        assert!(vp.expand(200.0).intersects(&rect));
    }
}
