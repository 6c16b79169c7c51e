//! Collision shapes
//!
//! Axis-aligned rectangles (player, gates, bounding boxes) and circles
//! (obstacles). Precise hit tests use signed distances instead of pixel
//! masks: the sprites are a filled rectangle and filled discs, so the
//! analytic test matches the bitmap test.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Strict overlap test (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }
}

/// A filled circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Square bounding box of the disc
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center - Vec2::splat(self.radius),
            Vec2::splat(self.radius * 2.0),
        )
    }
}

/// Precise collision shape of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Rect(Rect),
    Circle(Circle),
}

impl Shape {
    /// Bounding rectangle (coarse test)
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect(r) => *r,
            Shape::Circle(c) => c.bounds(),
        }
    }

    /// Precise overlap test
    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Rect(a), Shape::Rect(b)) => a.intersects(b),
            (Shape::Rect(r), Shape::Circle(c)) | (Shape::Circle(c), Shape::Rect(r)) => {
                sd_rect(c.center, r) < c.radius
            }
            (Shape::Circle(a), Shape::Circle(b)) => {
                sd_circle(a.center, b.center, b.radius) < a.radius
            }
        }
    }
}

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Signed distance to an axis-aligned rectangle (negative inside)
pub fn sd_rect(p: Vec2, rect: &Rect) -> f32 {
    let half = rect.size * 0.5;
    let d = (p - rect.center()).abs() - half;
    let outside = d.max(Vec2::ZERO).length();
    let inside = d.x.max(d.y).min(0.0);
    outside + inside
}
