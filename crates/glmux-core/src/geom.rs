//! Integer and floating point 2D geometry.

use std::ops::{Add, Sub};

/// Integer point or size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const ZERO: IntPoint = IntPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of pixels covered when interpreted as a size. Negative
    /// extents count as empty.
    pub fn area(self) -> usize {
        self.x.max(0) as usize * self.y.max(0) as usize
    }
}

impl Add for IntPoint {
    type Output = IntPoint;

    fn add(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for IntPoint {
    type Output = IntPoint;

    fn sub(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer rectangle. `tl` is inclusive, `br` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntRect {
    pub tl: IntPoint,
    pub br: IntPoint,
}

impl IntRect {
    pub const fn new(tl: IntPoint, br: IntPoint) -> Self {
        Self { tl, br }
    }

    pub const fn from_coords(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            tl: IntPoint::new(left, top),
            br: IntPoint::new(right, bottom),
        }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(size: IntPoint) -> Self {
        Self {
            tl: IntPoint::ZERO,
            br: size,
        }
    }

    pub fn width(&self) -> i32 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> i32 {
        self.br.y - self.tl.y
    }

    pub fn size(&self) -> IntPoint {
        IntPoint::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, p: IntPoint) -> bool {
        p.x >= self.tl.x && p.y >= self.tl.y && p.x < self.br.x && p.y < self.br.y
    }

    pub fn contains_rect(&self, other: &IntRect) -> bool {
        other.tl.x >= self.tl.x
            && other.tl.y >= self.tl.y
            && other.br.x <= self.br.x
            && other.br.y <= self.br.y
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: i32) -> IntRect {
        IntRect::from_coords(
            self.tl.x - margin,
            self.tl.y - margin,
            self.br.x + margin,
            self.br.y + margin,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DPoint {
    pub x: f64,
    pub y: f64,
}

impl DPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<IntPoint> for DPoint {
    fn from(p: IntPoint) -> Self {
        DPoint::new(f64::from(p.x), f64::from(p.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DRect {
    pub tl: DPoint,
    pub br: DPoint,
}

impl DRect {
    pub const fn from_coords(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            tl: DPoint::new(left, top),
            br: DPoint::new(right, bottom),
        }
    }

    pub fn width(&self) -> f64 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> f64 {
        self.br.y - self.tl.y
    }
}

impl From<IntRect> for DRect {
    fn from(r: IntRect) -> Self {
        DRect {
            tl: r.tl.into(),
            br: r.br.into(),
        }
    }
}

/// Smallest power of two that is `>= n` (1 for non-positive input).
pub fn next_power_of_two(n: i32) -> i32 {
    if n <= 1 {
        return 1;
    }
    (n as u32).next_power_of_two() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_size_and_containment() {
        let outer = IntRect::from_size(IntPoint::new(10, 8));
        let inner = IntRect::from_coords(2, 2, 10, 8);
        assert_eq!(outer.size(), IntPoint::new(10, 8));
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.contains(IntPoint::new(9, 7)));
        assert!(!outer.contains(IntPoint::new(10, 7)));
    }

    #[test]
    fn expanded_grows_every_side() {
        let r = IntRect::from_size(IntPoint::new(4, 4)).expanded(3);
        assert_eq!(r, IntRect::from_coords(-3, -3, 7, 7));
        assert_eq!(r.size(), IntPoint::new(10, 10));
    }

    #[test]
    fn powers_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(64), 64);
    }
}
