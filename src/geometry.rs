//! Geometric primitives: vertical directions, left/right pairs and
//! one-dimensional intervals.
//!
//! Empty intervals are represented with `lo > hi` (the canonical empty
//! interval is `[+inf, -inf]`), so unions and intersections need no
//! special cases.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Vertical direction of a stem or beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    #[default]
    Center,
    Up,
}

impl Direction {
    /// -1, 0 or +1.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Down => -1.0,
            Direction::Center => 0.0,
            Direction::Up => 1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Center => Direction::Center,
            Direction::Up => Direction::Down,
        }
    }

    pub fn from_sign(value: f64) -> Direction {
        if value > 0.0 {
            Direction::Up
        } else if value < 0.0 {
            Direction::Down
        } else {
            Direction::Center
        }
    }
}

/// Horizontal side of a beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

/// A value for each end of a beam.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerSide<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Left and right vertical beam positions.
pub type BeamPositions = PerSide<f64>;

impl BeamPositions {
    /// Rise from left to right.
    pub fn delta(&self) -> f64 {
        self.right - self.left
    }

    pub fn scaled(&self, factor: f64) -> BeamPositions {
        PerSide::new(self.left * factor, self.right * factor)
    }
}

/// A closed interval `[lo, hi]` on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Default for Interval {
    fn default() -> Self {
        Interval::empty()
    }
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn point(value: f64) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn empty() -> Self {
        Self { lo: f64::INFINITY, hi: f64::NEG_INFINITY }
    }

    pub fn full() -> Self {
        Self { lo: f64::NEG_INFINITY, hi: f64::INFINITY }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Signed difference `hi - lo`.
    pub fn delta(&self) -> f64 {
        self.hi - self.lo
    }

    /// Extent of the interval, 0 when empty.
    pub fn length(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.hi - self.lo
        }
    }

    pub fn center(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// The bound in direction `dir`: `lo` for down, `hi` for up.
    pub fn at(&self, dir: Direction) -> f64 {
        match dir {
            Direction::Down => self.lo,
            Direction::Up => self.hi,
            Direction::Center => self.center(),
        }
    }

    pub fn set_at(&mut self, dir: Direction, value: f64) {
        match dir {
            Direction::Down => self.lo = value,
            Direction::Up => self.hi = value,
            Direction::Center => {}
        }
    }

    pub fn intersect(&mut self, other: Interval) {
        self.lo = self.lo.max(other.lo);
        self.hi = self.hi.min(other.hi);
    }

    pub fn intersection(&self, other: Interval) -> Interval {
        let mut result = *self;
        result.intersect(other);
        result
    }

    pub fn unite(&mut self, other: Interval) {
        if other.is_empty() {
            return;
        }
        self.lo = self.lo.min(other.lo);
        self.hi = self.hi.max(other.hi);
    }

    pub fn add_point(&mut self, value: f64) {
        self.lo = self.lo.min(value);
        self.hi = self.hi.max(value);
    }

    /// Grow by `amount` on both sides. Empty intervals stay empty.
    pub fn widen(&mut self, amount: f64) {
        if self.is_empty() {
            return;
        }
        self.lo -= amount;
        self.hi += amount;
    }

    pub fn translated(&self, offset: f64) -> Interval {
        Interval::new(self.lo + offset, self.hi + offset)
    }

    pub fn scaled(&self, factor: f64) -> Interval {
        if factor >= 0.0 {
            Interval::new(self.lo * factor, self.hi * factor)
        } else {
            Interval::new(self.hi * factor, self.lo * factor)
        }
    }

    /// Distance from `value` to the nearest point of the interval.
    pub fn distance(&self, value: f64) -> f64 {
        if value > self.hi {
            value - self.hi
        } else if value < self.lo {
            self.lo - value
        } else {
            0.0
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: Interval,
    pub y: Interval,
}

impl BoundingBox {
    pub fn new(x: Interval, y: Interval) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_interval_absorbs_in_union() {
        let mut iv = Interval::empty();
        iv.unite(Interval::new(1.0, 2.0));
        assert_eq!(iv, Interval::new(1.0, 2.0));
        iv.unite(Interval::empty());
        assert_eq!(iv, Interval::new(1.0, 2.0));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let iv = Interval::new(0.0, 1.0).intersection(Interval::new(2.0, 3.0));
        assert!(iv.is_empty());
        assert_eq!(iv.length(), 0.0);
    }

    #[test]
    fn widen_keeps_empty_empty() {
        let mut iv = Interval::empty();
        iv.widen(10.0);
        assert!(iv.is_empty());
    }

    #[test]
    fn distance_to_outside_points() {
        let iv = Interval::new(-1.0, 1.0);
        assert_eq!(iv.distance(3.0), 2.0);
        assert_eq!(iv.distance(-1.5), 0.5);
        assert_eq!(iv.distance(0.2), 0.0);
    }

    #[test]
    fn directional_access() {
        let mut iv = Interval::full();
        iv.set_at(Direction::Down, 2.0);
        assert_eq!(iv.at(Direction::Down), 2.0);
        assert!(iv.at(Direction::Up).is_infinite());
        assert!(iv.contains(1e9));
        assert!(!iv.contains(1.9));
    }

    #[test]
    fn negative_scale_swaps_bounds() {
        assert_eq!(Interval::new(1.0, 2.0).scaled(-1.0), Interval::new(-2.0, -1.0));
    }
}
