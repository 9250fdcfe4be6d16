//! Integer window-space geometry.
//!
//! Positions are signed (a pointer can sit left of or above a surface while
//! captured), sizes are unsigned.

/// A point in window or screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by another point.
    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y))
    }

    /// Sum of absolute axis deltas (the "diamond" distance), saturating at
    /// `i32::MAX`.
    pub fn manhattan_distance(self, other: Point) -> i32 {
        let distance = self
            .x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y));
        i32::try_from(distance).unwrap_or(i32::MAX)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero width or zero height.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raise each axis to at least `min`.
    pub fn clamp_min(self, min: u32) -> Self {
        Self::new(self.width.max(min), self.height.max(min))
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            origin: Point::default(),
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    pub fn right(&self) -> i32 {
        self.origin.x.saturating_add(self.size.width as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.origin.y.saturating_add(self.size.height as i32)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.right()
            && point.y < self.bottom()
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.origin.x.min(other.origin.x);
        let y = self.origin.y.min(other.origin.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right.abs_diff(x), bottom.abs_diff(y))
    }

    /// Overlap of both rectangles, `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.origin.x.max(other.origin.x);
        let y = self.origin.y.max(other.origin.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right.abs_diff(x), bottom.abs_diff(y)))
    }

    pub fn translate(&self, by: Point) -> Rect {
        Rect {
            origin: self.origin.offset(by),
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Point::new(10, 10);
        assert_eq!(a.manhattan_distance(Point::new(10, 10)), 0);
        assert_eq!(a.manhattan_distance(Point::new(17, 3)), 14);
        assert_eq!(a.manhattan_distance(Point::new(200, 10)), 190);
    }

    #[test]
    fn test_manhattan_distance_saturates_at_extremes() {
        let low = Point::new(i32::MIN, i32::MIN);
        let high = Point::new(i32::MAX, i32::MAX);
        assert_eq!(low.manhattan_distance(high), i32::MAX);
        assert_eq!(high.manhattan_distance(low), i32::MAX);
        assert_eq!(Point::new(i32::MIN, 0).manhattan_distance(Point::new(0, 0)), i32::MAX);
        assert_eq!(Point::new(-5, 0).manhattan_distance(Point::new(i32::MIN + 5, 0)), i32::MAX - 9);
        assert_eq!(Point::new(-1, -1).manhattan_distance(Point::new(1, 1)), 4);
    }

    #[test]
    fn test_rect_union_spanning_full_range() {
        let a = Rect::new(i32::MIN, 0, 10, 10);
        let b = Rect::new(i32::MAX - 10, 0, 10, 10);
        assert_eq!(a.union(&b), Rect::new(i32::MIN, 0, u32::MAX, 10));
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(0, 0, 100, 50);
        assert!(rect.contains(Point::new(0, 0)));
        assert!(rect.contains(Point::new(99, 49)));
        assert!(!rect.contains(Point::new(100, 10)));
        assert!(!rect.contains(Point::new(10, 50)));
        assert!(!rect.contains(Point::new(-1, 10)));
    }

    #[test]
    fn test_rect_union_skips_empty() {
        let a = Rect::new(10, 10, 10, 10);
        let b = Rect::new(30, 0, 5, 5);
        assert_eq!(a.union(&b), Rect::new(10, 0, 25, 20));
        assert_eq!(Rect::default().union(&a), a);
        assert_eq!(a.union(&Rect::default()), a);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersection(&Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersection(&Rect::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn test_size_clamp_min() {
        assert_eq!(Size::new(0, 20).clamp_min(1), Size::new(1, 20));
        assert!(Size::new(0, 20).is_empty());
        assert!(!Size::new(0, 20).clamp_min(1).is_empty());
    }
}
