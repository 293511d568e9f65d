//! Planar geometry for wall-distance queries
//!
//! Walls are collected per layer as polylines in printing order. Distances are
//! measured in the XY plane only; Z never takes part in a query.

use serde::{Deserialize, Serialize};

/// Coordinates closer than this are treated as the same point
pub const COINCIDENT_EPSILON: f64 = 1e-9;

/// A point in the XY plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point halfway between `self` and `other`
    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation, `t = 0` is `self` and `t = 1` is `other`
    pub fn lerp(&self, other: &Point2, t: f64) -> Point2 {
        Point2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Whether two points are the same within [`COINCIDENT_EPSILON`]
    pub fn coincides_with(&self, other: &Point2) -> bool {
        (self.x - other.x).abs() <= COINCIDENT_EPSILON
            && (self.y - other.y).abs() <= COINCIDENT_EPSILON
    }
}

/// A finite line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point2 {
        self.start.midpoint(&self.end)
    }

    /// Shortest distance from `point` to any point of the segment
    ///
    /// The projection of `point` onto the supporting line is clamped to the
    /// segment. A zero-length segment degrades to a point distance.
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let norm = dx * dx + dy * dy;
        if norm <= COINCIDENT_EPSILON * COINCIDENT_EPSILON {
            return self.start.distance_to(point);
        }

        let u = ((point.x - self.start.x) * dx + (point.y - self.start.y) * dy) / norm;
        let u = u.clamp(0.0, 1.0);
        let closest = Point2::new(self.start.x + u * dx, self.start.y + u * dy);
        closest.distance_to(point)
    }
}

/// An ordered chain of points visited while printing one wall loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point2>,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn push(&mut self, point: Point2) {
        self.points.push(point);
    }

    pub fn last(&self) -> Option<&Point2> {
        self.points.last()
    }

    /// True when the first and last points coincide
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => first.coincides_with(last),
            _ => false,
        }
    }

    /// Consecutive point pairs, including the closing pair of a closed loop
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
    }

    /// Distance from `point` to the nearest segment, `None` for fewer than two points
    pub fn distance_to_point(&self, point: &Point2) -> Option<f64> {
        self.segments()
            .map(|segment| segment.distance_to_point(point))
            .min_by(f64::total_cmp)
    }
}

/// All wall polylines printed in one layer
///
/// Built incrementally from wall moves in printing order: a move that starts
/// where the current polyline ends extends it, any other move opens a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallSet {
    polylines: Vec<Polyline>,
}

impl WallSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a wall move from `from` to `to`
    pub fn add_move(&mut self, from: Point2, to: Point2) {
        if let Some(current) = self.polylines.last_mut() {
            if current.last().is_some_and(|last| last.coincides_with(&from)) {
                current.push(to);
                return;
            }
        }
        self.polylines.push(Polyline::from_points(vec![from, to]));
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.polylines
            .iter()
            .map(|p| p.points().len().saturating_sub(1))
            .sum()
    }

    /// Minimum distance from `point` to any wall segment, `None` when there are no walls
    pub fn distance_to_point(&self, point: &Point2) -> Option<f64> {
        self.polylines
            .iter()
            .filter_map(|polyline| polyline.distance_to_point(point))
            .min_by(f64::total_cmp)
    }
}

impl FromIterator<Polyline> for WallSet {
    fn from_iter<I: IntoIterator<Item = Polyline>>(iter: I) -> Self {
        Self {
            polylines: iter.into_iter().collect(),
        }
    }
}
