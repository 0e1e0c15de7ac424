//! Geometric shapes and the queries the physics engine needs from them.

use crate::math::{self as m, Transform, Vec2};
use itertools::Itertools;
use std::f64::consts::PI;

/// An error in the parameters given to a shape constructor.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ShapeError {
    #[error("A polygon needs at least 3 points, got {count}")]
    TooFewPoints { count: usize },
    #[error("Circle radius must be positive, got {radius}")]
    InvalidRadius { radius: f64 },
}

/// An axis-aligned bounding rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.x <= self.max.x
            && point.y <= self.max.y
    }

    /// Check if the y extents of two rects touch or overlap.
    #[inline]
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        !(other.min.y > self.max.y || self.min.y > other.max.y)
    }
}

/// A line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

/// A circle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawCircle", into = "RawCircle")
)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

// serialized form of a circle, validated on the way back in
#[cfg(feature = "serde-types")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawCircle {
    center: Vec2,
    radius: f64,
}

/// A convex polygon with counterclockwise winding.
///
/// The winding is fixed at construction, so the signed area of a polygon is never negative.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>")
)]
pub struct Polygon {
    points: Vec<Vec2>,
}

/// The variant of a [`Shape`] without its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Segment,
    Circle,
    Polygon,
}

/// Any shape a collider can have.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Segment(Segment),
    Circle(Circle),
    Polygon(Polygon),
}

//
// Segment
//

impl Segment {
    #[inline]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn centroid(&self) -> Vec2 {
        m::midpoint(self.a, self.b)
    }

    /// The length of the segment.
    #[inline]
    pub fn linear_mass_factor(&self) -> f64 {
        m::distance(self.a, self.b)
    }

    #[inline]
    pub fn angular_mass_factor(&self) -> f64 {
        m::distance_sq(self.a, self.b) / 12.0
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect {
            min: Vec2::new(self.a.x.min(self.b.x), self.a.y.min(self.b.y)),
            max: Vec2::new(self.a.x.max(self.b.x), self.a.y.max(self.b.y)),
        }
    }

    pub fn transform_into(&self, transform: &Transform, result: &mut Segment) {
        result.a = transform.apply(self.a);
        result.b = transform.apply(self.b);
    }

    /// Check if a point lies exactly on the segment.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let ab = self.b - self.a;
        let along = ab.dot(point);
        along >= ab.dot(self.a)
            && along <= ab.dot(self.b)
            && m::cross(ab, point) == m::cross(ab, self.a)
    }
}

//
// Circle
//

impl Circle {
    /// Create a circle.
    /// Returns an error if the radius isn't positive.
    pub fn new(center: Vec2, radius: f64) -> Result<Self, ShapeError> {
        if radius > 0.0 {
            Ok(Self { center, radius })
        } else {
            Err(ShapeError::InvalidRadius { radius })
        }
    }

    #[inline]
    pub fn centroid(&self) -> Vec2 {
        self.center
    }

    /// The area of the circle.
    #[inline]
    pub fn linear_mass_factor(&self) -> f64 {
        m::square(self.radius) * PI
    }

    #[inline]
    pub fn angular_mass_factor(&self) -> f64 {
        m::square(self.radius) / 2.0
    }

    pub fn bounding_rect(&self) -> Rect {
        let r = Vec2::broadcast(self.radius);
        Rect {
            min: self.center - r,
            max: self.center + r,
        }
    }

    pub fn transform_into(&self, transform: &Transform, result: &mut Circle) {
        result.center = transform.apply(self.center);
        result.radius = self.radius;
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        m::distance_sq(self.center, point) <= m::square(self.radius)
    }
}

//
// Polygon
//

impl Polygon {
    /// Create a polygon from its corner points in either winding order.
    /// Returns an error if there are fewer than 3 points.
    pub fn new(points: impl Into<Vec<Vec2>>) -> Result<Self, ShapeError> {
        let points = points.into();
        if points.len() < 3 {
            return Err(ShapeError::TooFewPoints {
                count: points.len(),
            });
        }
        Ok(Self::wound(points))
    }

    /// Create a polygon, reversing the points if they're wound clockwise.
    fn wound(points: Vec<Vec2>) -> Self {
        let mut poly = Self { points };
        if poly.linear_mass_factor() < 0.0 {
            poly.points.reverse();
        }
        poly
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Iterate over the edges of the polygon as `(start, end)` pairs,
    /// starting with the edge from the last point to the first.
    pub fn edges(&self) -> impl '_ + Iterator<Item = (Vec2, Vec2)> {
        edges(&self.points)
    }

    /// The centroid of the polygon's outline, weighting each edge midpoint by the edge's length.
    pub fn centroid(&self) -> Vec2 {
        let mut centroid = Vec2::zero();
        let mut weight = 0.0;
        for (a, b) in self.edges() {
            let side_length = m::distance(a, b);
            centroid += m::midpoint(a, b) * side_length;
            weight += side_length;
        }
        centroid / weight
    }

    /// The signed area of the polygon, computed with the shoelace formula.
    pub fn linear_mass_factor(&self) -> f64 {
        self.edges().map(|(a, b)| m::cross(a, b)).sum::<f64>() / 2.0
    }

    pub fn angular_mass_factor(&self) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (a, b) in self.edges() {
            let cross = m::cross(a, b);
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross * 6.0;
        }
        numerator / denominator - self.centroid().mag_sq()
    }

    pub fn bounding_rect(&self) -> Rect {
        let mut min = Vec2::broadcast(f64::INFINITY);
        let mut max = Vec2::broadcast(f64::NEG_INFINITY);
        for p in &self.points {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        Rect { min, max }
    }

    /// Transform every point into `result`, which is resized to match if needed.
    pub fn transform_into(&self, transform: &Transform, result: &mut Polygon) {
        result.points.clear();
        result
            .points
            .extend(self.points.iter().map(|p| transform.apply(*p)));
    }

    /// Check if a point is inside the polygon or on its boundary.
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.edges()
            .all(|(a, b)| m::cross(b - a, point - a) >= 0.0)
    }
}

pub(crate) fn edges(points: &[Vec2]) -> impl '_ + Iterator<Item = (Vec2, Vec2)> {
    points
        .last()
        .into_iter()
        .chain(points)
        .copied()
        .tuple_windows()
}

impl TryFrom<Vec<Vec2>> for Polygon {
    type Error = ShapeError;

    fn try_from(points: Vec<Vec2>) -> Result<Self, Self::Error> {
        Polygon::new(points)
    }
}

impl From<Polygon> for Vec<Vec2> {
    fn from(poly: Polygon) -> Self {
        poly.points
    }
}

#[cfg(feature = "serde-types")]
impl TryFrom<RawCircle> for Circle {
    type Error = ShapeError;

    fn try_from(raw: RawCircle) -> Result<Self, Self::Error> {
        Circle::new(raw.center, raw.radius)
    }
}

#[cfg(feature = "serde-types")]
impl From<Circle> for RawCircle {
    fn from(circle: Circle) -> Self {
        RawCircle {
            center: circle.center,
            radius: circle.radius,
        }
    }
}

//
// Shape
//

impl Shape {
    #[inline]
    pub fn segment(a: Vec2, b: Vec2) -> Self {
        Shape::Segment(Segment::new(a, b))
    }

    /// Create a circle shape.
    /// Returns an error if the radius isn't positive.
    #[inline]
    pub fn circle(center: Vec2, radius: f64) -> Result<Self, ShapeError> {
        Circle::new(center, radius).map(Shape::Circle)
    }

    /// Create a polygon shape from points in either winding order.
    /// Returns an error if there are fewer than 3 points.
    #[inline]
    pub fn polygon(points: impl Into<Vec<Vec2>>) -> Result<Self, ShapeError> {
        Polygon::new(points).map(Shape::Polygon)
    }

    /// Create an axis-aligned rectangle polygon with the given corners.
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Shape::Polygon(Polygon::wound(vec![
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ]))
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Segment(_) => ShapeKind::Segment,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    pub fn centroid(&self) -> Vec2 {
        match self {
            Shape::Segment(s) => s.centroid(),
            Shape::Circle(c) => c.centroid(),
            Shape::Polygon(p) => p.centroid(),
        }
    }

    /// Length, area or signed area depending on the variant.
    /// Multiplied by density this gives the mass of the shape.
    pub fn linear_mass_factor(&self) -> f64 {
        match self {
            Shape::Segment(s) => s.linear_mass_factor(),
            Shape::Circle(c) => c.linear_mass_factor(),
            Shape::Polygon(p) => p.linear_mass_factor(),
        }
    }

    /// Moment of inertia about the centroid divided by mass.
    pub fn angular_mass_factor(&self) -> f64 {
        match self {
            Shape::Segment(s) => s.angular_mass_factor(),
            Shape::Circle(c) => c.angular_mass_factor(),
            Shape::Polygon(p) => p.angular_mass_factor(),
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        match self {
            Shape::Segment(s) => s.bounding_rect(),
            Shape::Circle(c) => c.bounding_rect(),
            Shape::Polygon(p) => p.bounding_rect(),
        }
    }

    /// Write this shape transformed by `transform` into `result`,
    /// reusing its storage if it's the same variant.
    pub fn transform_into(&self, transform: &Transform, result: &mut Shape) {
        match (self, &mut *result) {
            (Shape::Segment(s), Shape::Segment(r)) => s.transform_into(transform, r),
            (Shape::Circle(c), Shape::Circle(r)) => c.transform_into(transform, r),
            (Shape::Polygon(p), Shape::Polygon(r)) => p.transform_into(transform, r),
            _ => *result = self.transformed(transform),
        }
    }

    /// Create a transformed copy of this shape.
    pub fn transformed(&self, transform: &Transform) -> Shape {
        let mut result = self.clone();
        self.transform_into(transform, &mut result);
        result
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        match self {
            Shape::Segment(s) => s.contains_point(point),
            Shape::Circle(c) => c.contains_point(point),
            Shape::Polygon(p) => p.contains_point(point),
        }
    }
}

//
// projections
//

/// Project a point onto the infinite line through `a` and `b`.
pub fn project_onto_line(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let t = ab.dot(p - a) / ab.mag_sq();
    a + ab * t
}

/// Find the point on the segment from `a` to `b` that is closest to `p`.
/// A zero-length segment projects everything onto `a`.
pub fn project_onto_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.mag_sq();
    if len_sq == 0.0 {
        return a;
    }
    let t = ab.dot(p - a) / len_sq;
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + ab * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn square(half: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ]
    }

    #[test]
    fn polygon_winding_is_normalized() {
        let ccw = Polygon::new(square(1.0)).unwrap();
        let mut reversed = square(1.0);
        reversed.reverse();
        let cw = Polygon::new(reversed).unwrap();
        assert_eq!(ccw.linear_mass_factor(), 4.0);
        assert_eq!(cw.linear_mass_factor(), 4.0);
    }

    #[test]
    fn random_convex_polygons_have_nonnegative_area() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let count = rng.gen_range(3..12);
            let center = Vec2::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
            let radius = rng.gen_range(0.1..5.0);
            let mut points: Vec<Vec2> = (0..count)
                .map(|i| {
                    let angle = i as f64 / count as f64 * 2.0 * PI;
                    center + m::rotate(Vec2::new(radius, 0.0), angle)
                })
                .collect();
            if rng.gen_bool(0.5) {
                points.reverse();
            }
            let poly = Polygon::new(points).unwrap();
            assert!(poly.linear_mass_factor() >= 0.0);
        }
    }

    #[test]
    fn too_few_points_or_bad_radius() {
        assert_eq!(
            Shape::polygon(vec![Vec2::zero(), Vec2::unit_x()]),
            Err(ShapeError::TooFewPoints { count: 2 })
        );
        assert_eq!(
            Shape::circle(Vec2::zero(), 0.0),
            Err(ShapeError::InvalidRadius { radius: 0.0 })
        );
    }

    #[test]
    fn edges_start_from_last_point() {
        let poly = Polygon::new(square(1.0)).unwrap();
        let edges: Vec<_> = poly.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], (Vec2::new(-1.0, 1.0), Vec2::new(-1.0, -1.0)));
        assert_eq!(edges[1], (Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn mass_factors() {
        let seg = Segment::new(Vec2::zero(), Vec2::new(3.0, 4.0));
        assert_eq!(seg.linear_mass_factor(), 5.0);
        assert_eq!(seg.angular_mass_factor(), 25.0 / 12.0);
        assert_eq!(seg.centroid(), Vec2::new(1.5, 2.0));

        let circle = Circle::new(Vec2::new(1.0, 1.0), 2.0).unwrap();
        assert!((circle.linear_mass_factor() - 4.0 * PI).abs() < 1e-12);
        assert_eq!(circle.angular_mass_factor(), 2.0);

        // 2x2 square: I/m = (w^2 + h^2) / 12
        let poly = Polygon::new(square(1.0)).unwrap();
        assert!((poly.angular_mass_factor() - 8.0 / 12.0).abs() < 1e-12);
        assert_eq!(poly.centroid(), Vec2::zero());
    }

    #[test]
    fn polygon_centroid_weights_edges_by_length() {
        let shifted: Vec<Vec2> = square(1.0)
            .into_iter()
            .map(|p| p + Vec2::new(3.0, -2.0))
            .collect();
        let poly = Polygon::new(shifted).unwrap();
        assert!((poly.centroid() - Vec2::new(3.0, -2.0)).mag() < 1e-12);
        // the second moment is about the centroid so translation doesn't change it
        assert!((poly.angular_mass_factor() - 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_rects() {
        let seg = Shape::segment(Vec2::new(2.0, -1.0), Vec2::new(-1.0, 3.0));
        assert_eq!(
            seg.bounding_rect(),
            Rect::new(Vec2::new(-1.0, -1.0), Vec2::new(2.0, 3.0))
        );
        let circle = Shape::circle(Vec2::new(1.0, 0.0), 0.5).unwrap();
        assert_eq!(
            circle.bounding_rect(),
            Rect::new(Vec2::new(0.5, -0.5), Vec2::new(1.5, 0.5))
        );
        let rect = Shape::rect(Vec2::new(-2.0, 0.0), Vec2::new(1.0, 4.0));
        assert_eq!(
            rect.bounding_rect(),
            Rect::new(Vec2::new(-2.0, 0.0), Vec2::new(1.0, 4.0))
        );
    }

    #[test]
    fn point_containment() {
        let seg = Segment::new(Vec2::zero(), Vec2::new(2.0, 0.0));
        assert!(seg.contains_point(Vec2::new(1.0, 0.0)));
        assert!(!seg.contains_point(Vec2::new(3.0, 0.0)));
        assert!(!seg.contains_point(Vec2::new(1.0, 0.1)));

        let circle = Circle::new(Vec2::zero(), 1.0).unwrap();
        assert!(circle.contains_point(Vec2::new(0.0, 1.0)));
        assert!(!circle.contains_point(Vec2::new(0.8, 0.8)));

        let poly = Polygon::new(square(1.0)).unwrap();
        assert!(poly.contains_point(Vec2::zero()));
        assert!(poly.contains_point(Vec2::new(1.0, 0.5)));
        assert!(!poly.contains_point(Vec2::new(1.1, 0.0)));

        let rect = Rect::new(Vec2::zero(), Vec2::new(1.0, 1.0));
        assert!(rect.contains_point(Vec2::new(1.0, 0.0)));
        assert!(!rect.contains_point(Vec2::new(-0.1, 0.5)));
    }

    #[test]
    fn transform_keeps_variant_and_size() {
        let t = Transform::new(Vec2::new(5.0, 0.0), PI / 2.0);
        let local = Shape::polygon(square(1.0)).unwrap();
        let mut world = local.clone();
        local.transform_into(&t, &mut world);
        let Shape::Polygon(poly) = &world else {
            panic!("transform changed the variant");
        };
        assert_eq!(poly.points().len(), 4);
        assert!((poly.centroid() - Vec2::new(5.0, 0.0)).mag() < 1e-12);
        assert!(poly.linear_mass_factor() > 0.0);

        let circle = Shape::circle(Vec2::new(1.0, 0.0), 2.0).unwrap();
        let Shape::Circle(moved) = circle.transformed(&t) else {
            panic!("transform changed the variant");
        };
        assert!((moved.center - Vec2::new(5.0, 1.0)).mag() < 1e-12);
        assert_eq!(moved.radius, 2.0);
    }

    #[test]
    fn projections() {
        let a = Vec2::zero();
        let b = Vec2::new(2.0, 0.0);
        assert_eq!(
            project_onto_line(a, b, Vec2::new(3.0, 1.0)),
            Vec2::new(3.0, 0.0)
        );
        assert_eq!(project_onto_segment(a, b, Vec2::new(3.0, 1.0)), b);
        assert_eq!(project_onto_segment(a, b, Vec2::new(-1.0, 1.0)), a);
        assert_eq!(
            project_onto_segment(a, b, Vec2::new(0.5, -1.0)),
            Vec2::new(0.5, 0.0)
        );
        // degenerate segment
        assert_eq!(project_onto_segment(b, b, Vec2::new(-1.0, 1.0)), b);
    }

    #[cfg(feature = "serde-types")]
    #[test]
    fn circle_radius_checked_on_deserialize() {
        let circle = Circle::new(Vec2::new(1.0, 2.0), 0.5).unwrap();
        let text = ron::to_string(&circle).unwrap();
        assert_eq!(ron::from_str::<Circle>(&text).unwrap(), circle);

        for radius in [0.0, -1.0] {
            let raw = RawCircle {
                center: Vec2::zero(),
                radius,
            };
            let text = ron::to_string(&raw).unwrap();
            assert!(ron::from_str::<Circle>(&text).is_err());
        }
    }
}
