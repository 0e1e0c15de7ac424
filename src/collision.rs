//! Narrow phase collision detection between pairs of shapes.

use crate::{
    math::{self as m, Vec2},
    shape::{self, Circle, Polygon, Segment, Shape},
};

/// An intersection between two shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Collision {
    /// A point in world space where the shapes touch.
    pub point: Vec2,
    /// The normal, facing away from the first shape.
    /// Moving the second shape by `normal * depth` separates the shapes.
    pub normal: Vec2,
    pub depth: f64,
}

impl Collision {
    fn flip(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Check two shapes for intersection.
pub fn collide(shape1: &Shape, shape2: &Shape) -> Option<Collision> {
    use Shape::*;
    match (shape1, shape2) {
        (Segment(s1), Segment(s2)) => segments(s1, s2),
        (Segment(s), Circle(c)) => segment_circle(s, c),
        (Segment(s), Polygon(p)) => segment_polygon(s, p),
        (Circle(c), Segment(s)) => segment_circle(s, c).map(Collision::flip),
        (Circle(c1), Circle(c2)) => circles(c1, c2),
        (Circle(c), Polygon(p)) => circle_polygon(c, p),
        (Polygon(p), Segment(s)) => segment_polygon(s, p).map(Collision::flip),
        (Polygon(p), Circle(c)) => circle_polygon(c, p).map(Collision::flip),
        (Polygon(p1), Polygon(p2)) => polygons(p1.points(), p2.points()),
    }
}

//
// SEGMENT <-> SEGMENT
//

/// Segments have no area to overlap with, so they never collide with each other.
fn segments(_s1: &Segment, _s2: &Segment) -> Option<Collision> {
    None
}

//
// CIRCLE <-> CIRCLE
//

fn circles(c1: &Circle, c2: &Circle) -> Option<Collision> {
    if m::distance_sq(c1.center, c2.center) > m::square(c1.radius + c2.radius) {
        return None;
    }
    // no well-defined normal for concentric circles
    if c1.center == c2.center {
        return None;
    }

    Some(Collision {
        point: m::midpoint(c1.center, c2.center),
        normal: m::normalize(c2.center - c1.center),
        depth: c1.radius + c2.radius - m::distance(c1.center, c2.center),
    })
}

//
// POLYGON <-> POLYGON
//

/// Separating axis test over convex point sets wound counterclockwise.
/// Two-point sets are treated as segments.
fn polygons(points1: &[Vec2], points2: &[Vec2]) -> Option<Collision> {
    let mut best = Collision {
        depth: f64::INFINITY,
        ..Default::default()
    };

    // outward normals of the first polygon, penetration of the second polygon's points
    for (a, b) in shape::edges(points1) {
        let side = b - a;
        if side == Vec2::zero() {
            continue;
        }
        let axis = m::normalize(m::right_normal(side));
        let edge_depth = a.dot(axis);
        let (depth, point) = deepest_point(points2, |p| edge_depth - p.dot(axis));
        if depth < 0.0 {
            return None;
        }
        if depth < best.depth {
            best = Collision {
                point,
                normal: axis,
                depth,
            };
        }
    }

    // inward normals of the second polygon so the normal still faces away from the first
    for (a, b) in shape::edges(points2) {
        let side = b - a;
        if side == Vec2::zero() {
            continue;
        }
        let axis = m::normalize(m::left_normal(side));
        let edge_depth = a.dot(axis);
        let (depth, point) = deepest_point(points1, |p| p.dot(axis) - edge_depth);
        if depth < 0.0 {
            return None;
        }
        if depth < best.depth {
            best = Collision {
                point,
                normal: axis,
                depth,
            };
        }
    }

    // only zero-length edges, nothing to test against
    if best.depth == f64::INFINITY {
        return None;
    }
    Some(best)
}

/// Find the maximum depth among the points.
/// Points tied at the maximum are averaged pairwise in iteration order.
fn deepest_point(points: &[Vec2], depth_of: impl Fn(Vec2) -> f64) -> (f64, Vec2) {
    let mut max_depth = f64::NEG_INFINITY;
    let mut deepest = Vec2::zero();
    for &point in points {
        let depth = depth_of(point);
        if depth > max_depth {
            max_depth = depth;
            deepest = point;
        } else if depth == max_depth {
            deepest = m::midpoint(deepest, point);
        }
    }
    (max_depth, deepest)
}

//
// SEGMENT <-> CIRCLE
//

fn segment_circle(s: &Segment, c: &Circle) -> Option<Collision> {
    // a zero-length segment has no direction to push along
    if s.a == s.b {
        return None;
    }
    let point = shape::project_onto_segment(s.a, s.b, c.center);
    if m::distance_sq(c.center, point) > m::square(c.radius) {
        return None;
    }

    Some(Collision {
        point,
        normal: m::normalize(c.center - point),
        depth: c.radius - m::distance(c.center, point),
    })
}

//
// SEGMENT <-> POLYGON
//

fn segment_polygon(s: &Segment, p: &Polygon) -> Option<Collision> {
    polygons(&[s.a, s.b], p.points())
}

//
// CIRCLE <-> POLYGON
//

fn circle_polygon(c: &Circle, p: &Polygon) -> Option<Collision> {
    let mut outside = false;
    let mut min_dist_sq = f64::INFINITY;
    let mut closest = Vec2::zero();

    for (a, b) in p.edges() {
        let axis = m::left_normal(b - a);
        if c.center.dot(axis) < a.dot(axis) {
            outside = true;
        }

        let point = shape::project_onto_segment(a, b, c.center);
        let dist_sq = m::distance_sq(point, c.center);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
            closest = point;
        }
    }

    let dist = min_dist_sq.sqrt();
    if outside {
        if dist > c.radius {
            return None;
        }
        Some(Collision {
            point: closest,
            normal: m::normalize(closest - c.center),
            depth: c.radius - dist,
        })
    } else {
        // center is inside the polygon, push out through the nearest edge
        Some(Collision {
            point: closest,
            normal: m::normalize(c.center - closest),
            depth: c.radius + dist,
        })
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::PI;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).mag() < 1e-9, "{a:?} != {b:?}");
    }

    fn circle(x: f64, y: f64, r: f64) -> Shape {
        Shape::circle(Vec2::new(x, y), r).unwrap()
    }

    fn square_at(center: Vec2, half: f64) -> Shape {
        let h = Vec2::broadcast(half);
        Shape::rect(center - h, center + h)
    }

    fn box_shape(center: Vec2, half_extents: Vec2, angle: f64) -> Shape {
        let t = m::Transform::new(center, angle);
        Shape::polygon(vec![
            t.apply(Vec2::new(-half_extents.x, -half_extents.y)),
            t.apply(Vec2::new(half_extents.x, -half_extents.y)),
            t.apply(Vec2::new(half_extents.x, half_extents.y)),
            t.apply(Vec2::new(-half_extents.x, half_extents.y)),
        ])
        .unwrap()
    }

    #[test]
    fn overlapping_circles() {
        let c = collide(&circle(0.0, 0.0, 1.0), &circle(1.5, 0.0, 1.0)).unwrap();
        assert_eq!(c.depth, 0.5);
        assert_eq!(c.normal, Vec2::new(1.0, 0.0));
        assert_eq!(c.point, Vec2::new(0.75, 0.0));
    }

    #[test]
    fn separate_or_concentric_circles() {
        assert_eq!(
            collide(&circle(0.0, 0.0, 1.0), &circle(2.5, 0.0, 1.0)),
            None
        );
        assert_eq!(
            collide(&circle(1.0, 1.0, 1.0), &circle(1.0, 1.0, 0.5)),
            None
        );

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let r1 = rng.gen_range(0.1..2.0);
            let r2 = rng.gen_range(0.1..2.0);
            let dir = m::rotate(Vec2::unit_x(), rng.gen_range(0.0..2.0 * PI));
            let dist = r1 + r2 + rng.gen_range(0.01..5.0);
            let c1 = Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let c2 = c1 + dir * dist;
            assert_eq!(
                collide(&circle(c1.x, c1.y, r1), &circle(c2.x, c2.y, r2)),
                None
            );
        }
    }

    #[test]
    fn overlapping_squares() {
        let s1 = square_at(Vec2::zero(), 1.0);
        let s2 = square_at(Vec2::new(1.0, 0.0), 1.0);
        let c = collide(&s1, &s2).unwrap();
        assert_eq!(c.depth, 1.0);
        assert_eq!(c.normal, Vec2::new(1.0, 0.0));
        // both corners of the second square on the left edge are equally deep
        assert_eq!(c.point, Vec2::zero());

        let flipped = collide(&s2, &s1).unwrap();
        assert_eq!(flipped.depth, 1.0);
        assert_eq!(flipped.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn disjoint_polygons() {
        let s1 = square_at(Vec2::zero(), 1.0);
        let s2 = box_shape(Vec2::new(3.0, 0.5), Vec2::new(0.5, 0.5), 0.3);
        assert_eq!(collide(&s1, &s2), None);
        assert_eq!(collide(&s2, &s1), None);
    }

    #[test]
    fn segments_never_collide() {
        let s1 = Shape::segment(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let s2 = Shape::segment(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0));
        assert_eq!(collide(&s1, &s2), None);
    }

    #[test]
    fn segment_and_circle() {
        let seg = Shape::segment(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let c = collide(&seg, &circle(0.0, 0.5, 1.0)).unwrap();
        assert_eq!(c.point, Vec2::zero());
        assert_eq!(c.normal, Vec2::new(0.0, 1.0));
        assert_eq!(c.depth, 0.5);

        let flipped = collide(&circle(0.0, 0.5, 1.0), &seg).unwrap();
        assert_eq!(flipped.normal, Vec2::new(0.0, -1.0));
        assert_eq!(flipped.depth, 0.5);

        // past the end of the segment
        let c = collide(&seg, &circle(1.5, 0.5, 1.0)).unwrap();
        assert_eq!(c.point, Vec2::new(1.0, 0.0));
        assert_eq!(collide(&seg, &circle(2.5, 0.0, 1.0)), None);
    }

    #[test]
    fn zero_length_segment_never_collides() {
        let point = Vec2::new(0.5, 0.0);
        let seg = Shape::segment(point, point);
        let around = circle(0.5, 0.25, 1.0);
        assert_eq!(collide(&seg, &around), None);
        assert_eq!(collide(&around, &seg), None);

        // degenerate segment sitting exactly on the circle's center
        let centered = circle(0.5, 0.0, 1.0);
        assert_eq!(collide(&seg, &centered), None);
        assert_eq!(collide(&centered, &seg), None);

        let far = Shape::segment(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert_eq!(collide(&far, &circle(0.0, 0.0, 1.0)), None);
    }

    #[test]
    fn segment_and_polygon() {
        let seg = Shape::segment(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0));
        let poly = square_at(Vec2::new(0.0, 0.5), 1.0);
        let c = collide(&seg, &poly).unwrap();
        assert_close(c.normal, Vec2::new(0.0, 1.0));
        assert!((c.depth - 0.5).abs() < 1e-12);
        assert_close(c.point, Vec2::new(0.0, -0.5));

        let flipped = collide(&poly, &seg).unwrap();
        assert_close(flipped.normal, Vec2::new(0.0, -1.0));

        let above = square_at(Vec2::new(0.0, 2.0), 1.0);
        assert_eq!(collide(&seg, &above), None);
    }

    #[test]
    fn circle_outside_polygon() {
        let poly = square_at(Vec2::zero(), 1.0);
        let c = collide(&circle(1.5, 0.0, 1.0), &poly).unwrap();
        assert_eq!(c.point, Vec2::new(1.0, 0.0));
        assert_eq!(c.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(c.depth, 0.5);

        let flipped = collide(&poly, &circle(1.5, 0.0, 1.0)).unwrap();
        assert_eq!(flipped.normal, Vec2::new(1.0, 0.0));

        assert_eq!(collide(&circle(2.5, 0.0, 1.0), &poly), None);
        // near a corner but not touching it
        assert_eq!(collide(&circle(1.8, 1.8, 1.0), &poly), None);
    }

    #[test]
    fn circle_inside_polygon() {
        let poly = square_at(Vec2::zero(), 2.0);
        let c = collide(&circle(0.5, 0.0, 1.0), &poly).unwrap();
        assert_eq!(c.point, Vec2::new(2.0, 0.0));
        assert_eq!(c.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(c.depth, 2.5);
    }

    #[test]
    fn collisions_are_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut circle_hits = 0;
        let mut box_hits = 0;
        for _ in 0..500 {
            let c1 = circle(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(0.2..1.5),
            );
            let c2 = circle(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(0.2..1.5),
            );
            match (collide(&c1, &c2), collide(&c2, &c1)) {
                (Some(a), Some(b)) => {
                    circle_hits += 1;
                    assert!((a.depth - b.depth).abs() < 1e-12);
                    assert_close(a.normal, -b.normal);
                    assert_close(a.point, b.point);
                }
                (None, None) => {}
                other => panic!("asymmetric circle result {other:?}"),
            }

            let b1 = box_shape(
                Vec2::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5)),
                Vec2::new(rng.gen_range(0.2..1.0), rng.gen_range(0.2..1.0)),
                rng.gen_range(0.0..PI),
            );
            let b2 = box_shape(
                Vec2::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5)),
                Vec2::new(rng.gen_range(0.2..1.0), rng.gen_range(0.2..1.0)),
                rng.gen_range(0.0..PI),
            );
            match (collide(&b1, &b2), collide(&b2, &b1)) {
                (Some(a), Some(b)) => {
                    box_hits += 1;
                    assert!((a.depth - b.depth).abs() < 1e-9);
                    assert!(a.depth >= 0.0);
                    assert_close(a.normal, -b.normal);
                }
                (None, None) => {}
                other => panic!("asymmetric polygon result {other:?}"),
            }
        }
        // make sure the random cases actually exercised both branches
        assert!(circle_hits > 0 && circle_hits < 500);
        assert!(box_hits > 0 && box_hits < 500);
    }

    #[test]
    fn moving_along_normal_separates_polygons() {
        let s1 = box_shape(Vec2::zero(), Vec2::new(1.0, 0.5), 0.2);
        let s2 = box_shape(Vec2::new(1.2, 0.4), Vec2::new(0.6, 0.6), -0.4);
        let c = collide(&s1, &s2).unwrap();
        let pushed = s2.transformed(&m::Transform::new(c.normal * (c.depth + 1e-6), 0.0));
        assert_eq!(collide(&s1, &pushed), None);
    }
}
