//! Types, aliases and helper operations for doing 2D math with `ultraviolet`.
pub use ultraviolet as uv;

pub type Vec2 = uv::DVec2;

/// A rigid transformation, i.e. a rotation followed by a translation.
///
/// The sine and cosine of the rotation are stored instead of the angle
/// so that transforming many points doesn't recompute any trigonometry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub translation: Vec2,
    pub sin: f64,
    pub cos: f64,
}

impl Transform {
    /// Create a transform that rotates by `rotation` radians and then translates.
    #[inline]
    pub fn new(translation: Vec2, rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Self {
            translation,
            sin,
            cos,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vec2::zero(),
            sin: 0.0,
            cos: 1.0,
        }
    }

    /// Map a point from local space to the space this transform points into.
    #[inline]
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotate(point) + self.translation
    }

    /// Apply only the rotational part of the transform to a vector.
    #[inline]
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// The transform that undoes this one, computed in closed form.
    #[inline]
    pub fn inverse(&self) -> Self {
        let t = self.translation;
        Self {
            translation: Vec2::new(
                -self.cos * t.x - self.sin * t.y,
                self.sin * t.x - self.cos * t.y,
            ),
            sin: -self.sin,
            cos: self.cos,
        }
    }

    /// The rotation angle in radians, in the range `[-pi, pi]`.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.sin.atan2(self.cos)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul<Vec2> for Transform {
    type Output = Vec2;

    #[inline]
    fn mul(self, rhs: Vec2) -> Vec2 {
        self.apply(rhs)
    }
}

// Vec2 utils

#[inline]
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
#[inline]
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// The z component of the 3D cross product, or equivalently the wedge product `v ^ w`.
#[inline]
pub fn cross(v: Vec2, w: Vec2) -> f64 {
    v.x * w.y - v.y * w.x
}

/// Rotate a vector counterclockwise by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

#[inline]
pub fn midpoint(v: Vec2, w: Vec2) -> Vec2 {
    (v + w) * 0.5
}

#[inline]
pub fn distance(v: Vec2, w: Vec2) -> f64 {
    distance_sq(v, w).sqrt()
}

#[inline]
pub fn distance_sq(v: Vec2, w: Vec2) -> f64 {
    square(v.x - w.x) + square(v.y - w.y)
}

/// Normalize a vector, returning the zero vector if its length is zero.
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let mag = v.mag();
    if mag == 0.0 {
        Vec2::zero()
    } else {
        v / mag
    }
}

// scalar utils

#[inline]
pub fn square(x: f64) -> f64 {
    x * x
}

/// Like `f64::signum`, but zero for zero.
#[inline]
pub fn signum(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
pub fn clamp(x: f64, low: f64, high: f64) -> f64 {
    x.max(low).min(high)
}

/// Fractional part of `x`, always in `[0, 1)`.
#[inline]
pub fn frac(x: f64) -> f64 {
    x - x.floor()
}
