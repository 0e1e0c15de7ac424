use super::Collider;
use crate::math::{self as m, Transform, Vec2};

/// How a body reacts to the rest of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyType {
    /// Affected by gravity, forces and collisions.
    Dynamic,
    /// Moves with whatever velocity it's given but isn't pushed by anything.
    Kinematic,
    /// Never moves. Velocity is reset to zero every step.
    Static,
}

/// Velocity of a body.
///
// Equivalent to a Vec3 but with names for the translational and rotational part.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    /// Linear velocity in metres per second.
    pub linear: Vec2,
    /// Angular velocity in radians per second.
    pub angular: f64,
}

impl Velocity {
    /// Get the linear velocity of a point at `offset` from the body's position.
    #[inline]
    pub fn point_velocity(&self, offset: Vec2) -> Vec2 {
        let tangent = m::left_normal(offset) * self.angular;
        self.linear + tangent
    }
}

impl std::ops::Add for Velocity {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
            angular: self.angular + other.angular,
        }
    }
}

impl std::ops::AddAssign for Velocity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::ops::Mul<f64> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f64) -> Self::Output {
        Velocity {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// Mass or moment of inertia of a body, which can be infinite.
///
/// The inverse is stored alongside the value since the solver only ever divides by mass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Mass {
    Finite {
        mass: f64,
        inverse: f64,
    },
    #[default]
    Infinite,
}

impl From<f64> for Mass {
    /// Zero or negative mass is treated as infinite.
    #[inline]
    fn from(mass: f64) -> Self {
        if mass > 0.0 {
            Mass::Finite {
                mass,
                inverse: 1.0 / mass,
            }
        } else {
            Mass::Infinite
        }
    }
}

impl Mass {
    /// Get the inverse of the mass, which is zero if the mass is infinite.
    #[inline]
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }

    /// The mass a body contributes when combined with more mass.
    /// An infinite mass here means there's nothing to combine, so it counts as zero.
    #[inline]
    fn accumulated(&self) -> f64 {
        match self {
            Mass::Finite { mass, .. } => *mass,
            Mass::Infinite => 0.0,
        }
    }
}

/// The total mass of a body, aggregated from its colliders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MassProperties {
    /// Center of mass in body-local coordinates.
    pub center_of_mass: Vec2,
    pub linear: Mass,
    /// Moment of inertia about the center of mass.
    pub angular: Mass,
}

impl MassProperties {
    /// Mass of a single collider computed from its local shape and density.
    pub fn of_collider(coll: &Collider) -> (Vec2, f64, f64) {
        let shape = coll.local_shape();
        let linear = coll.density() * shape.linear_mass_factor();
        let angular = linear * shape.angular_mass_factor();
        (shape.centroid(), linear, angular)
    }

    /// Combine another piece of mass into this one.
    pub fn add(&mut self, center: Vec2, linear: f64, angular: f64) {
        let own_linear = self.linear.accumulated();
        let own_angular = self.angular.accumulated();
        let total_linear = own_linear + linear;
        if total_linear <= 0.0 {
            *self = Self::default();
            return;
        }

        let new_center = (self.center_of_mass * own_linear + center * linear) / total_linear;
        // parallel axis theorem for both contributors
        let total_angular = own_angular
            + own_linear * m::distance_sq(self.center_of_mass, new_center)
            + angular
            + linear * m::distance_sq(center, new_center);

        self.center_of_mass = new_center;
        self.linear = Mass::from(total_linear);
        self.angular = Mass::from(total_angular);
    }

    /// Remove a piece of mass previously combined with [`add`][Self::add].
    /// If no mass remains, the result is infinite mass at the origin.
    pub fn subtract(&mut self, center: Vec2, linear: f64, angular: f64) {
        let own_linear = self.linear.accumulated();
        let own_angular = self.angular.accumulated();
        let rest_linear = own_linear - linear;
        if rest_linear <= 0.0 {
            *self = Self::default();
            return;
        }

        let new_center = (self.center_of_mass * own_linear - center * linear) / rest_linear;
        let rest_angular = own_angular
            + own_linear * m::distance_sq(self.center_of_mass, new_center)
            - angular
            - linear * m::distance_sq(center, new_center);

        self.center_of_mass = new_center;
        self.linear = Mass::from(rest_linear);
        self.angular = Mass::from(rest_angular);
    }
}

/// A rigid body. Attach colliders to it to give it shape and mass.
///
/// Obtained from [`World::create_body`][super::World::create_body].
#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub(super) ty: BodyType,
    pub(super) position: Vec2,
    pub(super) angle: f64,
    pub velocity: Velocity,
    pub(super) force: Vec2,
    pub(super) torque: f64,
    /// Extra velocity used to push overlapping bodies apart,
    /// only partially kept after integration.
    pub(super) correction: Velocity,
    pub(super) mass: MassProperties,
    // inverse masses as seen by the solver,
    // zero for anything that isn't dynamic
    pub(super) inv_linear: f64,
    pub(super) inv_angular: f64,
    pub(super) transform_dirty: bool,
}

impl Body {
    pub(super) fn new(ty: BodyType) -> Self {
        Self {
            ty,
            position: Vec2::zero(),
            angle: 0.0,
            velocity: Velocity::default(),
            force: Vec2::zero(),
            torque: 0.0,
            correction: Velocity::default(),
            mass: MassProperties::default(),
            inv_linear: 0.0,
            inv_angular: 0.0,
            transform_dirty: false,
        }
    }

    #[inline]
    pub fn body_type(&self) -> BodyType {
        self.ty
    }

    /// Change the type of the body. Takes effect on the solver immediately.
    pub fn set_body_type(&mut self, ty: BodyType) {
        self.ty = ty;
        self.refresh_inverse_mass();
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Move the body. Colliders follow on the next step
    /// or [`World::refresh_transforms`][super::World::refresh_transforms].
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.transform_dirty = true;
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
        self.transform_dirty = true;
    }

    /// Force accumulated since the last step.
    #[inline]
    pub fn force(&self) -> Vec2 {
        self.force
    }

    #[inline]
    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Mass aggregated from the body's colliders, regardless of body type.
    #[inline]
    pub fn mass(&self) -> &MassProperties {
        &self.mass
    }

    /// Inverse linear mass used when applying impulses.
    /// Zero for non-dynamic bodies.
    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        self.inv_linear
    }

    /// Inverse moment of inertia used when applying impulses.
    /// Zero for non-dynamic bodies.
    #[inline]
    pub fn inverse_moment_of_inertia(&self) -> f64 {
        self.inv_angular
    }

    /// The transformation from body-local space to world space.
    #[inline]
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.angle)
    }

    #[inline]
    pub fn inverse_transform(&self) -> Transform {
        self.transform().inverse()
    }

    /// Whether the world-space caches of this body's colliders and joints are out of date.
    #[inline]
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    //
    // impulses and forces
    //

    /// Apply an impulse given in body-local space at a body-local point.
    pub fn apply_impulse_at_local_point(&mut self, local_point: Vec2, impulse: Vec2) {
        self.velocity.linear += m::rotate(impulse, self.angle) * self.inv_linear;
        self.velocity.angular += m::cross(local_point, impulse) * self.inv_angular;
    }

    /// Apply an impulse given in world space at a world-space point.
    pub fn apply_impulse_at_world_point(&mut self, world_point: Vec2, impulse: Vec2) {
        self.velocity.linear += impulse * self.inv_linear;
        self.velocity.angular += m::cross(world_point - self.position, impulse) * self.inv_angular;
    }

    /// Apply a force given in body-local space at a body-local point.
    /// Forces accumulate until the next step.
    pub fn apply_force_at_local_point(&mut self, local_point: Vec2, force: Vec2) {
        self.force += m::rotate(force, self.angle);
        self.torque += m::cross(local_point, force);
    }

    /// Apply a force given in world space at a world-space point.
    /// Forces accumulate until the next step.
    pub fn apply_force_at_world_point(&mut self, world_point: Vec2, force: Vec2) {
        self.force += force;
        self.torque += m::cross(world_point - self.position, force);
    }

    pub(super) fn apply_correction_impulse(&mut self, world_point: Vec2, impulse: Vec2) {
        self.correction.linear += impulse * self.inv_linear;
        self.correction.angular +=
            m::cross(world_point - self.position, impulse) * self.inv_angular;
    }

    //
    // step stages
    //

    pub(super) fn refresh_inverse_mass(&mut self) {
        match self.ty {
            BodyType::Dynamic => {
                self.inv_linear = self.mass.linear.inv();
                self.inv_angular = self.mass.angular.inv();
            }
            BodyType::Kinematic | BodyType::Static => {
                self.inv_linear = 0.0;
                self.inv_angular = 0.0;
            }
        }
    }

    pub(super) fn integrate_forces(&mut self, gravity: Vec2, dt: f64) {
        self.refresh_inverse_mass();
        match self.ty {
            BodyType::Dynamic => {
                self.velocity.linear += gravity * dt;
                self.velocity.linear += self.force * (self.inv_linear * dt);
                self.velocity.angular += self.torque * self.inv_angular * dt;
            }
            BodyType::Kinematic => {}
            BodyType::Static => {
                self.velocity = Velocity::default();
            }
        }
        self.force = Vec2::zero();
        self.torque = 0.0;
        self.correction = Velocity::default();
    }

    pub(super) fn integrate_position(&mut self, correction_gain: f64, dt: f64) {
        let total = self.velocity + self.correction;
        let position_change = total.linear * dt;
        let angle_change = total.angular * dt;
        self.position += position_change;
        self.angle += angle_change;
        self.velocity += self.correction * correction_gain;

        if position_change != Vec2::zero() || angle_change != 0.0 {
            self.transform_dirty = true;
        }
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mass_from_nonpositive_is_infinite() {
        assert_eq!(Mass::from(0.0), Mass::Infinite);
        assert_eq!(Mass::from(-1.0).inv(), 0.0);
        assert_eq!(Mass::from(4.0).inv(), 0.25);
    }

    #[test]
    fn combine_and_remove_mass() {
        let mut props = MassProperties::default();
        // two unit circles of density 1
        let (lin, ang) = (PI, PI * 0.5);
        props.add(Vec2::new(-1.0, 0.0), lin, ang);
        props.add(Vec2::new(1.0, 0.0), lin, ang);
        assert!((props.center_of_mass - Vec2::zero()).mag() < 1e-12);
        assert!(close(props.linear.inv(), 1.0 / (2.0 * PI)));
        assert!(close(props.angular.inv(), 1.0 / (3.0 * PI)));

        props.subtract(Vec2::new(1.0, 0.0), lin, ang);
        assert!((props.center_of_mass - Vec2::new(-1.0, 0.0)).mag() < 1e-9);
        assert!(close(props.linear.inv(), 1.0 / PI));
        assert!(close(props.angular.inv(), 1.0 / (0.5 * PI)));

        props.subtract(Vec2::new(-1.0, 0.0), lin, ang);
        assert_eq!(props, MassProperties::default());
    }

    #[test]
    fn static_bodies_stop_and_ignore_forces() {
        let mut body = Body::new(BodyType::Static);
        body.mass.add(Vec2::zero(), 1.0, 1.0);
        body.velocity.linear = Vec2::new(3.0, 0.0);
        body.apply_force_at_world_point(Vec2::zero(), Vec2::new(10.0, 0.0));
        body.integrate_forces(Vec2::new(0.0, -10.0), 0.5);
        assert_eq!(body.velocity, Velocity::default());
        assert_eq!(body.force(), Vec2::zero());
        assert_eq!(body.inverse_mass(), 0.0);
    }

    #[test]
    fn kinematic_bodies_keep_velocity() {
        let mut body = Body::new(BodyType::Kinematic);
        body.velocity.linear = Vec2::new(1.0, 2.0);
        body.integrate_forces(Vec2::new(0.0, -10.0), 1.0);
        assert_eq!(body.velocity.linear, Vec2::new(1.0, 2.0));
        body.integrate_position(0.1, 0.5);
        assert_eq!(body.position(), Vec2::new(0.5, 1.0));
        assert!(body.is_transform_dirty());
    }

    #[test]
    fn dynamic_bodies_integrate_forces() {
        let mut body = Body::new(BodyType::Dynamic);
        body.mass.add(Vec2::zero(), 2.0, 4.0);
        body.apply_force_at_world_point(Vec2::new(0.0, 1.0), Vec2::new(2.0, 0.0));
        body.integrate_forces(Vec2::new(0.0, -10.0), 0.5);
        assert_eq!(body.velocity.linear, Vec2::new(0.5, -5.0));
        // torque = cross((0, 1), (2, 0)) = -2
        assert!(close(body.velocity.angular, -2.0 * 0.25 * 0.5));
        assert_eq!(body.torque(), 0.0);
    }

    #[test]
    fn impulses_at_points() {
        let mut body = Body::new(BodyType::Dynamic);
        body.mass.add(Vec2::zero(), 1.0, 1.0);
        body.refresh_inverse_mass();
        body.set_position(Vec2::new(1.0, 0.0));
        body.apply_impulse_at_world_point(Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.velocity.linear, Vec2::new(1.0, 0.0));
        assert_eq!(body.velocity.angular, -1.0);

        body.velocity = Velocity::default();
        body.set_angle(PI / 2.0);
        body.apply_impulse_at_local_point(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!((body.velocity.linear - Vec2::new(-1.0, 0.0)).mag() < 1e-12);
        assert_eq!(body.velocity.angular, 1.0);
    }

    #[test]
    fn correction_velocity_is_partially_kept() {
        let mut body = Body::new(BodyType::Dynamic);
        body.mass.add(Vec2::zero(), 1.0, 1.0);
        body.refresh_inverse_mass();
        body.apply_correction_impulse(Vec2::zero(), Vec2::new(1.0, 0.0));
        body.integrate_position(0.1, 1.0);
        assert_eq!(body.position(), Vec2::new(1.0, 0.0));
        assert!((body.velocity.linear - Vec2::new(0.1, 0.0)).mag() < 1e-12);
    }

    #[test]
    fn point_velocity_includes_rotation() {
        let vel = Velocity {
            linear: Vec2::new(1.0, 0.0),
            angular: 2.0,
        };
        assert_eq!(vel.point_velocity(Vec2::new(1.0, 0.0)), Vec2::new(1.0, 2.0));
    }
}
