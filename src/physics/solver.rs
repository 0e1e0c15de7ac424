//! Single-pass impulse resolution of contacts and joints.
//!
//! Each pass snapshots the state of both bodies involved,
//! computes an impulse from the snapshot and applies it to the live bodies.

use super::{Body, BodyKey, Contact, EntitySet, JointType};
use crate::math::{self as m, Vec2};

use thunderdome as td;

// helper to reduce duplication when fetching info for pairs of bodies
fn map_pair<T, R>(pair: &[T; 2], f: impl Fn(&T) -> R) -> [R; 2] {
    [f(&pair[0]), f(&pair[1])]
}

fn body_pair(bodies: &td::Arena<Body>, keys: [BodyKey; 2]) -> Option<[Body; 2]> {
    Some([*bodies.get(keys[0].0)?, *bodies.get(keys[1].0)?])
}

/// Inverse mass of a body as seen by an impulse along `dir` applied at `offset` from its position.
#[inline]
fn inverse_mass_along(body: &Body, offset: Vec2, dir: Vec2) -> f64 {
    body.inv_linear + body.inv_angular * m::square(dir.dot(m::left_normal(offset)))
}

fn combined_inverse_mass(bodies: &[Body; 2], offsets: &[Vec2; 2], dir: Vec2) -> f64 {
    inverse_mass_along(&bodies[0], offsets[0], dir)
        + inverse_mass_along(&bodies[1], offsets[1], dir)
}

/// Velocity of the second body's point relative to the first body's point.
#[inline]
fn relative_velocity(bodies: &[Body; 2], offsets: &[Vec2; 2]) -> Vec2 {
    bodies[1].velocity.point_velocity(offsets[1]) - bodies[0].velocity.point_velocity(offsets[0])
}

/// Apply `impulse` to the second body and its opposite to the first.
fn apply_opposed(
    bodies: &mut td::Arena<Body>,
    keys: [BodyKey; 2],
    impulse: Vec2,
    apply: impl Fn(&mut Body, Vec2),
) {
    if let Some(body) = bodies.get_mut(keys[0].0) {
        apply(body, -impulse);
    }
    if let Some(body) = bodies.get_mut(keys[1].0) {
        apply(body, impulse);
    }
}

/// Remove approaching normal velocity at every contact, with restitution and Coulomb friction.
pub(super) fn resolve_velocities(bodies: &mut td::Arena<Body>, contacts: &[Contact]) {
    tracy_span!("resolve velocities");

    for contact in contacts {
        let Some(pair) = body_pair(bodies, contact.bodies) else {
            continue;
        };
        let point = contact.collision.point;
        let normal = contact.collision.normal;
        let offsets = map_pair(&pair, |b| point - b.position);
        let rel_vel = relative_velocity(&pair, &offsets);

        let normal_vel = normal.dot(rel_vel);
        if normal_vel >= 0.0 {
            continue;
        }
        let normal_inv_mass = combined_inverse_mass(&pair, &offsets, normal);
        if normal_inv_mass <= 0.0 {
            continue;
        }
        let normal_impulse = -normal_vel * (1.0 + contact.restitution) / normal_inv_mass;

        let tangent = m::right_normal(normal);
        let tangent_vel = tangent.dot(rel_vel);
        let tangent_inv_mass = combined_inverse_mass(&pair, &offsets, tangent);
        let mut friction_impulse = if tangent_inv_mass > 0.0 {
            -tangent_vel * contact.static_friction / tangent_inv_mass
        } else {
            0.0
        };
        // past the static friction limit, slide with dynamic friction
        if friction_impulse.abs() > normal_impulse.abs() * contact.static_friction {
            friction_impulse =
                m::signum(friction_impulse) * normal_impulse.abs() * contact.dynamic_friction;
        }

        let impulse = normal * normal_impulse + tangent * friction_impulse;
        apply_opposed(bodies, contact.bodies, impulse, |body, imp| {
            body.apply_impulse_at_world_point(point, imp)
        });
    }
}

/// Add correction velocity pushing overlapping bodies apart
/// fast enough to resolve the overlap within one step.
pub(super) fn correct_positions(bodies: &mut td::Arena<Body>, contacts: &[Contact], dt: f64) {
    tracy_span!("correct positions");

    for contact in contacts {
        let Some(pair) = body_pair(bodies, contact.bodies) else {
            continue;
        };
        let point = contact.collision.point;
        let normal = contact.collision.normal;
        let offsets = map_pair(&pair, |b| point - b.position);
        let normal_vel = normal.dot(relative_velocity(&pair, &offsets));

        let bias = contact.collision.depth / dt - normal_vel;
        if bias <= 0.0 {
            continue;
        }
        let inv_mass = combined_inverse_mass(&pair, &offsets, normal);
        if inv_mass <= 0.0 {
            continue;
        }

        let impulse = normal * (bias / inv_mass);
        apply_opposed(bodies, contact.bodies, impulse, |body, imp| {
            body.apply_correction_impulse(point, imp)
        });
    }
}

/// Add correction velocity pulling joint anchors together,
/// and for fixed joints, rotating the bodies back to the same angle.
pub(super) fn solve_joints(set: &mut EntitySet, dt: f64) {
    tracy_span!("solve joints");

    for joint_key in set.joint_lists.items(set.world_joints) {
        let Some(joint) = set.joints.get(joint_key.0) else {
            continue;
        };
        let Some(pair) = body_pair(&set.bodies, joint.bodies) else {
            continue;
        };
        let anchors = joint.world_anchors;

        let displacement = anchors[1] - anchors[0];
        let distance = displacement.mag();
        if distance != 0.0 {
            let normal = displacement / distance;
            let offsets = [anchors[0] - pair[0].position, anchors[1] - pair[1].position];
            let normal_vel = normal.dot(relative_velocity(&pair, &offsets));
            let bias = distance / dt - normal_vel;
            let inv_mass = combined_inverse_mass(&pair, &offsets, normal);
            if inv_mass > 0.0 {
                let impulse = normal * (bias / inv_mass);
                if let Some(body) = set.bodies.get_mut(joint.bodies[0].0) {
                    body.apply_correction_impulse(anchors[0], impulse);
                }
                if let Some(body) = set.bodies.get_mut(joint.bodies[1].0) {
                    body.apply_correction_impulse(anchors[1], -impulse);
                }
            }
        }

        if joint.ty != JointType::Fixed {
            continue;
        }
        let relative_angle = pair[1].angle - pair[0].angle;
        if relative_angle == 0.0 {
            continue;
        }
        let relative_angular_vel = pair[1].velocity.angular - pair[0].velocity.angular;
        let angular_impulse = relative_angle / dt - relative_angular_vel;
        let inv_inertias = map_pair(&pair, |b| b.inv_angular);
        let combined = inv_inertias[0] + inv_inertias[1];
        if combined <= 0.0 {
            continue;
        }
        if let Some(body) = set.bodies.get_mut(joint.bodies[0].0) {
            body.correction.angular += angular_impulse * inv_inertias[0] / combined;
        }
        if let Some(body) = set.bodies.get_mut(joint.bodies[1].0) {
            body.correction.angular -= angular_impulse * inv_inertias[1] / combined;
        }
    }
}
