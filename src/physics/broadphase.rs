//! Sort-and-sweep pruning of collider pairs followed by the narrow phase.
//!
//! The world collider list is kept approximately sorted by the left edge of each
//! collider's bounding rect. Objects move little between steps, so a single
//! insertion sort pass per step keeps the list close to sorted at low cost.

use super::{BodyType, Collider, CollisionCallback, Contact, EntitySet, StepError};
use crate::{collision::collide, list::NodeKey};

fn min_x(set: &EntitySet, node: NodeKey) -> f64 {
    set.collider_lists
        .item(node)
        .and_then(|key| set.colliders.get(key.0))
        .map_or(f64::NEG_INFINITY, |coll| coll.bounding_rect.min.x)
}

/// Run one insertion sort pass over the world collider list,
/// moving each collider backwards while it starts further left than its predecessor.
pub(super) fn sort_colliders(set: &mut EntitySet) {
    tracy_span!("sort colliders");

    let mut cursor = set.collider_lists.first(set.world_colliders);
    while let Some(node) = cursor {
        cursor = set.collider_lists.next(node);
        while let Some(prev) = set.collider_lists.prev(node) {
            if min_x(set, node) < min_x(set, prev) {
                set.collider_lists.swap_with_prev(node);
            } else {
                break;
            }
        }
    }
}

/// Run every callback that applies to a touching pair.
/// All of them are called even if an earlier one already rejected the pair.
fn callbacks_allow(
    world_callback: Option<&CollisionCallback>,
    c1: &Collider,
    c2: &Collider,
) -> bool {
    let mut allowed = true;
    if let Some(callback) = world_callback {
        allowed &= callback(c1, c2);
        allowed &= callback(c2, c1);
    }
    if let Some(callback) = c1.callback() {
        allowed &= callback(c1, c2);
    }
    if let Some(callback) = c2.callback() {
        allowed &= callback(c2, c1);
    }
    allowed
}

/// Find all touching collider pairs that need to be pushed apart, in broad phase order.
///
/// Returns the number of pairs that were passed to the narrow phase,
/// or an error if more than `capacity` contacts are found.
pub(super) fn find_contacts(
    set: &EntitySet,
    world_callback: Option<&CollisionCallback>,
    capacity: usize,
    contacts: &mut Vec<Contact>,
) -> Result<usize, StepError> {
    tracy_span!("find contacts");

    let mut tested_pairs = 0;
    for (node1, &key1) in set.collider_lists.iter(set.world_colliders) {
        let Some(c1) = set.colliders.get(key1.0) else {
            continue;
        };
        if !c1.enabled {
            continue;
        }

        for (_, &key2) in set.collider_lists.iter_after(node1) {
            let Some(c2) = set.colliders.get(key2.0) else {
                continue;
            };
            if !c2.enabled {
                continue;
            }
            // everything after this starts further right, no more overlaps possible
            if c2.bounding_rect.min.x > c1.bounding_rect.max.x {
                break;
            }
            if !c1.bounding_rect.overlaps_y(&c2.bounding_rect) {
                continue;
            }
            if c1.body == c2.body {
                continue;
            }
            let (Some(b1), Some(b2)) = (set.bodies.get(c1.body.0), set.bodies.get(c2.body.0))
            else {
                continue;
            };
            if b1.ty != BodyType::Dynamic && b2.ty != BodyType::Dynamic {
                continue;
            }
            if !c1.can_collide(c2) {
                continue;
            }

            tested_pairs += 1;
            let Some(collision) = collide(&c1.world_shape, &c2.world_shape) else {
                continue;
            };
            if !callbacks_allow(world_callback, c1, c2) {
                continue;
            }
            if c1.sensor || c2.sensor {
                continue;
            }

            if contacts.len() >= capacity {
                log::warn!("contact capacity of {capacity} exceeded, aborting the step");
                return Err(StepError::ContactCapacity { capacity });
            }
            let (static_friction, dynamic_friction) = c1.material.friction_with(&c2.material);
            contacts.push(Contact {
                colliders: [key1, key2],
                bodies: [c1.body, c2.body],
                collision,
                restitution: c1.material.restitution_with(&c2.material),
                static_friction,
                dynamic_friction,
            });
        }
    }

    Ok(tested_pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::Vec2, physics::ColliderKey, shape::Shape};

    fn circle_at(set: &mut EntitySet, x: f64) -> ColliderKey {
        let body = set.insert_body(BodyType::Dynamic);
        set.insert_collider(body, Shape::circle(Vec2::new(x, 0.0), 1.0).unwrap(), 1.0)
            .unwrap()
    }

    #[test]
    fn one_pass_sorts_by_left_edge() {
        let mut set = EntitySet::new();
        let xs = [5.0, -3.0, 1.0, -10.0, 2.5];
        let keys: Vec<_> = xs.iter().map(|&x| circle_at(&mut set, x)).collect();
        sort_colliders(&mut set);
        itertools::assert_equal(
            set.collider_keys(),
            [keys[3], keys[1], keys[2], keys[4], keys[0]],
        );
    }

    #[test]
    fn sweep_skips_far_apart_colliders() {
        let mut set = EntitySet::new();
        let a = circle_at(&mut set, 0.0);
        let b = circle_at(&mut set, 1.5);
        circle_at(&mut set, 10.0);
        sort_colliders(&mut set);

        let mut contacts = Vec::new();
        let tested = find_contacts(&set, None, 100, &mut contacts).unwrap();
        assert_eq!(tested, 1);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].colliders, [a, b]);
        assert_eq!(contacts[0].collision.depth, 0.5);
    }

    #[test]
    fn non_dynamic_pairs_are_skipped() {
        let mut set = EntitySet::new();
        let a = circle_at(&mut set, 0.0);
        let b = circle_at(&mut set, 1.0);
        for key in [a, b] {
            let body = set.colliders[key.0].body;
            set.bodies[body.0].set_body_type(BodyType::Kinematic);
        }
        let mut contacts = Vec::new();
        assert_eq!(find_contacts(&set, None, 100, &mut contacts).unwrap(), 0);
        assert!(contacts.is_empty());
    }

    #[test]
    fn full_contact_buffer_is_an_error() {
        let mut set = EntitySet::new();
        for x in [0.0, 0.5, 1.0] {
            circle_at(&mut set, x);
        }
        let mut contacts = Vec::new();
        assert_eq!(
            find_contacts(&set, None, 2, &mut contacts),
            Err(StepError::ContactCapacity { capacity: 2 })
        );
        assert_eq!(contacts.len(), 2);
    }
}
