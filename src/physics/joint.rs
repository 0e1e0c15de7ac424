//! Joints connecting pairs of bodies.

use super::BodyKey;
use crate::math::{Transform, Vec2};
use itertools::izip;

/// Type-specific behavior of a joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum JointType {
    /// Keeps the anchor points together and the relative angle of the bodies at zero.
    Fixed,
    /// Keeps the anchor points together but lets the bodies rotate freely.
    Pin,
}

/// A joint holds an anchor point on one body together with an anchor point on another.
///
/// Obtained from [`World::create_joint`][super::World::create_joint] and its variants.
#[derive(Clone, Copy, Debug)]
pub struct Joint {
    pub ty: JointType,
    pub(super) bodies: [BodyKey; 2],
    /// Anchors in the local space of each body.
    pub(super) local_anchors: [Vec2; 2],
    /// Cached world-space anchors.
    pub(super) world_anchors: [Vec2; 2],
}

impl Joint {
    pub(super) fn new(
        ty: JointType,
        bodies: [BodyKey; 2],
        local_anchors: [Vec2; 2],
        world_anchors: [Vec2; 2],
    ) -> Self {
        Self {
            ty,
            bodies,
            local_anchors,
            world_anchors,
        }
    }

    #[inline]
    pub fn bodies(&self) -> [BodyKey; 2] {
        self.bodies
    }

    #[inline]
    pub fn local_anchors(&self) -> [Vec2; 2] {
        self.local_anchors
    }

    /// Anchors in world space as of the last transform refresh.
    #[inline]
    pub fn world_anchors(&self) -> [Vec2; 2] {
        self.world_anchors
    }

    /// Vector from the first world anchor to the second.
    #[inline]
    pub fn displacement(&self) -> Vec2 {
        self.world_anchors[1] - self.world_anchors[0]
    }

    /// Recompute the world anchors belonging to `body`, which moved to `transform`.
    pub(super) fn update_world_anchors(&mut self, body: BodyKey, transform: &Transform) {
        let Joint {
            bodies,
            local_anchors,
            world_anchors,
            ..
        } = self;
        for (key, local, world) in izip!(bodies, local_anchors, world_anchors) {
            if *key == body {
                *world = transform.apply(*local);
            }
        }
    }
}
