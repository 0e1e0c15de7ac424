use crate::{
    collision::{self, Collision},
    math::{Transform, Vec2},
    shape::Shape,
};

//

pub mod body;
pub use body::{Body, BodyType, Mass, MassProperties, Velocity};

pub mod collider;
pub use collider::{Collider, CollisionCallback, CollisionFilter, Material};

pub mod joint;
pub use joint::{Joint, JointType};

mod entity_set;
use entity_set::EntitySet;
pub use entity_set::{BodyKey, ColliderKey, JointKey};

mod broadphase;
mod solver;


//

/// Error returned from [`World::step`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("More than {capacity} contacts were found in a single step")]
    ContactCapacity { capacity: usize },
}

/// Error returned when creating a collider.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderError {
    #[error("The body to attach the collider to does not exist")]
    MissingBody,
}

/// Error returned when creating a joint.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointError {
    #[error("One of the bodies to connect does not exist")]
    MissingBody,
    #[error("A joint can't connect a body to itself")]
    SameBody,
}

/// Tunable parameters of a physics world.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WorldConfig {
    /// Acceleration applied to every dynamic body, in metres per second squared.
    pub gravity: Vec2,
    /// Fraction of the velocity used to push overlapping bodies apart
    /// that bodies keep after the step.
    ///
    /// Zero means overlaps are corrected without any extra motion afterwards,
    /// higher values make resting contact bouncier.
    pub correction_velocity_gain: f64,
    /// Upper bound on the number of contacts in one step.
    pub max_contacts: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::zero(),
            correction_velocity_gain: 0.1,
            max_contacts: 100_000,
        }
    }
}

impl WorldConfig {
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_correction_velocity_gain(mut self, gain: f64) -> Self {
        self.correction_velocity_gain = gain;
        self
    }

    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts;
        self
    }
}

/// A pair of touching colliders that was pushed apart during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub colliders: [ColliderKey; 2],
    pub bodies: [BodyKey; 2],
    /// The collision from the first collider's point of view.
    pub collision: Collision,
    pub restitution: f64,
    pub static_friction: f64,
    pub dynamic_friction: f64,
}

/// The physics world, owning every body, collider and joint.
pub struct World {
    pub config: WorldConfig,
    entities: EntitySet,
    callback: Option<CollisionCallback>,
    // reused between steps to avoid reallocating
    contacts: Vec<Contact>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        World {
            config,
            entities: EntitySet::new(),
            callback: None,
            contacts: Vec::new(),
        }
    }

    /// Detect collisions, push touching bodies apart, solve joints and move bodies.
    ///
    /// If more contacts are found than the configured maximum,
    /// the step is aborted before any contact is resolved.
    /// Forces have already been integrated at that point.
    pub fn step(&mut self, dt: f64) -> Result<(), StepError> {
        tracy_span!("physics step");

        let config = self.config;
        self.integrate_forces(config.gravity, dt);

        broadphase::sort_colliders(&mut self.entities);

        let collider_count = self.entities.collider_count();
        let capacity = collider_count
            .saturating_mul(collider_count)
            .min(config.max_contacts);
        self.contacts.clear();
        let tested_pairs = match broadphase::find_contacts(
            &self.entities,
            self.callback.as_ref(),
            capacity,
            &mut self.contacts,
        ) {
            Ok(tested) => tested,
            Err(err) => {
                self.contacts.clear();
                return Err(err);
            }
        };

        solver::resolve_velocities(&mut self.entities.bodies, &self.contacts);
        solver::correct_positions(&mut self.entities.bodies, &self.contacts, dt);
        solver::solve_joints(&mut self.entities, dt);

        self.integrate_positions(config.correction_velocity_gain, dt);

        log::trace!(
            "stepped {dt}s: {} bodies, {tested_pairs} pairs tested, {} contacts",
            self.entities.body_lists.len(self.entities.world_bodies),
            self.contacts.len(),
        );
        Ok(())
    }

    fn integrate_forces(&mut self, gravity: Vec2, dt: f64) {
        tracy_span!("integrate forces");

        let set = &mut self.entities;
        let mut cursor = set.body_lists.first(set.world_bodies);
        while let Some(node) = cursor {
            cursor = set.body_lists.next(node);
            let Some(&key) = set.body_lists.item(node) else {
                continue;
            };
            set.refresh_body(key);
            if let Some(body) = set.bodies.get_mut(key.0) {
                body.integrate_forces(gravity, dt);
            }
        }
    }

    fn integrate_positions(&mut self, correction_gain: f64, dt: f64) {
        tracy_span!("integrate positions");

        let set = &mut self.entities;
        let mut cursor = set.body_lists.first(set.world_bodies);
        while let Some(node) = cursor {
            cursor = set.body_lists.next(node);
            let Some(&key) = set.body_lists.item(node) else {
                continue;
            };
            if let Some(body) = set.bodies.get_mut(key.0) {
                body.integrate_position(correction_gain, dt);
            }
            set.refresh_body(key);
        }
    }

    /// Bring the world shapes and joint anchors of every moved body up to date.
    ///
    /// This happens automatically during [`step`][Self::step],
    /// but queries made after moving bodies by hand need it to see the new positions.
    pub fn refresh_transforms(&mut self) {
        let keys: Vec<BodyKey> = self.entities.body_keys().collect();
        for key in keys {
            self.entities.refresh_body(key);
        }
    }

    //
    // bodies
    //

    /// Create a body with no colliders. It has infinite mass until a collider is attached.
    pub fn create_body(&mut self, ty: BodyType) -> BodyKey {
        let key = self.entities.insert_body(ty);
        log::debug!("created {ty:?} body {:?}", key.index());
        key
    }

    /// Destroy a body along with every collider attached to it and every joint connected to it.
    /// Returns false if the body didn't exist.
    pub fn destroy_body(&mut self, key: BodyKey) -> bool {
        let existed = self.entities.remove_body(key).is_some();
        if existed {
            log::debug!("destroyed body {:?}", key.index());
        }
        existed
    }

    #[inline]
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.entities.bodies.get(key.0)
    }

    #[inline]
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.entities.bodies.get_mut(key.0)
    }

    /// All bodies in creation order.
    pub fn bodies(&self) -> impl '_ + Iterator<Item = (BodyKey, &Body)> {
        self.entities
            .body_keys()
            .filter_map(move |key| Some((key, self.entities.bodies.get(key.0)?)))
    }

    //
    // colliders
    //

    /// Attach a collider with the given body-local shape and density to a body,
    /// adding its mass to the body.
    pub fn create_collider(
        &mut self,
        body: BodyKey,
        shape: Shape,
        density: f64,
    ) -> Result<ColliderKey, ColliderError> {
        let kind = shape.kind();
        let key = self.entities.insert_collider(body, shape, density)?;
        log::debug!(
            "created {kind:?} collider {:?} on body {:?}",
            key.index(),
            body.index()
        );
        Ok(key)
    }

    /// Detach and destroy a collider, removing its mass from its body.
    /// Returns false if the collider didn't exist.
    pub fn destroy_collider(&mut self, key: ColliderKey) -> bool {
        let existed = self.entities.remove_collider(key).is_some();
        if existed {
            log::debug!("destroyed collider {:?}", key.index());
        }
        existed
    }

    /// Destroy every collider attached to a body. Returns the number destroyed.
    pub fn destroy_all_colliders(&mut self, body: BodyKey) -> usize {
        let count = self.entities.remove_all_colliders(body);
        log::debug!("destroyed {count} colliders of body {:?}", body.index());
        count
    }

    #[inline]
    pub fn collider(&self, key: ColliderKey) -> Option<&Collider> {
        self.entities.colliders.get(key.0)
    }

    #[inline]
    pub fn collider_mut(&mut self, key: ColliderKey) -> Option<&mut Collider> {
        self.entities.colliders.get_mut(key.0)
    }

    /// All colliders, in the order the broad phase last sorted them into.
    pub fn colliders(&self) -> impl '_ + Iterator<Item = (ColliderKey, &Collider)> {
        self.entities
            .collider_keys()
            .filter_map(move |key| Some((key, self.entities.colliders.get(key.0)?)))
    }

    /// Colliders attached to a body, in attachment order.
    pub fn body_colliders(
        &self,
        body: BodyKey,
    ) -> impl '_ + Iterator<Item = (ColliderKey, &Collider)> {
        self.entities
            .body_colliders(body)
            .filter_map(move |key| Some((key, self.entities.colliders.get(key.0)?)))
    }

    //
    // joints
    //

    /// Connect two bodies with a joint, giving the anchors in both body-local and world space.
    ///
    /// The world anchors are used as given until one of the bodies moves.
    pub fn create_joint(
        &mut self,
        ty: JointType,
        bodies: [BodyKey; 2],
        local_anchors: [Vec2; 2],
        world_anchors: [Vec2; 2],
    ) -> Result<JointKey, JointError> {
        let key = self
            .entities
            .insert_joint(ty, bodies, local_anchors, world_anchors)?;
        log::debug!(
            "created {ty:?} joint {:?} between bodies {:?} and {:?}",
            key.index(),
            bodies[0].index(),
            bodies[1].index()
        );
        Ok(key)
    }

    /// Connect two bodies with a joint at anchors given in each body's local space.
    pub fn create_joint_local(
        &mut self,
        ty: JointType,
        bodies: [BodyKey; 2],
        local_anchors: [Vec2; 2],
    ) -> Result<JointKey, JointError> {
        let transforms = self.body_transforms(bodies)?;
        let world_anchors = [
            transforms[0].apply(local_anchors[0]),
            transforms[1].apply(local_anchors[1]),
        ];
        self.create_joint(ty, bodies, local_anchors, world_anchors)
    }

    /// Connect two bodies with a joint at anchors given in world space.
    pub fn create_joint_world(
        &mut self,
        ty: JointType,
        bodies: [BodyKey; 2],
        world_anchors: [Vec2; 2],
    ) -> Result<JointKey, JointError> {
        let transforms = self.body_transforms(bodies)?;
        let local_anchors = [
            transforms[0].inverse().apply(world_anchors[0]),
            transforms[1].inverse().apply(world_anchors[1]),
        ];
        self.create_joint(ty, bodies, local_anchors, world_anchors)
    }

    fn body_transforms(&self, bodies: [BodyKey; 2]) -> Result<[Transform; 2], JointError> {
        let transform = |key: BodyKey| {
            self.body(key)
                .map(Body::transform)
                .ok_or(JointError::MissingBody)
        };
        Ok([transform(bodies[0])?, transform(bodies[1])?])
    }

    /// Destroy a joint. Returns false if the joint didn't exist.
    pub fn destroy_joint(&mut self, key: JointKey) -> bool {
        let existed = self.entities.remove_joint(key).is_some();
        if existed {
            log::debug!("destroyed joint {:?}", key.index());
        }
        existed
    }

    /// Destroy every joint connected to a body. Returns the number destroyed.
    pub fn destroy_all_joints(&mut self, body: BodyKey) -> usize {
        let count = self.entities.remove_all_joints(body);
        log::debug!("destroyed {count} joints of body {:?}", body.index());
        count
    }

    #[inline]
    pub fn joint(&self, key: JointKey) -> Option<&Joint> {
        self.entities.joints.get(key.0)
    }

    #[inline]
    pub fn joint_mut(&mut self, key: JointKey) -> Option<&mut Joint> {
        self.entities.joints.get_mut(key.0)
    }

    /// All joints in creation order, which is also the order they're solved in.
    pub fn joints(&self) -> impl '_ + Iterator<Item = (JointKey, &Joint)> {
        self.entities
            .joint_keys()
            .filter_map(move |key| Some((key, self.entities.joints.get(key.0)?)))
    }

    /// Joints connected to a body, in creation order.
    pub fn body_joints(&self, body: BodyKey) -> impl '_ + Iterator<Item = (JointKey, &Joint)> {
        self.entities
            .body_joints(body)
            .filter_map(move |key| Some((key, self.entities.joints.get(key.0)?)))
    }

    //
    // collision queries
    //

    /// Set a callback that decides whether any pair of touching colliders gets pushed apart.
    ///
    /// It's called twice per touching pair, once with each collider first.
    pub fn set_collision_callback(
        &mut self,
        callback: impl Fn(&Collider, &Collider) -> bool + 'static,
    ) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_collision_callback(&mut self) {
        self.callback = None;
    }

    /// Check whether the collision filters of two colliders allow them to collide.
    /// False if either collider doesn't exist.
    pub fn can_collide(&self, c1: ColliderKey, c2: ColliderKey) -> bool {
        match (self.collider(c1), self.collider(c2)) {
            (Some(c1), Some(c2)) => c1.can_collide(c2),
            _ => false,
        }
    }

    /// Test two colliders' world shapes for overlap,
    /// as of the last step or [`refresh_transforms`][Self::refresh_transforms].
    pub fn collide(&self, c1: ColliderKey, c2: ColliderKey) -> Option<Collision> {
        let (c1, c2) = (self.collider(c1)?, self.collider(c2)?);
        collision::collide(c1.world_shape(), c2.world_shape())
    }

    /// Find the first enabled collider whose world shape contains the given point.
    pub fn collider_at_point(&self, point: Vec2) -> Option<ColliderKey> {
        self.colliders().find_map(|(key, coll)| {
            let hit = coll.enabled
                && coll.bounding_rect().contains_point(point)
                && coll.world_shape().contains_point(point);
            hit.then_some(key)
        })
    }

    /// Contacts that were resolved during the last step.
    #[inline]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Destroy every body, and with them every collider and joint.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.contacts.clear();
        log::debug!("cleared the physics world");
    }
}
