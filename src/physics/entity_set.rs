use super::{
    Body, BodyType, Collider, ColliderError, Joint, JointError, JointType, MassProperties,
};
use crate::{
    list::{ListKey, ListPool, NodeKey},
    math::Vec2,
    shape::Shape,
};

use thunderdome as td;

/// Key type to look up a body stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(super) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from bodies to other things.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a collider stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderKey(pub(super) td::Index);

impl ColliderKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from colliders to other things.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a joint stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointKey(pub(super) td::Index);

impl JointKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

// list memberships of each entity,
// stored in arenas parallel to the entities themselves so that keys line up

#[derive(Clone, Copy, Debug)]
struct BodyLinks {
    in_world: NodeKey,
    colliders: ListKey,
    joints: ListKey,
}

#[derive(Clone, Copy, Debug)]
struct ColliderLinks {
    in_body: NodeKey,
    in_world: NodeKey,
}

#[derive(Clone, Copy, Debug)]
struct JointLinks {
    in_bodies: [NodeKey; 2],
    in_world: NodeKey,
}

/// Internal representation of objects in the physics world,
/// comprised of bodies, colliders and joints.
///
/// Every entity is a member of a world-wide registry list,
/// and colliders and joints are also members of their bodies' lists.
/// The registries keep insertion order, except for the collider registry
/// which the broad phase keeps sorted.
pub(crate) struct EntitySet {
    // pub fields for the solver, which never inserts or removes anything
    pub(super) bodies: td::Arena<Body>,
    pub(super) colliders: td::Arena<Collider>,
    pub(super) joints: td::Arena<Joint>,
    body_links: td::Arena<BodyLinks>,
    collider_links: td::Arena<ColliderLinks>,
    joint_links: td::Arena<JointLinks>,
    pub(super) body_lists: ListPool<BodyKey>,
    pub(super) collider_lists: ListPool<ColliderKey>,
    pub(super) joint_lists: ListPool<JointKey>,
    pub(super) world_bodies: ListKey,
    pub(super) world_colliders: ListKey,
    pub(super) world_joints: ListKey,
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySet {
    pub(crate) fn new() -> Self {
        let mut body_lists = ListPool::new();
        let mut collider_lists = ListPool::new();
        let mut joint_lists = ListPool::new();
        Self {
            bodies: td::Arena::new(),
            colliders: td::Arena::new(),
            joints: td::Arena::new(),
            body_links: td::Arena::new(),
            collider_links: td::Arena::new(),
            joint_links: td::Arena::new(),
            world_bodies: body_lists.create_list(),
            world_colliders: collider_lists.create_list(),
            world_joints: joint_lists.create_list(),
            body_lists,
            collider_lists,
            joint_lists,
        }
    }

    //
    // bodies
    //

    pub fn insert_body(&mut self, ty: BodyType) -> BodyKey {
        let key = BodyKey(self.bodies.insert(Body::new(ty)));
        let links = BodyLinks {
            in_world: self.body_lists.insert_last_item(self.world_bodies, key),
            colliders: self.collider_lists.create_list(),
            joints: self.joint_lists.create_list(),
        };
        self.body_links.insert_at(key.0, links);
        key
    }

    /// Remove a body along with all of its colliders and joints.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        if !self.bodies.contains(key.0) {
            return None;
        }
        self.remove_all_colliders(key);
        self.remove_all_joints(key);

        let links = self.body_links.remove(key.0)?;
        self.body_lists.destroy_node(links.in_world);
        self.collider_lists.destroy_list(links.colliders);
        self.joint_lists.destroy_list(links.joints);
        self.bodies.remove(key.0)
    }

    /// Remove every collider attached to a body.
    /// Returns the number of colliders removed.
    pub fn remove_all_colliders(&mut self, body: BodyKey) -> usize {
        let keys: Vec<ColliderKey> = self.body_colliders(body).collect();
        for &key in &keys {
            self.remove_collider(key);
        }
        keys.len()
    }

    /// Remove every joint connected to a body.
    /// Returns the number of joints removed.
    pub fn remove_all_joints(&mut self, body: BodyKey) -> usize {
        let keys: Vec<JointKey> = self.body_joints(body).collect();
        for &key in &keys {
            self.remove_joint(key);
        }
        keys.len()
    }

    /// Keys of the colliders attached to a body in attachment order.
    /// Empty if the body doesn't exist.
    pub fn body_colliders(&self, body: BodyKey) -> impl '_ + Iterator<Item = ColliderKey> {
        self.body_links
            .get(body.0)
            .into_iter()
            .flat_map(move |links| self.collider_lists.items(links.colliders).copied())
    }

    /// Keys of the joints connected to a body in creation order.
    /// Empty if the body doesn't exist.
    pub fn body_joints(&self, body: BodyKey) -> impl '_ + Iterator<Item = JointKey> {
        self.body_links
            .get(body.0)
            .into_iter()
            .flat_map(move |links| self.joint_lists.items(links.joints).copied())
    }

    /// Update the world-space shapes, bounding rects and joint anchors
    /// attached to a body if its transform has changed.
    pub fn refresh_body(&mut self, key: BodyKey) {
        let (Some(body), Some(links)) = (self.bodies.get_mut(key.0), self.body_links.get(key.0))
        else {
            return;
        };
        if !body.transform_dirty {
            return;
        }
        body.transform_dirty = false;
        let transform = body.transform();

        for &coll_key in self.collider_lists.items(links.colliders) {
            if let Some(coll) = self.colliders.get_mut(coll_key.0) {
                coll.update_world_shape(&transform);
            }
        }
        for &joint_key in self.joint_lists.items(links.joints) {
            if let Some(joint) = self.joints.get_mut(joint_key.0) {
                joint.update_world_anchors(key, &transform);
            }
        }
    }

    //
    // colliders
    //

    pub fn insert_collider(
        &mut self,
        body: BodyKey,
        shape: Shape,
        density: f64,
    ) -> Result<ColliderKey, ColliderError> {
        let body_links = *self
            .body_links
            .get(body.0)
            .ok_or(ColliderError::MissingBody)?;

        let coll = Collider::new(body, shape, density);
        let (center, linear, angular) = MassProperties::of_collider(&coll);
        let key = ColliderKey(self.colliders.insert(coll));
        let links = ColliderLinks {
            in_body: self
                .collider_lists
                .insert_last_item(body_links.colliders, key),
            in_world: self
                .collider_lists
                .insert_last_item(self.world_colliders, key),
        };
        self.collider_links.insert_at(key.0, links);

        if let Some(b) = self.bodies.get_mut(body.0) {
            b.mass.add(center, linear, angular);
            b.refresh_inverse_mass();
            b.transform_dirty = true;
        }
        self.refresh_body(body);
        Ok(key)
    }

    /// Remove a collider, taking its mass away from its body.
    pub fn remove_collider(&mut self, key: ColliderKey) -> Option<Collider> {
        let coll = self.colliders.remove(key.0)?;
        if let Some(links) = self.collider_links.remove(key.0) {
            self.collider_lists.destroy_node(links.in_body);
            self.collider_lists.destroy_node(links.in_world);
        }

        let no_colliders_left = self.body_colliders(coll.body).next().is_none();
        if let Some(body) = self.bodies.get_mut(coll.body.0) {
            if no_colliders_left {
                // no accumulated rounding error for an empty body
                body.mass = MassProperties::default();
            } else {
                let (center, linear, angular) = MassProperties::of_collider(&coll);
                body.mass.subtract(center, linear, angular);
            }
            body.refresh_inverse_mass();
        }
        Some(coll)
    }

    //
    // joints
    //

    pub fn insert_joint(
        &mut self,
        ty: JointType,
        bodies: [BodyKey; 2],
        local_anchors: [Vec2; 2],
        world_anchors: [Vec2; 2],
    ) -> Result<JointKey, JointError> {
        if bodies[0] == bodies[1] {
            return Err(JointError::SameBody);
        }
        let body_links = [
            *self
                .body_links
                .get(bodies[0].0)
                .ok_or(JointError::MissingBody)?,
            *self
                .body_links
                .get(bodies[1].0)
                .ok_or(JointError::MissingBody)?,
        ];

        let joint = Joint::new(ty, bodies, local_anchors, world_anchors);
        let key = JointKey(self.joints.insert(joint));
        let links = JointLinks {
            in_bodies: [
                self.joint_lists.insert_last_item(body_links[0].joints, key),
                self.joint_lists.insert_last_item(body_links[1].joints, key),
            ],
            in_world: self.joint_lists.insert_last_item(self.world_joints, key),
        };
        self.joint_links.insert_at(key.0, links);
        Ok(key)
    }

    pub fn remove_joint(&mut self, key: JointKey) -> Option<Joint> {
        let joint = self.joints.remove(key.0)?;
        if let Some(links) = self.joint_links.remove(key.0) {
            for node in links.in_bodies {
                self.joint_lists.destroy_node(node);
            }
            self.joint_lists.destroy_node(links.in_world);
        }
        Some(joint)
    }

    //
    // registries
    //

    /// Body keys in creation order.
    pub fn body_keys(&self) -> impl '_ + Iterator<Item = BodyKey> {
        self.body_lists.items(self.world_bodies).copied()
    }

    /// Collider keys in broad phase order.
    pub fn collider_keys(&self) -> impl '_ + Iterator<Item = ColliderKey> {
        self.collider_lists.items(self.world_colliders).copied()
    }

    /// Joint keys in creation order.
    pub fn joint_keys(&self) -> impl '_ + Iterator<Item = JointKey> {
        self.joint_lists.items(self.world_joints).copied()
    }

    pub fn collider_count(&self) -> usize {
        self.collider_lists.len(self.world_colliders)
    }

    // not exposed to users, must use through World::clear
    pub(super) fn clear(&mut self) {
        let bodies: Vec<BodyKey> = self.body_keys().collect();
        for body in bodies {
            self.remove_body(body);
        }
    }
}
