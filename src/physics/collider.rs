use super::BodyKey;
use crate::{
    math::Transform,
    shape::{Rect, Shape},
};

/// Function deciding whether a detected collision should be resolved.
///
/// Called with the collider the callback belongs to (or the first collider of the pair,
/// for the world callback) and the other collider. Returning false ignores the collision.
pub type CollisionCallback = Box<dyn Fn(&Collider, &Collider) -> bool>;

/// Surface properties of a collider.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Material {
    /// Bounciness, where 0 is no bounce and 1 keeps all the normal velocity.
    pub restitution: f64,
    /// Friction coefficient below which surfaces stick to each other.
    pub static_friction: f64,
    /// Friction coefficient for surfaces sliding along each other.
    pub dynamic_friction: f64,
}

impl Material {
    #[inline]
    pub fn new(restitution: f64, static_friction: f64, dynamic_friction: f64) -> Self {
        Self {
            restitution,
            static_friction,
            dynamic_friction,
        }
    }

    /// Combined restitution of two materials in contact: the bouncier one wins.
    #[inline]
    pub fn restitution_with(&self, other: &Material) -> f64 {
        self.restitution.max(other.restitution)
    }

    /// Combined static and dynamic friction of two materials in contact,
    /// the geometric mean of each coefficient.
    #[inline]
    pub fn friction_with(&self, other: &Material) -> (f64, f64) {
        (
            (self.static_friction * other.static_friction).sqrt(),
            (self.dynamic_friction * other.dynamic_friction).sqrt(),
        )
    }
}

/// Rules for which colliders can collide with each other.
///
/// Colliders sharing a nonzero group always collide if the group is positive
/// and never collide if it's negative.
/// Otherwise, two colliders collide if each one's `mask_1` shares a bit with the other's `mask_2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CollisionFilter {
    pub mask_1: u32,
    pub mask_2: u32,
    pub group: i32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            mask_1: u32::MAX,
            mask_2: u32::MAX,
            group: 0,
        }
    }
}

impl CollisionFilter {
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        if self.group == other.group {
            if self.group > 0 {
                return true;
            }
            if self.group < 0 {
                return false;
            }
        }
        (self.mask_1 & other.mask_2) != 0 && (self.mask_2 & other.mask_1) != 0
    }
}

/// A shape attached to a body that can collide with other colliders.
///
/// Obtained from [`World::create_collider`][super::World::create_collider].
/// The body's mass is computed from the shapes and densities of its colliders.
pub struct Collider {
    pub(super) body: BodyKey,
    local_shape: Shape,
    pub(super) world_shape: Shape,
    pub(super) bounding_rect: Rect,
    density: f64,
    pub material: Material,
    pub filter: CollisionFilter,
    /// Disabled colliders are skipped entirely during collision detection.
    pub enabled: bool,
    /// Sensors run collision callbacks but are never pushed apart.
    pub sensor: bool,
    /// Arbitrary data for users to identify the collider with.
    pub user_data: u64,
    callback: Option<CollisionCallback>,
}

impl Collider {
    pub(super) fn new(body: BodyKey, shape: Shape, density: f64) -> Self {
        let bounding_rect = shape.bounding_rect();
        Self {
            body,
            world_shape: shape.clone(),
            local_shape: shape,
            bounding_rect,
            density,
            material: Material::default(),
            filter: CollisionFilter::default(),
            enabled: true,
            sensor: false,
            user_data: 0,
            callback: None,
        }
    }

    /// The body this collider is attached to.
    #[inline]
    pub fn body(&self) -> BodyKey {
        self.body
    }

    /// The shape in body-local coordinates.
    #[inline]
    pub fn local_shape(&self) -> &Shape {
        &self.local_shape
    }

    /// The shape in world coordinates as of the last transform refresh.
    #[inline]
    pub fn world_shape(&self) -> &Shape {
        &self.world_shape
    }

    /// Bounding rect of the world shape.
    #[inline]
    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect
    }

    #[inline]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Set a callback run whenever this collider touches another.
    pub fn set_callback(&mut self, callback: impl Fn(&Collider, &Collider) -> bool + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    #[inline]
    pub fn callback(&self) -> Option<&CollisionCallback> {
        self.callback.as_ref()
    }

    pub(super) fn update_world_shape(&mut self, transform: &Transform) {
        self.local_shape
            .transform_into(transform, &mut self.world_shape);
        self.bounding_rect = self.world_shape.bounding_rect();
    }

    /// Check the collision filters of two colliders.
    #[inline]
    pub fn can_collide(&self, other: &Collider) -> bool {
        self.filter.can_collide(&other.filter)
    }
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("body", &self.body)
            .field("local_shape", &self.local_shape)
            .field("bounding_rect", &self.bounding_rect)
            .field("density", &self.density)
            .field("material", &self.material)
            .field("filter", &self.filter)
            .field("enabled", &self.enabled)
            .field("sensor", &self.sensor)
            .field("user_data", &self.user_data)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
