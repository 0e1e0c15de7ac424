//! A small 2D rigid body physics engine.
//!
//! Bodies carry colliders with segment, circle or convex polygon shapes,
//! and can be connected with joints. [`World::step`] detects collisions with
//! a sort-and-sweep broad phase and pushes touching bodies apart
//! with a single pass of impulses.

// profiling span that compiles to nothing without the `tracy` feature
macro_rules! tracy_span {
    ($name:literal) => {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!($name);
    };
}

pub mod math;
pub use math::{uv, Transform, Vec2};

pub mod list;
pub use list::{ListKey, ListPool, NodeKey};

pub mod shape;
pub use shape::{Circle, Polygon, Rect, Segment, Shape, ShapeError, ShapeKind};

pub mod collision;
pub use collision::{collide, Collision};

pub mod physics;
pub use physics::{
    Body, BodyKey, BodyType, Collider, ColliderError, ColliderKey, CollisionCallback,
    CollisionFilter, Contact, Joint, JointError, JointKey, JointType, Mass, MassProperties,
    Material, StepError, Velocity, World, WorldConfig,
};
