//! Physics world abstraction the assembler builds creatures into.
//!
//! The assembler never talks to an engine directly; it only needs the
//! handful of capabilities below. `SceneWorld` records calls in memory,
//! `RapierWorld` hands them to rapier3d.

pub mod rapier;
pub mod scene;

use glam::Vec3;

use crate::anatomy::{LimbColor, Motor};

pub use rapier::{RapierWorld, RapierWorldConfig};
pub use scene::SceneWorld;

/// Object placed in the world (a box with a transform).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Rigid body attached to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Constraint registered with the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub u32);

/// Hinge settings handed to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HingeParams {
    pub axis: Vec3,
    /// Attachment point in the child entity's local frame.
    pub anchor: Vec3,
    pub motor: Motor,
}

/// Failures reported by a physics world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    #[error("unknown rigid body {0:?}")]
    UnknownBody(BodyHandle),

    #[error("entity {0:?} has no rigid body to attach a joint to")]
    MissingBody(EntityId),
}

/// Capabilities a host engine provides to the creature assembler.
pub trait PhysicsWorld {
    /// Allocate a box at the origin with unit extent.
    fn create_box(&mut self) -> EntityId;

    fn position(&self, entity: EntityId) -> Result<Vec3, WorldError>;

    fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), WorldError>;

    /// Set the full box extent along each axis.
    fn set_extent(&mut self, entity: EntityId, extent: Vec3) -> Result<(), WorldError>;

    fn set_color(&mut self, entity: EntityId, color: LimbColor) -> Result<(), WorldError>;

    /// Rigid body already attached to `entity`, if any.
    fn rigid_body(&self, entity: EntityId) -> Result<Option<BodyHandle>, WorldError>;

    /// Attach a new rigid body with engine defaults.
    fn add_rigid_body(&mut self, entity: EntityId) -> Result<BodyHandle, WorldError>;

    fn set_use_gravity(&mut self, body: BodyHandle, enabled: bool) -> Result<(), WorldError>;

    fn set_mass(&mut self, body: BodyHandle, mass: f32) -> Result<(), WorldError>;

    /// Weld `child`'s body to `connected`.
    fn attach_fixed_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
    ) -> Result<JointHandle, WorldError>;

    /// Hinge `child`'s body to `connected`.
    fn attach_hinge_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
        params: HingeParams,
    ) -> Result<JointHandle, WorldError>;

    /// Existing rigid body of `entity`, or a fresh one.
    fn ensure_rigid_body(&mut self, entity: EntityId) -> Result<BodyHandle, WorldError> {
        match self.rigid_body(entity)? {
            Some(body) => Ok(body),
            None => self.add_rigid_body(entity),
        }
    }
}
