//! In-memory world that records what the assembler asked for.

use glam::Vec3;

use super::{BodyHandle, EntityId, HingeParams, JointHandle, PhysicsWorld, WorldError};
use crate::anatomy::LimbColor;

/// Box entity as recorded by the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEntity {
    pub position: Vec3,
    pub extent: Vec3,
    pub color: Option<LimbColor>,
    pub body: Option<BodyHandle>,
}

/// Rigid body state as recorded by the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneBody {
    pub entity: EntityId,
    pub use_gravity: bool,
    /// `None` until set explicitly.
    pub mass: Option<f32>,
}

/// Recorded joint constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneJoint {
    Fixed { child: BodyHandle, connected: BodyHandle },
    Hinge { child: BodyHandle, connected: BodyHandle, params: HingeParams },
}

impl SceneJoint {
    pub fn child(&self) -> BodyHandle {
        match self {
            SceneJoint::Fixed { child, .. } | SceneJoint::Hinge { child, .. } => *child,
        }
    }

    pub fn connected(&self) -> BodyHandle {
        match self {
            SceneJoint::Fixed { connected, .. } | SceneJoint::Hinge { connected, .. } => *connected,
        }
    }
}

/// Engine-free `PhysicsWorld` used for dry runs and inspection.
#[derive(Clone, Debug, Default)]
pub struct SceneWorld {
    entities: Vec<SceneEntity>,
    bodies: Vec<SceneBody>,
    joints: Vec<SceneJoint>,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a body-less box, the way a host would place the creature root.
    pub fn spawn_root(&mut self, position: Vec3) -> EntityId {
        let entity = self.create_box();
        self.entities[entity.0 as usize].position = position;
        entity
    }

    pub fn entity(&self, entity: EntityId) -> Option<&SceneEntity> {
        self.entities.get(entity.0 as usize)
    }

    pub fn body(&self, body: BodyHandle) -> Option<&SceneBody> {
        self.bodies.get(body.0 as usize)
    }

    pub fn joint(&self, joint: JointHandle) -> Option<&SceneJoint> {
        self.joints.get(joint.0 as usize)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[SceneJoint] {
        &self.joints
    }

    fn entity_mut(&mut self, entity: EntityId) -> Result<&mut SceneEntity, WorldError> {
        self.entities
            .get_mut(entity.0 as usize)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Result<&mut SceneBody, WorldError> {
        self.bodies
            .get_mut(body.0 as usize)
            .ok_or(WorldError::UnknownBody(body))
    }

    fn joint_endpoints(
        &self,
        child: EntityId,
        connected: BodyHandle,
    ) -> Result<BodyHandle, WorldError> {
        if self.body(connected).is_none() {
            return Err(WorldError::UnknownBody(connected));
        }
        self.rigid_body(child)?.ok_or(WorldError::MissingBody(child))
    }

    fn push_joint(&mut self, joint: SceneJoint) -> JointHandle {
        let handle = JointHandle(self.joints.len() as u32);
        self.joints.push(joint);
        handle
    }
}

impl PhysicsWorld for SceneWorld {
    fn create_box(&mut self) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(SceneEntity {
            position: Vec3::ZERO,
            extent: Vec3::ONE,
            color: None,
            body: None,
        });
        id
    }

    fn position(&self, entity: EntityId) -> Result<Vec3, WorldError> {
        self.entity(entity)
            .map(|e| e.position)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), WorldError> {
        self.entity_mut(entity)?.position = position;
        Ok(())
    }

    fn set_extent(&mut self, entity: EntityId, extent: Vec3) -> Result<(), WorldError> {
        self.entity_mut(entity)?.extent = extent;
        Ok(())
    }

    fn set_color(&mut self, entity: EntityId, color: LimbColor) -> Result<(), WorldError> {
        self.entity_mut(entity)?.color = Some(color);
        Ok(())
    }

    fn rigid_body(&self, entity: EntityId) -> Result<Option<BodyHandle>, WorldError> {
        self.entity(entity)
            .map(|e| e.body)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn add_rigid_body(&mut self, entity: EntityId) -> Result<BodyHandle, WorldError> {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.entity_mut(entity)?.body = Some(handle);
        self.bodies.push(SceneBody {
            entity,
            use_gravity: true,
            mass: None,
        });
        Ok(handle)
    }

    fn set_use_gravity(&mut self, body: BodyHandle, enabled: bool) -> Result<(), WorldError> {
        self.body_mut(body)?.use_gravity = enabled;
        Ok(())
    }

    fn set_mass(&mut self, body: BodyHandle, mass: f32) -> Result<(), WorldError> {
        self.body_mut(body)?.mass = Some(mass);
        Ok(())
    }

    fn attach_fixed_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
    ) -> Result<JointHandle, WorldError> {
        let child = self.joint_endpoints(child, connected)?;
        Ok(self.push_joint(SceneJoint::Fixed { child, connected }))
    }

    fn attach_hinge_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
        params: HingeParams,
    ) -> Result<JointHandle, WorldError> {
        let child = self.joint_endpoints(child, connected)?;
        Ok(self.push_joint(SceneJoint::Hinge { child, connected, params }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::Motor;

    #[test]
    fn test_create_box_defaults() {
        let mut world = SceneWorld::new();
        let e = world.create_box();
        let record = world.entity(e).unwrap();
        assert_eq!(record.position, Vec3::ZERO);
        assert_eq!(record.extent, Vec3::ONE);
        assert!(record.body.is_none());
    }

    #[test]
    fn test_ensure_rigid_body_is_idempotent() {
        let mut world = SceneWorld::new();
        let e = world.spawn_root(Vec3::new(3.0, 0.0, -2.0));
        let first = world.ensure_rigid_body(e).unwrap();
        let second = world.ensure_rigid_body(e).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_joint_requires_child_body() {
        let mut world = SceneWorld::new();
        let parent = world.create_box();
        let parent_body = world.add_rigid_body(parent).unwrap();
        let child = world.create_box();
        assert!(matches!(
            world.attach_fixed_joint(child, parent_body),
            Err(WorldError::MissingBody(_))
        ));

        world.add_rigid_body(child).unwrap();
        let handle = world.attach_fixed_joint(child, parent_body).unwrap();
        assert_eq!(world.joint(handle).unwrap().connected(), parent_body);
    }

    #[test]
    fn test_unknown_handles_are_reported() {
        let mut world = SceneWorld::new();
        assert!(matches!(
            world.set_position(EntityId(9), Vec3::ONE),
            Err(WorldError::UnknownEntity(EntityId(9)))
        ));
        assert!(matches!(
            world.set_mass(BodyHandle(4), 1.0),
            Err(WorldError::UnknownBody(BodyHandle(4)))
        ));

        let child = world.create_box();
        world.add_rigid_body(child).unwrap();
        let params = HingeParams {
            axis: Vec3::X,
            anchor: Vec3::ZERO,
            motor: Motor::driven(1.0, 0.0),
        };
        assert!(matches!(
            world.attach_hinge_joint(child, BodyHandle(7), params),
            Err(WorldError::UnknownBody(BodyHandle(7)))
        ));
    }
}
