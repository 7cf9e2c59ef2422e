//! rapier3d backed world: creatures built here actually fall and flail.

use glam::Vec3;
use rapier3d::na::{point, vector, Point3, Vector3};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use super::{BodyHandle, EntityId, HingeParams, JointHandle, PhysicsWorld, WorldError};
use crate::anatomy::LimbColor;

/// Engine settings for the rapier backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RapierWorldConfig {
    /// Gravity along y (default: -9.81).
    pub gravity: f32,
    /// Fixed step length in seconds.
    pub dt: f32,
    /// Creature surface friction.
    pub friction: f32,
    pub restitution: f32,
    /// Velocity motor gain passed to every hinge.
    pub motor_damping: f32,
    /// Half width of the square ground slab at y = 0.
    pub ground_half_extent: f32,
}

impl Default for RapierWorldConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            dt: 1.0 / 60.0,
            friction: 0.6,
            restitution: 0.0,
            motor_damping: 1.0,
            ground_half_extent: 100.0,
        }
    }
}

#[derive(Clone, Debug)]
struct RapierEntity {
    position: Vec3,
    extent: Vec3,
    color: Option<LimbColor>,
    body: Option<BodyHandle>,
}

#[derive(Clone, Copy, Debug)]
struct RapierBody {
    rigid_body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// `PhysicsWorld` that owns a full rapier pipeline plus a ground slab.
pub struct RapierWorld {
    config: RapierWorldConfig,
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entities: Vec<RapierEntity>,
    handles: Vec<RapierBody>,
    joints: Vec<ImpulseJointHandle>,
    elapsed: f32,
}

impl RapierWorld {
    pub fn new(config: RapierWorldConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.dt;

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground = bodies.insert(RigidBodyBuilder::fixed().build());
        let ground_collider = ColliderBuilder::cuboid(
            config.ground_half_extent,
            0.5,
            config.ground_half_extent,
        )
        .translation(vector![0.0, -0.5, 0.0])
        .friction(config.friction)
        .build();
        colliders.insert_with_parent(ground_collider, ground, &mut bodies);

        Self {
            gravity: vector![0.0, config.gravity, 0.0],
            config,
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entities: Vec::new(),
            handles: Vec::new(),
            joints: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Place a body-less box, the way a host would place the creature root.
    pub fn spawn_root(&mut self, position: Vec3) -> EntityId {
        let entity = self.create_box();
        self.entities[entity.0 as usize].position = position;
        entity
    }

    /// Advance the simulation by one fixed step.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.elapsed += self.integration_parameters.dt;
    }

    pub fn simulate(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
        log::debug!("simulated {} steps, t = {:.3}s", steps, self.elapsed);
    }

    /// Simulated time so far, in seconds.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> &RapierWorldConfig {
        &self.config
    }

    /// Creature bodies, excluding the ground.
    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn color(&self, entity: EntityId) -> Option<LimbColor> {
        self.entities.get(entity.0 as usize).and_then(|e| e.color)
    }

    /// Current linear velocity of a body.
    pub fn velocity(&self, body: BodyHandle) -> Result<Vec3, WorldError> {
        let rb = self.rigid_body_ref(body)?;
        Ok(to_vec3(rb.linvel()))
    }

    fn entity_ref(&self, entity: EntityId) -> Result<&RapierEntity, WorldError> {
        self.entities
            .get(entity.0 as usize)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn entity_mut(&mut self, entity: EntityId) -> Result<&mut RapierEntity, WorldError> {
        self.entities
            .get_mut(entity.0 as usize)
            .ok_or(WorldError::UnknownEntity(entity))
    }

    fn handle(&self, body: BodyHandle) -> Result<RapierBody, WorldError> {
        self.handles
            .get(body.0 as usize)
            .copied()
            .ok_or(WorldError::UnknownBody(body))
    }

    fn rigid_body_ref(&self, body: BodyHandle) -> Result<&RigidBody, WorldError> {
        let handle = self.handle(body)?;
        self.bodies
            .get(handle.rigid_body)
            .ok_or(WorldError::UnknownBody(body))
    }

    fn rigid_body_mut(&mut self, body: BodyHandle) -> Result<&mut RigidBody, WorldError> {
        let handle = self.handle(body)?;
        self.bodies
            .get_mut(handle.rigid_body)
            .ok_or(WorldError::UnknownBody(body))
    }

    /// Resolve both ends of a joint. The parent-side anchor is the child's
    /// world anchor point expressed in the parent's frame.
    fn joint_frames(
        &self,
        child: EntityId,
        connected: BodyHandle,
        child_anchor: Vec3,
    ) -> Result<(RigidBodyHandle, RigidBodyHandle, Point3<f32>, Point3<f32>), WorldError> {
        let child_body = self
            .entity_ref(child)?
            .body
            .ok_or(WorldError::MissingBody(child))?;
        let child_handle = self.handle(child_body)?;
        let parent_handle = self.handle(connected)?;

        let child_rb = self.rigid_body_ref(child_body)?;
        let parent_rb = self.rigid_body_ref(connected)?;

        let local2 = point![child_anchor.x, child_anchor.y, child_anchor.z];
        let world_anchor = child_rb.position() * local2;
        let local1 = parent_rb.position().inverse_transform_point(&world_anchor);

        Ok((parent_handle.rigid_body, child_handle.rigid_body, local1, local2))
    }

    fn push_joint(&mut self, handle: ImpulseJointHandle) -> JointHandle {
        let id = JointHandle(self.joints.len() as u32);
        self.joints.push(handle);
        id
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(RapierWorldConfig::default())
    }
}

fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

impl PhysicsWorld for RapierWorld {
    fn create_box(&mut self) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(RapierEntity {
            position: Vec3::ZERO,
            extent: Vec3::ONE,
            color: None,
            body: None,
        });
        id
    }

    fn position(&self, entity: EntityId) -> Result<Vec3, WorldError> {
        let record = self.entity_ref(entity)?;
        match record.body {
            Some(body) => Ok(to_vec3(self.rigid_body_ref(body)?.translation())),
            None => Ok(record.position),
        }
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), WorldError> {
        let record = self.entity_mut(entity)?;
        record.position = position;
        if let Some(body) = record.body {
            self.rigid_body_mut(body)?
                .set_translation(vector![position.x, position.y, position.z], true);
        }
        Ok(())
    }

    fn set_extent(&mut self, entity: EntityId, extent: Vec3) -> Result<(), WorldError> {
        let record = self.entity_mut(entity)?;
        record.extent = extent;
        if let Some(body) = record.body {
            let handle = self.handle(body)?;
            if let Some(collider) = self.colliders.get_mut(handle.collider) {
                collider.set_shape(SharedShape::cuboid(
                    extent.x * 0.5,
                    extent.y * 0.5,
                    extent.z * 0.5,
                ));
            }
        }
        Ok(())
    }

    fn set_color(&mut self, entity: EntityId, color: LimbColor) -> Result<(), WorldError> {
        self.entity_mut(entity)?.color = Some(color);
        Ok(())
    }

    fn rigid_body(&self, entity: EntityId) -> Result<Option<BodyHandle>, WorldError> {
        Ok(self.entity_ref(entity)?.body)
    }

    fn add_rigid_body(&mut self, entity: EntityId) -> Result<BodyHandle, WorldError> {
        let record = self.entity_ref(entity)?.clone();
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![record.position.x, record.position.y, record.position.z])
            .build();
        let rigid_body = self.bodies.insert(rigid_body);

        let collider = ColliderBuilder::cuboid(
            record.extent.x * 0.5,
            record.extent.y * 0.5,
            record.extent.z * 0.5,
        )
        .friction(self.config.friction)
        .restitution(self.config.restitution)
        .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, rigid_body, &mut self.bodies);

        let body = BodyHandle(self.handles.len() as u32);
        self.handles.push(RapierBody { rigid_body, collider });
        self.entity_mut(entity)?.body = Some(body);
        log::trace!("rigid body {:?} for entity {:?}", body, entity);
        Ok(body)
    }

    fn set_use_gravity(&mut self, body: BodyHandle, enabled: bool) -> Result<(), WorldError> {
        let scale = if enabled { 1.0 } else { 0.0 };
        self.rigid_body_mut(body)?.set_gravity_scale(scale, true);
        Ok(())
    }

    fn set_mass(&mut self, body: BodyHandle, mass: f32) -> Result<(), WorldError> {
        let handle = self.handle(body)?;
        let collider = self
            .colliders
            .get_mut(handle.collider)
            .ok_or(WorldError::UnknownBody(body))?;
        collider.set_mass(mass);
        Ok(())
    }

    fn attach_fixed_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
    ) -> Result<JointHandle, WorldError> {
        let (parent, child, local1, local2) = self.joint_frames(child, connected, Vec3::ZERO)?;
        let joint = FixedJointBuilder::new()
            .local_anchor1(local1)
            .local_anchor2(local2)
            .contacts_enabled(false)
            .build();
        let handle = self.impulse_joints.insert(parent, child, joint, true);
        Ok(self.push_joint(handle))
    }

    fn attach_hinge_joint(
        &mut self,
        child: EntityId,
        connected: BodyHandle,
        params: HingeParams,
    ) -> Result<JointHandle, WorldError> {
        let (parent, child, local1, local2) =
            self.joint_frames(child, connected, params.anchor)?;
        let axis = UnitVector::new_normalize(vector![params.axis.x, params.axis.y, params.axis.z]);
        let mut builder = RevoluteJointBuilder::new(axis)
            .local_anchor1(local1)
            .local_anchor2(local2)
            .contacts_enabled(false);
        if params.motor.enabled {
            builder = builder
                .motor_velocity(
                    params.motor.target_velocity.to_radians(),
                    self.config.motor_damping,
                )
                .motor_max_force(params.motor.force);
        }
        let handle = self.impulse_joints.insert(parent, child, builder.build(), true);
        Ok(self.push_joint(handle))
    }
}
