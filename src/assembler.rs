//! Procedural biped assembly.
//!
//! Builds a torso, stacks a head on it, then hangs two legs below and two
//! arms above. Each limb chain gets a motorized hinge to the torso and, on a
//! lucky draw, a second segment hinged to the first. Every child is placed
//! from its parent's already-final position and size.

use glam::Vec3;
use rand::Rng;

use crate::anatomy::*;
use crate::config::{AssemblyConfig, BoxRanges};
use crate::error::AssemblyError;
use crate::topology::CreatureTopology;
use crate::world::{EntityId, HingeParams, PhysicsWorld};

/// Every hinge rotates about the body's x axis.
pub const HINGE_AXIS: Vec3 = Vec3::X;

/// Limb chains per family.
pub const CHAINS_PER_FAMILY: usize = 2;

/// Generates creatures into a `PhysicsWorld`.
#[derive(Clone, Debug, Default)]
pub struct CreatureAssembler {
    config: AssemblyConfig,
}

impl CreatureAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assemble a creature on `root`, lifting it to `spawn_height` while
    /// keeping its horizontal position.
    ///
    /// The root's rigid body is reused if it already has one. A world error
    /// aborts assembly; anything created before it stays in the world.
    pub fn assemble<W: PhysicsWorld>(
        &self,
        world: &mut W,
        root: EntityId,
        spawn_height: f32,
        rng: &mut impl Rng,
    ) -> Result<CreatureTopology, AssemblyError> {
        self.config.validate()?;

        let torso = self.build_torso(world, root, spawn_height, rng)?;
        let mut topology = CreatureTopology::with_root(torso.clone());
        self.generate_head(world, &torso, &mut topology)?;
        for family in LimbFamily::all() {
            self.generate_limbs(world, &torso, *family, &mut topology, rng)?;
        }

        log::debug!(
            "assembled creature: {} segments ({} lower limbs), {} joints",
            topology.segments().len(),
            topology.lower_limbs().count(),
            topology.joints().len()
        );
        Ok(topology)
    }

    fn build_torso<W: PhysicsWorld>(
        &self,
        world: &mut W,
        root: EntityId,
        spawn_height: f32,
        rng: &mut impl Rng,
    ) -> Result<Segment, AssemblyError> {
        let torso_config = &self.config.torso;
        let ranges = &torso_config.ranges;
        let dimensions = Vec3::new(
            ranges.width.sample(rng).clamp(torso_config.min_width, ranges.width.max),
            ranges.height.sample(rng).clamp(torso_config.min_height, ranges.height.max),
            ranges.depth.sample(rng).clamp(torso_config.min_depth, ranges.depth.max),
        );

        let body = world.ensure_rigid_body(root)?;
        world.set_use_gravity(body, true)?;
        world.set_extent(root, dimensions)?;

        let current = world.position(root)?;
        let position = Vec3::new(current.x, spawn_height, current.z);
        world.set_position(root, position)?;

        let segment = Segment {
            id: SegmentId(0),
            kind: SegmentKind::Torso,
            limb: None,
            dimensions,
            position,
            mass: None,
            color: None,
            parent: None,
            entity: root,
            body,
        };
        log::trace!("torso {:?} at {:?}", dimensions, position);
        Ok(segment)
    }

    /// Cube on top of the torso, welded in place.
    fn generate_head<W: PhysicsWorld>(
        &self,
        world: &mut W,
        torso: &Segment,
        topology: &mut CreatureTopology,
    ) -> Result<(), AssemblyError> {
        let size = torso.width() * self.config.head_scale;
        let dimensions = Vec3::splat(size);
        let position = torso.position + Vec3::new(0.0, torso.height() / 2.0 + size / 2.0, 0.0);

        let entity = world.create_box();
        world.set_extent(entity, dimensions)?;
        world.set_position(entity, position)?;
        let body = world.add_rigid_body(entity)?;
        world.set_use_gravity(body, true)?;
        world.set_mass(body, self.config.head_mass)?;
        let handle = world.attach_fixed_joint(entity, torso.body)?;

        let id = topology.push_segment(Segment {
            id: topology.next_id(),
            kind: SegmentKind::Head,
            limb: None,
            dimensions,
            position,
            mass: Some(self.config.head_mass),
            color: None,
            parent: Some(torso.id),
            entity,
            body,
        });
        topology.push_joint(Joint {
            kind: JointKind::Fixed,
            parent: torso.id,
            child: id,
            handle,
        });
        Ok(())
    }

    /// Two chains of `family`, left then right.
    fn generate_limbs<W: PhysicsWorld>(
        &self,
        world: &mut W,
        torso: &Segment,
        family: LimbFamily,
        topology: &mut CreatureTopology,
        rng: &mut impl Rng,
    ) -> Result<(), AssemblyError> {
        for index in 0..CHAINS_PER_FAMILY {
            let side = LimbSide::from_index(index);
            let dimensions = draw_box(&self.config.limb, rng);
            let offset = Vec3::new(
                side.horizontal_sign() * (torso.width() / 2.0 + dimensions.x / 2.0),
                family.vertical_sign() * (torso.height() / 2.0 + dimensions.y / 2.0),
                0.0,
            );
            let upper = self.attach_limb_segment(
                world,
                torso,
                SegmentKind::UpperLimb,
                (family, side),
                dimensions,
                torso.position + offset,
                topology,
                rng,
            )?;

            if rng.gen::<f32>() > self.config.lower_limb_threshold {
                let dimensions = draw_box(&self.config.limb, rng);
                let offset = Vec3::new(
                    0.0,
                    family.vertical_sign() * (upper.height() / 2.0 + dimensions.y / 2.0),
                    0.0,
                );
                self.attach_limb_segment(
                    world,
                    &upper,
                    SegmentKind::LowerLimb,
                    (family, side),
                    dimensions,
                    upper.position + offset,
                    topology,
                    rng,
                )?;
            }
        }
        Ok(())
    }

    /// Create one limb box and hinge it to `parent`. The anchor sits on the
    /// end of the box facing the parent.
    #[allow(clippy::too_many_arguments)]
    fn attach_limb_segment<W: PhysicsWorld>(
        &self,
        world: &mut W,
        parent: &Segment,
        kind: SegmentKind,
        (family, side): (LimbFamily, LimbSide),
        dimensions: Vec3,
        position: Vec3,
        topology: &mut CreatureTopology,
        rng: &mut impl Rng,
    ) -> Result<Segment, AssemblyError> {
        let color = LimbColor::for_chain(family, side);
        let entity = world.create_box();
        world.set_extent(entity, dimensions)?;
        world.set_position(entity, position)?;
        world.set_color(entity, color)?;
        let body = world.add_rigid_body(entity)?;

        let anchor = Vec3::new(0.0, -family.vertical_sign() * dimensions.y / 2.0, 0.0);
        let motor = self.draw_motor(rng);
        let params = HingeParams { axis: HINGE_AXIS, anchor, motor };
        let handle = world.attach_hinge_joint(entity, parent.body, params)?;

        let segment = Segment {
            id: topology.next_id(),
            kind,
            limb: Some((family, side)),
            dimensions,
            position,
            mass: None,
            color: Some(color),
            parent: Some(parent.id),
            entity,
            body,
        };
        log::trace!(
            "{} {} {:?} {:?} at {:?}, motor {:.1} @ {:.1} deg/s",
            side.label(),
            family.label(),
            kind,
            dimensions,
            position,
            motor.force,
            motor.target_velocity
        );
        topology.push_segment(segment.clone());
        topology.push_joint(Joint {
            kind: JointKind::Hinge { axis: HINGE_AXIS, anchor, motor },
            parent: parent.id,
            child: segment.id,
            handle,
        });
        Ok(segment)
    }

    fn draw_motor(&self, rng: &mut impl Rng) -> Motor {
        let force = self.config.motor.force.sample(rng);
        let target_velocity = self.config.motor.target_velocity.sample(rng);
        Motor::driven(force, target_velocity)
    }
}

fn draw_box(ranges: &BoxRanges, rng: &mut impl Rng) -> Vec3 {
    let width = ranges.width.sample(rng);
    let height = ranges.height.sample(rng);
    let depth = ranges.depth.sample(rng);
    Vec3::new(width, height, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FloatRange;
    use crate::world::scene::SceneJoint;
    use crate::world::SceneWorld;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const EPS: f32 = 1e-5;

    fn assemble_seed(seed: u64) -> (SceneWorld, CreatureTopology) {
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::new(4.0, 0.0, -3.0));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let creature = CreatureAssembler::default()
            .assemble(&mut world, root, 5.0, &mut rng)
            .unwrap();
        (world, creature)
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < EPS, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_torso_dimensions_clamped() {
        for seed in 0..200 {
            let (_, creature) = assemble_seed(seed);
            let torso = creature.torso();
            assert!(torso.width() >= 1.0 && torso.width() <= 1.5, "seed {}", seed);
            assert!(torso.height() >= 1.2 && torso.height() <= 1.5, "seed {}", seed);
            assert!(torso.depth() >= 1.0 && torso.depth() <= 1.5, "seed {}", seed);
        }
    }

    #[test]
    fn test_segment_counts() {
        for seed in 0..200 {
            let (_, creature) = assemble_seed(seed);
            assert_eq!(creature.validate(), Ok(()), "seed {}", seed);
            assert_eq!(creature.of_kind(SegmentKind::Head).count(), 1);
            let legs = creature
                .upper_limbs()
                .filter(|s| s.family() == Some(LimbFamily::Leg))
                .count();
            let arms = creature
                .upper_limbs()
                .filter(|s| s.family() == Some(LimbFamily::Arm))
                .count();
            assert_eq!((legs, arms), (2, 2));
            assert!(creature.lower_limbs().count() <= 4);
            assert_eq!(creature.joints().len(), creature.segments().len() - 1);
        }
    }

    #[test]
    fn test_torso_keeps_horizontal_position() {
        let (world, creature) = assemble_seed(1);
        let torso = creature.torso();
        assert_eq!(torso.position, Vec3::new(4.0, 5.0, -3.0));
        assert_eq!(world.position(torso.entity).unwrap(), torso.position);
        assert_eq!(world.entity(torso.entity).unwrap().extent, torso.dimensions);
        assert!(world.body(torso.body).unwrap().use_gravity);
        assert_eq!(world.body(torso.body).unwrap().mass, None);
    }

    #[test]
    fn test_head_sits_on_torso() {
        for seed in 0..50 {
            let (world, creature) = assemble_seed(seed);
            let torso = creature.torso();
            let head = creature.head().unwrap();
            let size = torso.width() * 0.5;
            assert_eq!(head.dimensions, Vec3::splat(size));
            assert_vec_eq(
                head.position,
                torso.position + Vec3::new(0.0, torso.height() / 2.0 + size / 2.0, 0.0),
            );
            assert_eq!(head.mass, Some(1.0));
            assert_eq!(world.body(head.body).unwrap().mass, Some(1.0));

            let joint = creature.joint_for(head.id).unwrap();
            assert_eq!(joint.kind, JointKind::Fixed);
            assert_eq!(
                world.joint(joint.handle).unwrap(),
                &SceneJoint::Fixed { child: head.body, connected: torso.body }
            );
        }
    }

    #[test]
    fn test_hinges_and_motors() {
        for seed in 0..50 {
            let (world, creature) = assemble_seed(seed);
            let hinges: Vec<_> = creature.joints().iter().filter(|j| j.is_hinge()).collect();
            assert_eq!(hinges.len(), creature.segments().len() - 2);
            for joint in hinges {
                let JointKind::Hinge { axis, anchor, motor } = joint.kind else {
                    unreachable!()
                };
                assert_eq!(axis, Vec3::new(1.0, 0.0, 0.0));
                assert!(!motor.free_spin);
                assert!(motor.enabled);
                assert!((100.0..=200.0).contains(&motor.force));
                assert!((-100.0..=100.0).contains(&motor.target_velocity));

                let child = creature.segment(joint.child).unwrap();
                let expected = match child.family() {
                    Some(LimbFamily::Leg) => child.height() / 2.0,
                    Some(LimbFamily::Arm) => -child.height() / 2.0,
                    None => panic!("hinge on non-limb segment"),
                };
                assert_eq!(anchor, Vec3::new(0.0, expected, 0.0));

                match world.joint(joint.handle).unwrap() {
                    SceneJoint::Hinge { params, child: body, .. } => {
                        assert_eq!(params.axis, axis);
                        assert_eq!(params.anchor, anchor);
                        assert_eq!(*body, child.body);
                    }
                    other => panic!("expected hinge, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_upper_limb_placement() {
        for seed in 0..50 {
            let (_, creature) = assemble_seed(seed);
            let torso = creature.torso();
            for family in LimbFamily::all() {
                let uppers: Vec<&Segment> = creature
                    .upper_limbs()
                    .filter(|s| s.family() == Some(*family))
                    .collect();
                let signs: Vec<f32> = uppers
                    .iter()
                    .map(|s| (s.position.x - torso.position.x).signum())
                    .collect();
                assert_eq!(signs, vec![-1.0, 1.0]);

                for upper in uppers {
                    let offset = upper.position - torso.position;
                    let dy = torso.height() / 2.0 + upper.height() / 2.0;
                    let dx = torso.width() / 2.0 + upper.width() / 2.0;
                    match family {
                        LimbFamily::Leg => assert!((offset.y + dy).abs() < EPS),
                        LimbFamily::Arm => assert!((offset.y - dy).abs() < EPS),
                    }
                    assert!((offset.x.abs() - dx).abs() < EPS);
                    assert_eq!(offset.z, 0.0);
                    assert_eq!(upper.parent, Some(torso.id));
                    assert!((0.1..=0.3).contains(&upper.width()));
                    assert!((0.5..=1.5).contains(&upper.height()));
                    assert!((0.1..=0.3).contains(&upper.depth()));
                }
            }
        }
    }

    #[test]
    fn test_lower_limb_adjacent_to_upper() {
        let mut seen = 0;
        for seed in 0..100 {
            let (world, creature) = assemble_seed(seed);
            for (upper, lower) in creature.chains() {
                let Some(lower) = lower else { continue };
                seen += 1;
                let offset = lower.position - upper.position;
                let dy = upper.height() / 2.0 + lower.height() / 2.0;
                let sign = upper.family().unwrap().vertical_sign();
                assert_eq!(offset.x, 0.0);
                assert_eq!(offset.z, 0.0);
                assert!((offset.y - sign * dy).abs() < EPS);
                assert_eq!(lower.limb, upper.limb);
                assert_eq!(lower.color, upper.color);

                let joint = creature.joint_for(lower.id).unwrap();
                assert_eq!(joint.parent, upper.id);
                assert_eq!(world.joint(joint.handle).unwrap().connected(), upper.body);
            }
        }
        assert!(seen > 0, "no lower limbs in 100 seeds");
    }

    #[test]
    fn test_high_coin_grows_every_lower_limb() {
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        // Every draw is the top of its range, so every coin exceeds 0.7.
        let mut rng = StepRng::new(u64::MAX, 0);
        let creature = CreatureAssembler::default()
            .assemble(&mut world, root, 5.0, &mut rng)
            .unwrap();
        assert_eq!(creature.lower_limbs().count(), 4);
        assert_eq!(creature.validate(), Ok(()));
    }

    #[test]
    fn test_low_coin_grows_no_lower_limb() {
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        let mut rng = StepRng::new(0, 0);
        let creature = CreatureAssembler::default()
            .assemble(&mut world, root, 5.0, &mut rng)
            .unwrap();
        assert_eq!(creature.lower_limbs().count(), 0);
        assert_eq!(creature.segments().len(), 6);
        // Minimum draws are lifted to the torso floor.
        assert_eq!(creature.torso().dimensions, Vec3::new(1.0, 1.2, 1.0));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut config = AssemblyConfig::default();
        config.lower_limb_threshold = 1.0;
        let assembler = CreatureAssembler::new(config);
        for seed in 0..20 {
            let mut world = SceneWorld::new();
            let root = world.spawn_root(Vec3::ZERO);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let creature = assembler.assemble(&mut world, root, 5.0, &mut rng).unwrap();
            assert_eq!(creature.lower_limbs().count(), 0);
        }
    }

    #[test]
    fn test_existing_root_body_is_reused() {
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        let existing = world.add_rigid_body(root).unwrap();
        world.set_use_gravity(existing, false).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let creature = CreatureAssembler::default()
            .assemble(&mut world, root, 5.0, &mut rng)
            .unwrap();
        assert_eq!(creature.torso().body, existing);
        assert!(world.body(existing).unwrap().use_gravity);
        assert_eq!(world.body_count(), creature.segments().len());
    }

    #[test]
    fn test_same_seed_same_creature() {
        let (_, a) = assemble_seed(77);
        let (_, b) = assemble_seed(77);
        assert_eq!(a.segments().len(), b.segments().len());
        for (x, y) in a.segments().iter().zip(b.segments()) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.dimensions, y.dimensions);
            assert_eq!(x.position, y.position);
        }
        for (x, y) in a.joints().iter().zip(b.joints()) {
            assert_eq!(x.kind, y.kind);
        }
    }

    #[test]
    fn test_lower_limb_frequency() {
        let mut lowers = 0;
        let mut world = SceneWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let assembler = CreatureAssembler::default();
        for _ in 0..500 {
            let root = world.spawn_root(Vec3::ZERO);
            let creature = assembler.assemble(&mut world, root, 5.0, &mut rng).unwrap();
            lowers += creature.lower_limbs().count();
        }
        let rate = lowers as f32 / 2000.0;
        let expected = assembler.config().lower_limb_probability();
        assert!((expected - 0.3).abs() < 1e-6);
        assert!((rate - expected).abs() < 0.05, "lower limb rate {}", rate);
    }

    #[test]
    fn test_scene_joints_follow_topology() {
        for seed in 0..20 {
            let (world, creature) = assemble_seed(seed);
            assert_eq!(world.joints().len(), creature.joints().len());
            for (recorded, joint) in world.joints().iter().zip(creature.joints()) {
                let child = creature.segment(joint.child).unwrap();
                let parent = creature.segment(joint.parent).unwrap();
                assert_eq!(recorded.child(), child.body, "seed {}", seed);
                assert_eq!(recorded.connected(), parent.body, "seed {}", seed);
                assert_eq!(world.joint(joint.handle), Some(recorded));
            }
        }
    }

    #[test]
    fn test_invalid_config_creates_nothing() {
        let mut config = AssemblyConfig::default();
        config.limb.width = FloatRange::new(0.3, 0.1);
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = CreatureAssembler::new(config).assemble(&mut world, root, 5.0, &mut rng);
        assert!(matches!(result, Err(AssemblyError::Config(_))));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_overflowing_range_is_rejected_before_drawing() {
        let mut config = AssemblyConfig::default();
        config.motor.force = FloatRange::new(-f32::MAX, f32::MAX);
        let mut world = SceneWorld::new();
        let root = world.spawn_root(Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = CreatureAssembler::new(config).assemble(&mut world, root, 5.0, &mut rng);
        assert!(matches!(result, Err(AssemblyError::Config(_))));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_unknown_root_is_a_world_error() {
        let mut world = SceneWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result =
            CreatureAssembler::default().assemble(&mut world, EntityId(3), 5.0, &mut rng);
        assert!(matches!(result, Err(AssemblyError::World(_))));
        assert_eq!(world.body_count(), 0);
    }
}
