//! Segment and joint types for procedurally assembled creatures.

use glam::Vec3;

use crate::world::{BodyHandle, EntityId, JointHandle};

/// Index of a segment inside its creature's topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub usize);

/// Role a segment plays in the body plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Torso,
    Head,
    UpperLimb,
    LowerLimb,
}

/// Limb family. Legs hang below the torso, arms rise above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimbFamily {
    Leg,
    Arm,
}

impl LimbFamily {
    /// Both families in generation order.
    pub fn all() -> &'static [LimbFamily] {
        &[LimbFamily::Leg, LimbFamily::Arm]
    }

    /// Vertical direction a chain of this family grows in.
    pub fn vertical_sign(&self) -> f32 {
        match self {
            LimbFamily::Leg => -1.0,
            LimbFamily::Arm => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LimbFamily::Leg => "leg",
            LimbFamily::Arm => "arm",
        }
    }
}

/// Which side of the torso a limb chain hangs from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimbSide {
    Left,
    Right,
}

impl LimbSide {
    /// Even chain indices go left, odd go right.
    pub fn from_index(index: usize) -> Self {
        if index % 2 == 0 {
            LimbSide::Left
        } else {
            LimbSide::Right
        }
    }

    pub fn horizontal_sign(&self) -> f32 {
        match self {
            LimbSide::Left => -1.0,
            LimbSide::Right => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LimbSide::Left => "left",
            LimbSide::Right => "right",
        }
    }
}

/// Render tint given to each limb chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimbColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl LimbColor {
    /// Fixed palette: legs take red and green, arms blue and yellow.
    pub fn for_chain(family: LimbFamily, side: LimbSide) -> Self {
        match (family, side) {
            (LimbFamily::Leg, LimbSide::Left) => LimbColor::Red,
            (LimbFamily::Leg, LimbSide::Right) => LimbColor::Green,
            (LimbFamily::Arm, LimbSide::Left) => LimbColor::Blue,
            (LimbFamily::Arm, LimbSide::Right) => LimbColor::Yellow,
        }
    }
}

/// Drive settings of a hinge motor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motor {
    /// Upper bound on the force the motor may apply.
    pub force: f32,
    /// Target angular velocity, degrees per second.
    pub target_velocity: f32,
    pub free_spin: bool,
    pub enabled: bool,
}

impl Motor {
    /// An enabled, non-free-spinning motor.
    pub fn driven(force: f32, target_velocity: f32) -> Self {
        Self {
            force,
            target_velocity,
            free_spin: false,
            enabled: true,
        }
    }
}

/// Constraint type binding a child segment to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointKind {
    /// No relative motion.
    Fixed,
    /// Rotation about `axis`, anchored at `anchor` in the child's local frame.
    Hinge { axis: Vec3, anchor: Vec3, motor: Motor },
}

/// Joint between a segment and its parent.
#[derive(Clone, Debug)]
pub struct Joint {
    pub kind: JointKind,
    pub parent: SegmentId,
    pub child: SegmentId,
    pub handle: JointHandle,
}

impl Joint {
    pub fn is_hinge(&self) -> bool {
        matches!(self.kind, JointKind::Hinge { .. })
    }

    pub fn motor(&self) -> Option<&Motor> {
        match &self.kind {
            JointKind::Hinge { motor, .. } => Some(motor),
            JointKind::Fixed => None,
        }
    }
}

/// One rigid box of a creature.
#[derive(Clone, Debug)]
pub struct Segment {
    pub id: SegmentId,
    pub kind: SegmentKind,
    /// Limb family and side; `None` for torso and head.
    pub limb: Option<(LimbFamily, LimbSide)>,
    /// Full extent along x, y, z.
    pub dimensions: Vec3,
    /// World-space centre at spawn time.
    pub position: Vec3,
    /// Explicit mass, or `None` for the engine default.
    pub mass: Option<f32>,
    pub color: Option<LimbColor>,
    pub parent: Option<SegmentId>,
    pub entity: EntityId,
    pub body: BodyHandle,
}

impl Segment {
    pub fn width(&self) -> f32 {
        self.dimensions.x
    }

    pub fn height(&self) -> f32 {
        self.dimensions.y
    }

    pub fn depth(&self) -> f32 {
        self.dimensions.z
    }

    pub fn family(&self) -> Option<LimbFamily> {
        self.limb.map(|(family, _)| family)
    }

    pub fn side(&self) -> Option<LimbSide> {
        self.limb.map(|(_, side)| side)
    }

    pub fn is_limb(&self) -> bool {
        matches!(self.kind, SegmentKind::UpperLimb | SegmentKind::LowerLimb)
    }
}
