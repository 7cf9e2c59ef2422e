//! Procedural articulated creature generator
//!
//! Re-exports modules for use by binaries and tools.

pub mod anatomy;
pub mod assembler;
pub mod config;
pub mod error;
pub mod topology;
pub mod world;

pub use anatomy::{
    Joint, JointKind, LimbColor, LimbFamily, LimbSide, Motor, Segment, SegmentId, SegmentKind,
};
pub use assembler::CreatureAssembler;
pub use config::AssemblyConfig;
pub use error::AssemblyError;
pub use topology::{CreatureTopology, TopologyViolation};
pub use world::{PhysicsWorld, RapierWorld, RapierWorldConfig, SceneWorld};
