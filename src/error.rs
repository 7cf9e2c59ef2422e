//! Errors surfaced by creature assembly.

use crate::config::ConfigError;
use crate::world::WorldError;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("invalid assembly config: {0}")]
    Config(#[from] ConfigError),

    #[error("physics world rejected a request: {0}")]
    World(#[from] WorldError),
}
