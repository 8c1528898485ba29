//! # Error Module
//!
//! The crate-level error type. Each subsystem keeps its own error enum; this
//! one only gathers them so the engine entry points can use `?` across all
//! of them.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine_state::voxels::block::block_definition::RegistryError;
use crate::engine_state::voxels::chunk::chunk_codec::ChunkCodecError;
use crate::engine_state::voxels::storage::StorageError;
use crate::engine_state::voxels::world::StreamingError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Codec(#[from] ChunkCodecError),
    #[error(transparent)]
    Streaming(#[from] StreamingError),
}
