//! # Chunk Storage
//!
//! One file per chunk in a data directory, named after the chunk's
//! coordinates (`chunk_{x}_{y}.chunk`) and holding the run-length encoded
//! type ids written by [`chunk_codec`].
//!
//! A missing file is not an error: it means the chunk has never been saved
//! and should be generated.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::trace;
use thiserror::Error;

use super::block::block_definition::BlockRegistry;
use super::chunk::chunk_codec::{self, ChunkCodecError};
use super::chunk::{Chunk, ChunkCoords};

/// Errors raised while reading or writing chunk files.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("chunk file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt chunk file {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: ChunkCodecError,
    },
}

/// Reads and writes chunk files under a data directory.
#[derive(Clone, Debug)]
pub struct ChunkStore {
    data_dir: PathBuf,
}

impl ChunkStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        ChunkStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File holding the chunk at `coords`.
    pub fn chunk_path(&self, coords: ChunkCoords) -> PathBuf {
        self.data_dir
            .join(format!("chunk_{}_{}.chunk", coords.x, coords.y))
    }

    /// Whether the chunk at `coords` has been saved before.
    pub fn contains(&self, coords: ChunkCoords) -> bool {
        self.chunk_path(coords).is_file()
    }

    /// Loads the chunk at `coords`.
    ///
    /// # Returns
    /// - `Ok(Some(chunk))` when the file exists and decodes cleanly
    /// - `Ok(None)` when there is no file for this chunk
    /// - `Err` when the file cannot be read or is corrupt
    pub fn load(
        &self,
        coords: ChunkCoords,
        registry: &BlockRegistry,
    ) -> Result<Option<Chunk>, StorageError> {
        let path = self.chunk_path(coords);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let chunk = chunk_codec::decode(coords, &bytes, registry)
            .map_err(|source| StorageError::Codec {
                path: path.clone(),
                source,
            })?;
        trace!("Loaded chunk {:?} from {} ({} bytes)", coords, path.display(), bytes.len());
        Ok(Some(chunk))
    }

    /// Writes `chunk` to its file, creating the data directory if needed.
    pub fn save(&self, chunk: &Chunk) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StorageError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = self.chunk_path(chunk.position());
        let bytes = chunk_codec::encode(chunk);
        fs::write(&path, &bytes).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        trace!("Saved chunk {:?} to {} ({} bytes)", chunk.position(), path.display(), bytes.len());
        Ok(())
    }
}
