//! # Chunk Codec Module
//!
//! Binary chunk format. A chunk file is a flat sequence of 3-byte entries:
//!
//! ```text
//! [type id: u8][run length: u16, big-endian]
//! ```
//!
//! produced by scanning the cells in index order and merging consecutive cells
//! of the same type. Light and flag bits are never written; decoding resets
//! every cell to its type's inherent light and the lighting engine recomputes
//! the rest once the chunk is active.

use thiserror::Error;

use crate::engine_state::voxels::block::block_definition::BlockRegistry;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockTypeSize;

use super::chunk_iteration::ChunkRunIterator;
use super::{Chunk, ChunkBuilder, ChunkCoords, BLOCKS_PER_CHUNK};

/// Bytes per encoded run.
pub const RLE_ENTRY_BYTES: usize = 3;

// A single run may cover the whole chunk, and its length is stored in 16 bits.
const _: () = assert!(
    BLOCKS_PER_CHUNK <= u16::MAX as usize,
    "chunk cell count no longer fits the 16-bit run length of the chunk format"
);

/// Errors raised while decoding a chunk file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkCodecError {
    #[error("chunk data ends mid-entry at byte {offset} of {len}")]
    Truncated { offset: usize, len: usize },
    #[error("zero-length run at byte {offset}")]
    EmptyRun { offset: usize },
    #[error("unknown block type id {id} at byte {offset}")]
    UnknownBlockType { id: BlockTypeSize, offset: usize },
    #[error("chunk data describes {found} cells, expected {expected}")]
    CellCount { found: usize, expected: usize },
}

/// Serializes the type ids of `chunk` into the run-length format.
pub fn encode(chunk: &Chunk) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(4096);
    for run in ChunkRunIterator::new(chunk) {
        buffer.push(run.block_type);
        buffer.extend_from_slice(&run.count.to_be_bytes());
    }
    buffer
}

/// Rebuilds a chunk from run-length data.
///
/// # Arguments
/// * `position` - Coordinates of the chunk being loaded
/// * `bytes` - Encoded run-length data
/// * `registry` - Supplies each type's inherent light
///
/// # Returns
/// The decoded chunk with every cell lit by its own emission and no flags set,
/// or a `ChunkCodecError` if the data is malformed or does not describe
/// exactly one chunk's worth of cells.
pub fn decode(
    position: ChunkCoords,
    bytes: &[u8],
    registry: &BlockRegistry,
) -> Result<Chunk, ChunkCodecError> {
    let mut builder = ChunkBuilder::new(position);
    let mut described = 0usize;

    for (entry, entry_bytes) in bytes.chunks(RLE_ENTRY_BYTES).enumerate() {
        let offset = entry * RLE_ENTRY_BYTES;
        let &[id, high, low] = entry_bytes else {
            return Err(ChunkCodecError::Truncated {
                offset,
                len: bytes.len(),
            });
        };

        let block_type = BlockType::get_block_type_from_int(id)
            .ok_or(ChunkCodecError::UnknownBlockType { id, offset })?;
        let count = u16::from_be_bytes([high, low]) as usize;
        if count == 0 {
            return Err(ChunkCodecError::EmptyRun { offset });
        }

        described += count;
        if described > BLOCKS_PER_CHUNK {
            break;
        }
        builder.push_run(registry.default_block(block_type), count);
    }

    if described != BLOCKS_PER_CHUNK {
        return Err(ChunkCodecError::CellCount {
            found: described,
            expected: BLOCKS_PER_CHUNK,
        });
    }

    Ok(builder.return_chunk())
}
