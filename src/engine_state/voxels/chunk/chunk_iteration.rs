//! # Chunk Iteration Module
//!
//! This module provides an iterator that walks a chunk's cells in index order
//! and merges consecutive cells of the same type into runs. It is the scanning
//! half of the run-length chunk format.

use crate::engine_state::voxels::block::BlockTypeSize;

use super::Chunk;

/// A maximal stretch of consecutive cells sharing one type id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockRun {
    pub block_type: BlockTypeSize,
    pub count: u16,
}

/// An iterator over the type runs of a chunk, in index order.
///
/// Only type ids are compared; light and flag bits never split a run.
/// Run lengths fit in a `u16` because a chunk never holds more cells than
/// that (checked at compile time by the codec).
pub struct ChunkRunIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Index of the first cell not yet covered by a returned run
    current_offset: usize,
}

impl<'a> ChunkRunIterator<'a> {
    /// Creates a new `ChunkRunIterator` positioned at the first cell.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkRunIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for ChunkRunIterator<'_> {
    type Item = BlockRun;

    fn next(&mut self) -> Option<BlockRun> {
        let blocks = self.chunk_ref.blocks();
        let block_type = blocks.get(self.current_offset)?.block_type_id();

        let count = blocks[self.current_offset..]
            .iter()
            .take_while(|block| block.block_type_id() == block_type)
            .count();
        self.current_offset += count;

        Some(BlockRun {
            block_type,
            count: count as u16,
        })
    }
}
