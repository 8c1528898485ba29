//! # Chunk Creation Module
//!
//! This module provides a builder that fills a chunk one cell at a time in
//! index order. Both the terrain generator and the chunk decoder produce their
//! cells in that order, so neither needs to compute indices itself.

use crate::engine_state::voxels::block::Block;

use super::{local_coords_from_index, BlockIndex, Chunk, ChunkCoords, LocalCoords, BLOCKS_PER_CHUNK};

/// A builder for creating and populating chunks in index order.
///
/// Cells are appended with [`push_block`](Self::push_block) or
/// [`push_run`](Self::push_run); the next cell's local coordinates are
/// available through [`next_local_coords`](Self::next_local_coords) so a caller
/// can classify it before pushing.
pub struct ChunkBuilder {
    /// The coordinates of the chunk being created
    position: ChunkCoords,
    /// Cells pushed so far, in index order
    blocks: Vec<Block>,
}

impl ChunkBuilder {
    /// Creates a new `ChunkBuilder` for building a chunk at the given position.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the chunk to create
    ///
    /// # Returns
    /// A new `ChunkBuilder` positioned at index 0
    pub fn new(position: ChunkCoords) -> Self {
        ChunkBuilder {
            position,
            blocks: Vec::with_capacity(BLOCKS_PER_CHUNK),
        }
    }

    /// Number of cells pushed so far.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether every cell of the chunk has been pushed.
    pub fn is_complete(&self) -> bool {
        self.blocks.len() == BLOCKS_PER_CHUNK
    }

    /// Cells still missing before the chunk is complete.
    pub fn remaining(&self) -> usize {
        BLOCKS_PER_CHUNK - self.blocks.len()
    }

    /// Local coordinates the next pushed cell will occupy, or `None` once full.
    pub fn next_local_coords(&self) -> Option<LocalCoords> {
        if self.is_complete() {
            None
        } else {
            Some(local_coords_from_index(self.blocks.len() as BlockIndex))
        }
    }

    /// Appends one cell at the current index and advances.
    ///
    /// Cells pushed past the end of the chunk are ignored.
    pub fn push_block(&mut self, block: Block) {
        if !self.is_complete() {
            self.blocks.push(block);
        }
    }

    /// Appends `count` copies of `block`, clipped to the cells remaining.
    pub fn push_run(&mut self, block: Block, count: usize) {
        let count = count.min(self.remaining());
        self.blocks.extend(std::iter::repeat(block).take(count));
    }

    /// Finalizes the chunk creation and returns the constructed `Chunk`.
    ///
    /// Any cells that were never pushed are filled with unlit air.
    ///
    /// # Returns
    /// The fully constructed `Chunk`, flagged as needing geometry
    pub fn return_chunk(mut self) -> Chunk {
        self.blocks.resize(BLOCKS_PER_CHUNK, Block::default());
        Chunk::from_blocks(self.position, self.blocks)
    }
}
