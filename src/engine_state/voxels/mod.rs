//! # Voxel Engine Core
//!
//! This module contains the core voxel engine functionality, providing the
//! foundation for representing, persisting and lighting a voxel-based world.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Cell layout, block types, faces and the per-type behavior table
//! * **Chunk**: Fixed-size columns of cells, coordinate math, the on-disk
//!   codec and terrain generation
//! * **Active chunks**: The resident chunk set and cell addressing across
//!   chunk edges
//! * **Lighting**: The dirty-cell queue and light relaxation
//! * **Storage**: One file per chunk under a data directory
//! * **World**: Streaming, edits, and the owner of everything above
//!
//! ## Data Flow
//!
//! 1. The world activates chunks near the viewer, loading or generating them
//! 2. Activation, edits and deactivation queue cells for relighting
//! 3. Draining the queue relights cells and flags chunks whose geometry changed
//! 4. An external mesher rebuilds flagged chunks from their raw cell bytes
//!
//! ## Thread Safety
//!
//! Nothing here is shared between threads. The world is mutated only between
//! simulation steps by its owner.

pub mod active_chunks;
pub mod block;
pub mod chunk;
pub mod lighting;
pub mod storage;
pub mod world;
