//! Region-based ("arena") allocation over chained fixed-capacity blocks.
//!
//! Provides bump allocation within fixed blocks, transparent chaining into
//! new blocks when one fills, and flat indexed access to typed items spread
//! across the chain. Memory is released in bulk: by [`ArenaAllocator::reset`]
//! at the end of a frame, or by [`ArenaAllocator::dispose`] (or drop) at the
//! end of the allocator's life. Individual allocations are never freed.
//!
//! # Architecture
//!
//! ```text
//! BlockFactory ──creates──▶ ArenaAllocator
//!                           ├── ArenaConfig (block_capacity, max_blocks)
//!                           └── ChainIndex → MemoryBlock[] (bump-allocated RawBuffer)
//!
//! RegionHandle / AddressHandle ──resolve via allocator──▶ Region / RegionMut
//! ```
//!
//! # Safety
//!
//! `unsafe` is confined to `raw.rs` (buffer ownership and byte
//! reinterpretation) and to the [`Plain`] marker trait. Handles carry the
//! allocator's id and epoch, so a handle used after reset or dispose is
//! rejected instead of reading freed memory.
//!
//! # Concurrency
//!
//! Single writer. Every mutating operation takes `&mut self`; to share an
//! allocator between threads, wrap it in a [`SharedArena`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod block;
pub mod chain;
pub mod config;
pub mod error;
pub mod factory;
pub mod handle;
pub mod plain;
mod raw;
pub mod region;
pub mod shared;

// Public re-exports for the primary API surface.
pub use allocator::{ArenaAllocator, ArenaState, ItemLocation};
pub use block::MemoryBlock;
pub use chain::ChainIndex;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use factory::BlockFactory;
pub use handle::{AddressHandle, ArenaId, RegionHandle};
pub use plain::Plain;
pub use region::{Region, RegionMut};
pub use shared::SharedArena;
