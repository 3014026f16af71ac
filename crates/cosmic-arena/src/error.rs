//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// A construction or allocation parameter was rejected.
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },
    /// A request cannot be satisfied: either it is larger than one block,
    /// or the chain already holds `max_blocks` blocks and would need to grow.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Capacity that could not accommodate the request, in bytes.
        capacity: usize,
    },
    /// An item index falls outside the allocated range.
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,
        /// Number of addressable items (or blocks) at the time of the call.
        len: usize,
    },
    /// The allocator has been disposed; its blocks are gone.
    UseAfterDispose,
    /// A handle that does not belong to this allocator, or that was issued
    /// before the allocator was last reset.
    StaleHandle {
        /// The epoch encoded in the handle.
        handle_epoch: u64,
        /// The allocator's current epoch.
        current_epoch: u64,
    },
    /// A typed view was requested over bytes not aligned for the item type.
    Misaligned {
        /// Byte offset of the region within its block.
        offset: usize,
        /// Alignment required by the item type.
        align: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::UseAfterDispose => write!(f, "arena allocator used after dispose"),
            Self::StaleHandle {
                handle_epoch,
                current_epoch,
            } => {
                write!(
                    f,
                    "stale handle: epoch {handle_epoch}, current epoch {current_epoch}"
                )
            }
            Self::Misaligned { offset, align } => {
                write!(f, "region at offset {offset} is not aligned to {align} bytes")
            }
        }
    }
}

impl Error for ArenaError {}
