//! # CALDERA Core Allocator
//!
//! Chunked linear (bump) arena for frame-scratch memory:
//! - Allocation is a pointer bump into pre-reserved backing chunks
//! - Nothing is freed per object; space comes back in bulk on `reset`
//! - Backing memory is released on `dispose` (or on drop, as a safety net)
//!
//! ## Architecture Rules
//!
//! 1. **No backing traffic on the hot path** - a warm chunk serves
//!    allocations with a handful of integer operations
//! 2. **Exclusive ownership** - the arena owns every chunk; callers only
//!    ever hold borrows that the compiler scopes to the next `reset`
//! 3. **Single-threaded** - one arena per thread, no locks anywhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use caldera_core::Arena;
//!
//! let mut arena = Arena::new(4 * 1024 * 1024)?;
//!
//! // Per-frame scratch: pointer-bump fast, aligned, contiguous
//! let verts = arena.alloc_zeroed::<[f32; 3]>(4096)?;
//!
//! // End of frame: everything comes back at once
//! arena.reset()?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;

pub use config::ArenaConfig;
pub use error::{ArenaError, ArenaResult, ConfigError};
pub use memory::{Arena, DEFAULT_ALIGNMENT, MIN_ALIGNMENT, MIN_CHUNK_CAPACITY};
