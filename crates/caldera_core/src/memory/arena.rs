//! # Arena Allocator
//!
//! A chunked bump allocator for scratch data that is freed all at once.

use std::cell::{Cell, RefCell};
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;
use std::slice;

use bytemuck::Zeroable;

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};

use super::align::ceil_pow2;
use super::chunk::Chunk;

/// Smallest chunk capacity the arena will create, in bytes.
pub const MIN_CHUNK_CAPACITY: usize = 256;

/// Smallest allocation alignment the arena will apply, in bytes.
pub const MIN_ALIGNMENT: usize = 4;

/// Allocation alignment used when none is given, in bytes.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// A growing chunked bump arena.
///
/// Allocations advance a cursor through pre-reserved backing chunks, so a
/// warm allocation is a handful of integer operations. When the current
/// chunk runs out, the arena first reuses an already-reserved later chunk
/// and only then asks the backing allocator for a new one. A single request
/// larger than the per-chunk capacity raises that capacity to the next power
/// of two and is served from a chunk sized for it.
///
/// Nothing is freed per object. [`Arena::reset`] reclaims all space at once
/// and keeps the backing memory warm; [`Arena::dispose`] (or dropping the
/// arena) releases it.
///
/// # Lifetimes
///
/// Allocation methods take `&self` and return borrows tied to that shared
/// borrow, while `reset` and `dispose` take `&mut self`. The borrow checker
/// therefore rejects any use of an allocation after the space has been
/// reclaimed; the "valid until the next reset" contract is compile-time
/// enforced, not a documentation promise.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe and does not implement `Send` or `Sync`.
/// Use one arena per thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(1024 * 1024)?; // 1 MiB chunks
///
/// // Fast allocations
/// let samples = arena.alloc_zeroed::<f32>(1000)?;
///
/// // Reclaim everything for the next frame
/// arena.reset()?;
/// ```
pub struct Arena {
    /// Backing chunks, in creation order. Interior mutability keeps the
    /// allocation methods on `&self` so returned borrows pin the arena.
    chunks: RefCell<Vec<Chunk>>,
    /// Index of the chunk new allocations try first.
    current: Cell<usize>,
    /// Capacity for every newly created chunk. A power of two; only grows.
    chunk_capacity: Cell<usize>,
    /// Byte alignment applied to every allocation. A power of two; fixed.
    alignment: usize,
}

impl Arena {
    /// Creates an arena with the given per-chunk capacity hint and the
    /// default alignment.
    ///
    /// The first chunk is reserved immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::AllocationFailed`] when the backing allocator
    /// cannot provide the first chunk, and [`ArenaError::SizeOverflow`] when
    /// the hint cannot be rounded up to a representable power of two.
    pub fn new(size_hint: usize) -> ArenaResult<Self> {
        Self::with_alignment(size_hint, DEFAULT_ALIGNMENT)
    }

    /// Creates an arena with explicit capacity and alignment hints.
    ///
    /// `size_hint` is clamped to [`MIN_CHUNK_CAPACITY`] and rounded up to
    /// the next power of two; that value becomes the capacity of every chunk
    /// created until an oversized request raises it. `alignment_hint` is
    /// clamped to [`MIN_ALIGNMENT`], rounded the same way, and fixed for the
    /// arena's lifetime.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Arena::new`].
    pub fn with_alignment(size_hint: usize, alignment_hint: usize) -> ArenaResult<Self> {
        let capacity =
            ceil_pow2(size_hint.max(MIN_CHUNK_CAPACITY)).ok_or(ArenaError::SizeOverflow)?;
        let alignment =
            ceil_pow2(alignment_hint.max(MIN_ALIGNMENT)).ok_or(ArenaError::SizeOverflow)?;

        let mut chunks = Vec::with_capacity(4);
        chunks.push(Chunk::new(capacity, alignment)?);

        Ok(Self {
            chunks: RefCell::new(chunks),
            current: Cell::new(0),
            chunk_capacity: Cell::new(capacity),
            alignment,
        })
    }

    /// Creates an arena from a loaded [`ArenaConfig`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Arena::new`].
    pub fn from_config(config: &ArenaConfig) -> ArenaResult<Self> {
        Self::with_alignment(config.chunk_capacity, config.alignment)
    }

    /// Allocates space for `count` uninitialized values of `T`.
    ///
    /// The returned slice starts at an address aligned to the arena
    /// alignment and lies inside exactly one chunk. Its content is
    /// unspecified; write every element before reading it.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidCount`] when `count` is zero
    /// - [`ArenaError::SizeOverflow`] when `size_of::<T>() * count` does not
    ///   fit in `usize`
    /// - [`ArenaError::AllocationFailed`] when a needed new chunk cannot be
    ///   reserved
    ///
    /// # Panics
    ///
    /// Panics when `T` requires a stricter alignment than the arena applies,
    /// or when the arena has been disposed.
    pub fn alloc_uninit<T>(&self, count: usize) -> ArenaResult<&mut [MaybeUninit<T>]> {
        let ptr = self.alloc_region::<T>(count)?;
        // SAFETY: `alloc_region` reserved `count * size_of::<T>()` bytes at
        // `ptr`, aligned for `T`. The region is exclusive to this call, and
        // the returned borrow pins the arena until it is dropped.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr().cast::<MaybeUninit<T>>(), count) })
    }

    /// Allocates space for `count` values of `T` and zero-fills it.
    ///
    /// `T: Zeroable` makes the all-zero bit pattern a valid value, so the
    /// slice is ready to read.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Arena::alloc_uninit`].
    ///
    /// # Panics
    ///
    /// Same conditions as [`Arena::alloc_uninit`].
    pub fn alloc_zeroed<T: Zeroable>(&self, count: usize) -> ArenaResult<&mut [T]> {
        let ptr = self.alloc_region::<T>(count)?.as_ptr().cast::<T>();
        // SAFETY: the region is reserved, writable, and `count` elements
        // long.
        unsafe { ptr.write_bytes(0, count) };
        // SAFETY: every byte was just zeroed and `T: Zeroable` makes that a
        // valid value for each element.
        Ok(unsafe { slice::from_raw_parts_mut(ptr, count) })
    }

    /// Moves `value` into the arena and returns a borrow of it.
    ///
    /// The arena never runs destructors: a value with a nontrivial `Drop`
    /// is leaked (not dropped) when the arena is reset or disposed.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::AllocationFailed`] when a needed new chunk cannot be
    ///   reserved
    ///
    /// # Panics
    ///
    /// Same conditions as [`Arena::alloc_uninit`].
    pub fn alloc<T>(&self, value: T) -> ArenaResult<&mut T> {
        let ptr = self.alloc_region::<T>(1)?.as_ptr().cast::<T>();
        // SAFETY: the region is reserved, aligned for `T`, and exclusive.
        unsafe { ptr.write(value) };
        // SAFETY: initialized just above; the borrow pins the arena.
        Ok(unsafe { &mut *ptr })
    }

    /// Reclaims all allocated space for reuse.
    ///
    /// When every chunk still has the current per-chunk capacity, each
    /// cursor is rewound in place and no backing traffic happens. When chunk
    /// sizes are mixed (an oversized request grew the capacity earlier), the
    /// arena instead collapses its history: all chunks are released and
    /// replaced by a single chunk sized to the next power of two at or above
    /// the bytes that were in use.
    ///
    /// Either way, previously returned borrows are gone; the borrow checker
    /// has already made sure none are live.
    ///
    /// # Errors
    ///
    /// Consolidation can fail with [`ArenaError::AllocationFailed`] or
    /// [`ArenaError::SizeOverflow`]; the arena is left unchanged in that
    /// case.
    ///
    /// # Panics
    ///
    /// Panics when the arena has been disposed.
    pub fn reset(&mut self) -> ArenaResult<()> {
        let chunks = self.chunks.get_mut();
        assert!(!chunks.is_empty(), "arena used after dispose");

        let capacity = self.chunk_capacity.get();

        if chunks.iter().all(|chunk| chunk.capacity() == capacity) {
            let used: usize = chunks.iter().map(Chunk::used).sum();
            tracing::debug!(
                "arena reset: rewound {} chunks, {} of {} bytes were used",
                chunks.len(),
                used,
                capacity * chunks.len()
            );
            for chunk in chunks.iter_mut() {
                chunk.rewind();
            }
            self.current.set(0);
            return Ok(());
        }

        // Mixed chunk sizes: collapse history into one chunk sized to the
        // high-water mark.
        let total_used: usize = chunks.iter().map(Chunk::used).sum();
        let capacity = if total_used > capacity {
            ceil_pow2(total_used).ok_or(ArenaError::SizeOverflow)?
        } else {
            capacity
        };
        // Reserve the replacement before releasing anything, so a failure
        // leaves the arena untouched.
        let fresh = Chunk::new(capacity, self.alignment)?;
        tracing::debug!(
            "arena reset: consolidated {} chunks ({} bytes used) into one {} byte chunk",
            chunks.len(),
            total_used,
            capacity
        );
        chunks.clear();
        chunks.push(fresh);
        self.current.set(0);
        self.chunk_capacity.set(capacity);
        Ok(())
    }

    /// Releases all backing memory.
    ///
    /// Idempotent: disposing an already-disposed arena does nothing. After
    /// dispose the arena is inert; any further allocation or reset is a
    /// contract violation and panics, while the introspection getters keep
    /// working and report zero.
    ///
    /// Dropping the arena disposes it as a safety net, but explicit disposal
    /// is the primary contract.
    pub fn dispose(&mut self) {
        let chunks = self.chunks.get_mut();
        if chunks.is_empty() {
            return;
        }
        tracing::debug!("arena disposed: released {} chunks", chunks.len());
        chunks.clear();
        self.current.set(0);
    }

    /// Total bytes reserved across all chunks.
    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.chunks.borrow().iter().map(Chunk::capacity).sum()
    }

    /// Total bytes handed out across all chunks, alignment padding included.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.chunks.borrow().iter().map(Chunk::used).sum()
    }

    /// Total bytes still available across all chunks.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.reserved_bytes() - self.used_bytes()
    }

    /// Number of chunks currently reserved.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Whether any chunk was created under an older, smaller per-chunk
    /// capacity. A mixed arena consolidates on the next [`Arena::reset`].
    #[must_use]
    pub fn has_mixed_chunk_sizes(&self) -> bool {
        let capacity = self.chunk_capacity.get();
        self.chunks
            .borrow()
            .iter()
            .any(|chunk| chunk.capacity() != capacity)
    }

    /// Capacity in bytes used for every newly created chunk.
    #[must_use]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity.get()
    }

    /// Byte alignment applied to every allocation.
    #[inline]
    #[must_use]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Index of the chunk new allocations try first.
    #[must_use]
    pub fn current_chunk_index(&self) -> usize {
        self.current.get()
    }

    /// Checks the element contract and sizes the request.
    fn alloc_region<T>(&self, count: usize) -> ArenaResult<NonNull<u8>> {
        assert!(
            mem::align_of::<T>() <= self.alignment,
            "element alignment {} exceeds the arena alignment {}",
            mem::align_of::<T>(),
            self.alignment
        );
        if count == 0 {
            return Err(ArenaError::InvalidCount);
        }
        let size = mem::size_of::<T>()
            .checked_mul(count)
            .ok_or(ArenaError::SizeOverflow)?;
        self.alloc_bytes(size)
    }

    /// Reserves `size` bytes starting at an address aligned to the arena
    /// alignment.
    fn alloc_bytes(&self, size: usize) -> ArenaResult<NonNull<u8>> {
        let mut chunks = self.chunks.borrow_mut();
        assert!(!chunks.is_empty(), "arena used after dispose");

        // Oversized request: no chunk of the present capacity can hold it.
        // Raise the per-chunk capacity to a power of two that does and serve
        // from a chunk sized for the request. Existing chunks keep their
        // original size.
        if size > self.chunk_capacity.get() {
            let capacity = ceil_pow2(size).ok_or(ArenaError::SizeOverflow)?;
            let chunk = Chunk::new(capacity, self.alignment)?;
            tracing::trace!("arena chunk capacity grew to {} bytes", capacity);
            self.chunk_capacity.set(capacity);
            return Ok(self.push_current(&mut chunks, chunk, size));
        }

        // Fast path: bump the current chunk.
        let index = self.current.get();
        if let Some(ptr) = chunks[index].bump(size, self.alignment) {
            return Ok(ptr);
        }

        // Reuse: a later chunk may already be reserved from an earlier
        // growth event. It keeps whatever offset it carries.
        if index + 1 < chunks.len() {
            self.current.set(index + 1);
            if let Some(ptr) = chunks[index + 1].bump(size, self.alignment) {
                return Ok(ptr);
            }
        }

        // Growth: append a fresh chunk of the present capacity.
        let chunk = Chunk::new(self.chunk_capacity.get(), self.alignment)?;
        Ok(self.push_current(&mut chunks, chunk, size))
    }

    /// Appends `chunk`, makes it current, and serves the bounded request
    /// from its start.
    fn push_current(&self, chunks: &mut Vec<Chunk>, mut chunk: Chunk, size: usize) -> NonNull<u8> {
        let Some(ptr) = chunk.bump(size, self.alignment) else {
            // A fresh chunk starts at offset zero and was sized to hold the
            // request, so the bump cannot miss.
            unreachable!("fresh chunk smaller than the request it was sized for");
        };
        chunks.push(chunk);
        self.current.set(chunks.len() - 1);
        ptr
    }
}

impl Drop for Arena {
    /// End-of-life safety net; [`Arena::dispose`] remains the primary
    /// contract.
    fn drop(&mut self) {
        self.dispose();
    }
}
