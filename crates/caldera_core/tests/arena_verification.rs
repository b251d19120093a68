//! # Arena Verification Tests
//!
//! End-to-end checks of the allocator contract:
//!
//! 1. **Spike scenario**: an oversized request grows the per-chunk capacity
//!    and the following reset consolidates to one right-sized chunk
//! 2. **Disjointness**: every live allocation owns its own byte range
//! 3. **Reuse**: a uniform reset keeps every backing chunk warm
//! 4. **Lifecycle**: dispose releases everything and tolerates repetition
//!
//! Run with: cargo test --test arena_verification -- --nocapture

use caldera_core::{Arena, ArenaConfig, ArenaError};

// ============================================================================
// SCENARIO 1: SPIKE, GROWTH, CONSOLIDATION
// ============================================================================

#[test]
fn verify_spike_grows_then_consolidates() {
    let mut arena = Arena::with_alignment(256, 16).unwrap();
    assert_eq!(arena.chunk_capacity(), 256);

    // 10 bytes land at the start of the first chunk.
    let small = arena.alloc_uninit::<u8>(10).unwrap();
    assert_eq!(small.len(), 10);
    assert_eq!(arena.used_bytes(), 10);

    // 300 bytes exceed the per-chunk capacity: the capacity is raised to the
    // next power of two and a chunk sized for the request becomes current.
    let spike = arena.alloc_uninit::<u8>(300).unwrap();
    assert_eq!(spike.len(), 300);
    assert_eq!(arena.chunk_capacity(), 512);
    assert_eq!(arena.chunk_count(), 2);
    assert_eq!(arena.current_chunk_index(), 1);
    assert_eq!(arena.used_bytes(), 310);
    assert!(arena.has_mixed_chunk_sizes());

    // The original 256 byte chunk kept its size.
    assert_eq!(arena.reserved_bytes(), 256 + 512);

    // Mixed sizes force a consolidating reset: one fresh chunk, sized to the
    // next power of two at or above the 310 bytes that were in use.
    arena.reset().unwrap();
    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.chunk_capacity(), 512);
    assert_eq!(arena.reserved_bytes(), 512);
    assert_eq!(arena.used_bytes(), 0);
    assert!(!arena.has_mixed_chunk_sizes());
}

// ============================================================================
// SCENARIO 2: DISJOINT, ALIGNED, IN-BOUNDS ALLOCATIONS
// ============================================================================

#[test]
fn verify_allocations_are_disjoint_and_aligned() {
    let arena = Arena::with_alignment(1024, 16).unwrap();

    // A spread of sizes, enough to roll over several chunks.
    let sizes = [1usize, 7, 16, 33, 120, 256, 9, 64, 500, 48];
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for round in 0..8 {
        for &size in &sizes {
            let bytes = arena.alloc_uninit::<u8>(size).unwrap();
            assert_eq!(bytes.len(), size);
            let start = bytes.as_ptr() as usize;
            assert_eq!(start % 16, 0, "round {round}: unaligned start");
            ranges.push((start, start + size));
        }
    }

    for (i, &(a_start, a_end)) in ranges.iter().enumerate() {
        for &(b_start, b_end) in &ranges[i + 1..] {
            assert!(
                a_end <= b_start || b_end <= a_start,
                "ranges {a_start:#x}..{a_end:#x} and {b_start:#x}..{b_end:#x} overlap"
            );
        }
    }
}

#[test]
fn verify_typed_allocations_round_trip() {
    #[derive(Clone, Copy, PartialEq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Particle {
        position: [f32; 3],
        life: f32,
    }

    let arena = Arena::new(4096).unwrap();

    let particles = arena.alloc_zeroed::<Particle>(128).unwrap();
    assert_eq!(particles.len(), 128);
    assert!(particles.iter().all(|p| p.life == 0.0));

    for (i, particle) in particles.iter_mut().enumerate() {
        particle.life = i as f32;
    }
    assert_eq!(particles[127].life, 127.0);

    let lone = arena
        .alloc(Particle {
            position: [1.0, 2.0, 3.0],
            life: 9.5,
        })
        .unwrap();
    assert_eq!(lone.position, [1.0, 2.0, 3.0]);
    assert_eq!(lone.life, 9.5);
}

// ============================================================================
// SCENARIO 3: RESET REUSE ACROSS FRAMES
// ============================================================================

#[test]
fn verify_frame_loop_reuses_chunks() {
    let mut arena = Arena::new(256).unwrap();

    // Warm up to two uniform chunks.
    let _ = arena.alloc_uninit::<u8>(200).unwrap();
    let _ = arena.alloc_uninit::<u8>(200).unwrap();
    assert_eq!(arena.chunk_count(), 2);
    let reserved = arena.reserved_bytes();

    // A workload that fluctuates under and over one chunk must not grow the
    // arena any further across reset cycles.
    for frame in 0..100 {
        arena.reset().unwrap();
        assert_eq!(arena.used_bytes(), 0, "frame {frame}: reset left bytes");

        let _ = arena.alloc_uninit::<u8>(150).unwrap();
        if frame % 2 == 0 {
            let _ = arena.alloc_uninit::<u8>(150).unwrap();
        }
        assert_eq!(arena.chunk_count(), 2, "frame {frame}: chunk count grew");
        assert_eq!(arena.reserved_bytes(), reserved);
    }
}

// ============================================================================
// SCENARIO 4: LIFECYCLE AND FAILURE SURFACE
// ============================================================================

#[test]
fn verify_dispose_lifecycle() {
    let mut arena = Arena::new(256).unwrap();
    let _ = arena.alloc_uninit::<u8>(300).unwrap();
    assert!(arena.reserved_bytes() > 0);

    arena.dispose();
    assert_eq!(arena.chunk_count(), 0);
    assert_eq!(arena.reserved_bytes(), 0);
    assert_eq!(arena.free_bytes(), 0);

    // Redundant disposal is a no-op, not an error.
    arena.dispose();
    assert_eq!(arena.chunk_count(), 0);
}

#[test]
fn verify_error_surface() {
    let arena = Arena::new(256).unwrap();
    assert_eq!(
        arena.alloc_uninit::<u8>(0).unwrap_err(),
        ArenaError::InvalidCount
    );
    assert_eq!(
        arena.alloc_uninit::<u32>(usize::MAX / 2).unwrap_err(),
        ArenaError::SizeOverflow
    );
    // Failed calls consume nothing.
    assert_eq!(arena.used_bytes(), 0);
    assert_eq!(arena.chunk_count(), 1);
}

#[test]
fn verify_config_driven_construction() {
    let config = ArenaConfig::from_toml_str("chunk_capacity = 8192\nalignment = 32\n").unwrap();
    let arena = Arena::from_config(&config).unwrap();
    assert_eq!(arena.chunk_capacity(), 8192);
    assert_eq!(arena.alignment(), 32);
    assert_eq!(arena.chunk_count(), 1);
}
