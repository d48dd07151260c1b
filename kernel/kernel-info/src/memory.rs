//! # Memory Layout
//!
//! The physical layout assumed by boot code and the default test machine:
//!
//! ```text
//! 0 MiB ─┬───────────────────────────────┐
//!        │ shared / identity-mapped      │  first SHARED_SIZE bytes,
//! 2 MiB ─┼───────────────────────────────┤  mapped 1:1 at boot
//!        │ kernel frame pool             │  directories, page tables
//! 4 MiB ─┼───────────────────────────────┤
//!        │ process frame pool            │  demand-paged data frames
//!        │ ...                           │
//! 32 MiB ┴───────────────────────────────┘  default machine size
//! ```

/// Size of one physical frame and one logical page, in bytes.
pub const FRAME_SIZE: u32 = 4096;

/// Bytes of low memory that every address space identity-maps at
/// construction (kernel text/data, frame-pool bitmaps, the pools below).
pub const SHARED_SIZE: u32 = 4 * 1024 * 1024;

/// First frame of the kernel pool (2 MiB). Frames here back paging
/// metadata: directories and page tables.
pub const KERNEL_POOL_START_FRAME: u32 = 512;

/// Number of frames in the kernel pool (2 MiB worth).
pub const KERNEL_POOL_FRAMES: u32 = 512;

/// First frame of the process pool (4 MiB). Frames here back demand-paged
/// data pages.
pub const PROCESS_POOL_START_FRAME: u32 = 1024;

/// Number of frames in the process pool (28 MiB worth).
pub const PROCESS_POOL_FRAMES: u32 = 7 * 1024;

/// Total frame count of the default simulated machine (32 MiB).
pub const MACHINE_FRAMES: u32 = 8192;

const _: () = {
    assert!(SHARED_SIZE.is_multiple_of(FRAME_SIZE));
    assert!(KERNEL_POOL_START_FRAME * FRAME_SIZE == 2 * 1024 * 1024);
    assert!(KERNEL_POOL_START_FRAME + KERNEL_POOL_FRAMES == PROCESS_POOL_START_FRAME);
    // Both pools sit inside the identity-mapped low region or the machine.
    assert!(PROCESS_POOL_START_FRAME + PROCESS_POOL_FRAMES <= MACHINE_FRAMES);
    assert!(PROCESS_POOL_START_FRAME * FRAME_SIZE == SHARED_SIZE);
};
