//! # Physical Frame Management
//!
//! Contiguous allocation of physical memory frames, tracked with a packed
//! two-bit-per-frame state bitmap that lives **in physical frames itself** —
//! either inside the managed pool ("self-hosted") or in frames donated by
//! another pool. This is the lowest allocation layer of the kernel: paging
//! metadata, demand-paged data and device buffers all come from here.
//!
//! ## Frame states
//!
//! Every frame is in one of three states:
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Free` | Available for allocation. |
//! | `Head` | First frame of an allocated contiguous sequence. |
//! | `Continuation` | Allocated, part of a sequence started by an earlier `Head`. |
//!
//! The head/continuation split is what makes *contiguous* allocation
//! releasable from nothing but a frame number: releasing starts at a `Head`
//! and walks forward until it reaches a frame that is `Free` or is itself a
//! `Head` (the start of an unrelated allocation).
//!
//! ## Pools and the registry
//!
//! A [`FramePool`] manages one contiguous frame range. Multiple pools exist
//! at once (kernel pool for paging metadata, process pool for data pages),
//! so releasing by bare frame number needs a way to find the owning pool:
//! the [`FrameRegistry`] holds every pool and resolves the number by range
//! scan. The registry is an explicit object constructed during kernel
//! initialization and passed by reference — there is no ambient global list.
//!
//! ## Failure model
//!
//! An unsatisfiable allocation returns `None` and leaves the pool untouched;
//! retry policy belongs to the caller. Contract violations — releasing a
//! non-head frame, releasing a frame no pool owns, reserving an out-of-range
//! or already-allocated region, overflowing the registry — are reported via
//! [`FramePoolError`] after logging; the embedder halts on them, nothing at
//! this layer retries.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod bitmap;
mod bounded;
mod error;
mod pool;
mod registry;

pub use bitmap::{FrameState, StateBitmap};
pub use bounded::{BoundedVec, CapacityExceeded};
pub use error::FramePoolError;
pub use pool::{BitmapHost, FRAMES_PER_INFO_FRAME, FramePool};
pub use registry::{FrameRegistry, MAX_POOLS, PoolId};
