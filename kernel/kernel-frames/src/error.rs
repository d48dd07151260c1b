use crate::bounded::CapacityExceeded;
use kernel_memory_addresses::FrameNumber;

/// Contract violations reported by the frame layer.
///
/// None of these are transient conditions: every variant means a caller
/// broke an interface contract (or the registry is misconfigured), and the
/// embedding kernel is expected to treat them as fatal. "Pool has no run of
/// `n` free frames" is *not* an error; [`FramePool::get_frames`] reports it
/// with `None`.
///
/// [`FramePool::get_frames`]: crate::FramePool::get_frames
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FramePoolError {
    /// A pool must manage at least one frame beyond its own bitmap.
    #[error("pool of {frames} frame(s) cannot host its own {info_frames}-frame bitmap")]
    PoolTooSmall { frames: u32, info_frames: u32 },

    /// The externally provided bitmap storage is too small for the pool.
    #[error("{provided} info frame(s) provided, {required} required")]
    InsufficientInfoFrames { provided: u32, required: u32 },

    /// A reservation names frames outside the pool's managed range.
    #[error("frame range starting at {first:?} ({count} frame(s)) is outside the pool")]
    RangeOutOfBounds { first: FrameNumber, count: u32 },

    /// A reservation overlaps a frame that is not free.
    #[error("{0:?} is not free")]
    AlreadyAllocated(FrameNumber),

    /// A release named a frame that is not the head of an allocated
    /// sequence.
    #[error("{0:?} is not the head of an allocated sequence")]
    NotSequenceHead(FrameNumber),

    /// A release named a frame outside every registered pool.
    #[error("{0:?} belongs to no registered pool")]
    UnknownFrame(FrameNumber),

    /// Registering another pool would exceed the registry's capacity.
    #[error("pool registry is full: {0}")]
    RegistryFull(#[from] CapacityExceeded),
}
