use crate::bitmap::{FrameState, StateBitmap};
use crate::error::FramePoolError;
use kernel_memory_addresses::{FrameNumber, PAGE_SIZE, PhysMemory};

/// Frame states a single 4 KiB info frame can track (4 per byte).
pub const FRAMES_PER_INFO_FRAME: u32 = PAGE_SIZE * 8 / 2;

/// Where a pool's state bitmap lives.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitmapHost {
    /// The bitmap occupies the first frames of the managed range itself.
    /// Those frames are reserved during construction and never handed out.
    SelfHosted,
    /// The bitmap occupies `count` frames starting at `first`, outside the
    /// managed range (typically allocated from another pool).
    External { first: FrameNumber, count: u32 },
}

/// Allocator for contiguous runs of physical frames.
///
/// Manages the `count` frames starting at `base` with a first-fit scan over
/// a packed [`StateBitmap`]. All bitmap storage is physical memory reached
/// through [`PhysMemory`]; the pool object itself is a few words and can
/// live on the boot stack.
#[derive(Debug)]
pub struct FramePool {
    base: FrameNumber,
    count: u32,
    free_count: u32,
    bitmap: StateBitmap,
}

impl FramePool {
    /// Set up a pool over the `count` frames starting at `base`.
    ///
    /// All managed frames start out free, except that a self-hosted pool
    /// immediately reserves its own info frames (as an allocated sequence at
    /// the very start of the range).
    pub fn new<P: PhysMemory + ?Sized>(
        phys: &mut P,
        base: FrameNumber,
        count: u32,
        host: BitmapHost,
    ) -> Result<Self, FramePoolError> {
        let required = Self::needed_info_frames(count);
        let bitmap = match host {
            BitmapHost::SelfHosted => {
                // The bitmap must leave at least one allocatable frame.
                if required >= count {
                    log::error!(
                        "pool of {count} frame(s) at {base:?} cannot self-host a {required}-frame bitmap"
                    );
                    return Err(FramePoolError::PoolTooSmall {
                        frames: count,
                        info_frames: required,
                    });
                }
                StateBitmap::new(base)
            }
            BitmapHost::External { first, count: provided } => {
                if provided < required {
                    log::error!(
                        "pool of {count} frame(s) at {base:?} needs {required} info frame(s), got {provided}"
                    );
                    return Err(FramePoolError::InsufficientInfoFrames { provided, required });
                }
                StateBitmap::new(first)
            }
        };

        let mut pool = Self {
            base,
            count,
            free_count: count,
            bitmap,
        };
        for i in 0..count {
            pool.bitmap.set(phys, i, FrameState::Free);
        }
        if matches!(host, BitmapHost::SelfHosted) {
            pool.mark_inaccessible(phys, base, required)?;
        }
        log::debug!(
            "frame pool over {count} frame(s) at {base:?}, {} free",
            pool.free_count
        );
        Ok(pool)
    }

    /// Allocate `n` contiguous frames, returning the head frame.
    ///
    /// First-fit: the lowest run of exactly `n` consecutive free frames is
    /// taken. Returns `None` (leaving the pool untouched) when no such run
    /// exists or `n` is zero.
    pub fn get_frames<P: PhysMemory + ?Sized>(
        &mut self,
        phys: &mut P,
        n: u32,
    ) -> Option<FrameNumber> {
        if n == 0 || n > self.free_count {
            log::warn!(
                "cannot allocate {n} frame(s) from pool at {:?} ({} free)",
                self.base,
                self.free_count
            );
            return None;
        }
        let mut start = 0;
        'scan: while start + n <= self.count {
            for i in start..start + n {
                if self.bitmap.get(phys, i) != FrameState::Free {
                    start = i + 1;
                    continue 'scan;
                }
            }
            self.bitmap.set(phys, start, FrameState::Head);
            for i in start + 1..start + n {
                self.bitmap.set(phys, i, FrameState::Continuation);
            }
            self.free_count -= n;
            let head = self.base + start;
            log::trace!("allocated {n} frame(s) headed by {head:?}");
            return Some(head);
        }
        log::warn!(
            "no run of {n} contiguous free frame(s) in pool at {:?}",
            self.base
        );
        None
    }

    /// Reserve a specific frame range so it is never allocated.
    ///
    /// Used for memory holes and for bitmap self-hosting. The range must lie
    /// inside the pool and every frame in it must currently be free; it is
    /// recorded as an ordinary allocated sequence, so a (misguided) release
    /// of `first` would hand it back.
    pub fn mark_inaccessible<P: PhysMemory + ?Sized>(
        &mut self,
        phys: &mut P,
        first: FrameNumber,
        count: u32,
    ) -> Result<(), FramePoolError> {
        if count == 0 {
            return Ok(());
        }
        let start = first.as_u32().wrapping_sub(self.base.as_u32());
        if first.as_u32() < self.base.as_u32() || start + count > self.count {
            log::error!("reservation of {count} frame(s) at {first:?} is outside the pool");
            return Err(FramePoolError::RangeOutOfBounds { first, count });
        }
        for i in start..start + count {
            if self.bitmap.get(phys, i) != FrameState::Free {
                let frame = self.base + i;
                log::error!("reservation overlaps allocated {frame:?}");
                return Err(FramePoolError::AlreadyAllocated(frame));
            }
        }
        self.bitmap.set(phys, start, FrameState::Head);
        for i in start + 1..start + count {
            self.bitmap.set(phys, i, FrameState::Continuation);
        }
        self.free_count -= count;
        Ok(())
    }

    /// Release the allocated sequence headed by `head`, returning how many
    /// frames were freed.
    ///
    /// Frees the head and every continuation frame after it; the walk stops
    /// at the first frame that is free or heads an unrelated sequence.
    pub fn release_frames<P: PhysMemory + ?Sized>(
        &mut self,
        phys: &mut P,
        head: FrameNumber,
    ) -> Result<u32, FramePoolError> {
        if !self.contains(head) {
            return Err(FramePoolError::UnknownFrame(head));
        }
        let start = head.as_u32() - self.base.as_u32();
        if self.bitmap.get(phys, start) != FrameState::Head {
            log::error!("release of {head:?}, which is not a sequence head");
            return Err(FramePoolError::NotSequenceHead(head));
        }
        self.bitmap.set(phys, start, FrameState::Free);
        let mut freed = 1;
        let mut i = start + 1;
        while i < self.count && self.bitmap.get(phys, i) == FrameState::Continuation {
            self.bitmap.set(phys, i, FrameState::Free);
            freed += 1;
            i += 1;
        }
        self.free_count += freed;
        log::trace!("released {freed} frame(s) headed by {head:?}");
        Ok(freed)
    }

    /// Info frames required to track `frames` frame states.
    #[must_use]
    pub const fn needed_info_frames(frames: u32) -> u32 {
        frames.div_ceil(FRAMES_PER_INFO_FRAME)
    }

    /// Whether `frame` lies inside this pool's managed range.
    #[must_use]
    pub const fn contains(&self, frame: FrameNumber) -> bool {
        frame.as_u32() >= self.base.as_u32() && frame.as_u32() - self.base.as_u32() < self.count
    }

    /// First managed frame.
    #[must_use]
    pub const fn base_frame(&self) -> FrameNumber {
        self.base
    }

    /// Number of managed frames (including any self-hosted info frames).
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.count
    }

    /// Frames currently available for allocation.
    #[must_use]
    pub const fn free_count(&self) -> u32 {
        self.free_count
    }
}
