use kernel_frames::{CapacityExceeded, FramePoolError};
use kernel_memory_addresses::{FrameNumber, VirtualAddress};
use kernel_registers::FaultCode;

/// Failures of the paging layer.
///
/// As in the frame layer, variants split into "cannot satisfy" conditions a
/// caller may handle ([`OutOfFrames`](Self::OutOfFrames),
/// [`RegionListFull`](Self::RegionListFull)) and contract violations the
/// embedding kernel treats as fatal (everything touching an illegal address
/// or a mis-sequenced operation).
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VmemError {
    /// A fault fired on a page that was present: the access itself was
    /// disallowed. Never recoverable by mapping something.
    #[error("protection violation at {address:?} ({code})")]
    ProtectionViolation {
        address: VirtualAddress,
        code: FaultCode,
    },

    /// A fault fired on an address no registered pool claims.
    #[error("illegitimate access at {0:?}")]
    IllegalAddress(VirtualAddress),

    /// `enable_paging` ran while some other directory (or none) was loaded.
    #[error("cannot enable paging: loaded directory is frame {loaded}, expected frame {directory}")]
    NotLoaded {
        loaded: FrameNumber,
        directory: FrameNumber,
    },

    /// A frame pool ran dry while backing a mapping.
    #[error("out of frames in the {0} pool")]
    OutOfFrames(&'static str),

    /// A translation-window access did not resolve, meaning the entry it
    /// should reach has no present path (directory not loaded, or the
    /// directory entry was not made present first).
    #[error("translation window access at {0:?} is unmapped")]
    WindowFault(VirtualAddress),

    /// Fault handling reported success but the address still does not
    /// translate.
    #[error("access to {0:?} still faults after handling")]
    FaultLoop(VirtualAddress),

    /// A pool was created with an unusable virtual region.
    #[error("invalid virtual region at {base:?} ({size} bytes)")]
    InvalidRegion { base: VirtualAddress, size: u32 },

    /// A pool's fixed region array is exhausted.
    #[error("pool {list} region list is full")]
    RegionListFull { list: &'static str },

    /// Release of an address that is not the base of an allocated region
    /// (including double release).
    #[error("no allocated region starts at {0:?}")]
    UnknownRegion(VirtualAddress),

    /// An address space cannot register another pool.
    #[error("address-space pool registry is full: {0}")]
    PoolRegistryFull(#[from] CapacityExceeded),

    /// An underlying frame-pool contract violation.
    #[error(transparent)]
    Frames(#[from] FramePoolError),
}
