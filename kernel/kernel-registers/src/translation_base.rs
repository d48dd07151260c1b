use bitfield_struct::bitfield;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress};

/// Translation-base register (page-directory base, CR3-style).
///
/// Holds the physical base of the active page directory plus cache-control
/// flags for directory walks. The directory is always 4 KiB aligned, so only
/// the frame index is stored.
#[bitfield(u32)]
pub struct TranslationBase {
    /// Bits 0–2 — Reserved (must be 0).
    #[bits(3)]
    reserved0: u8,

    /// Bit 3 — Page-level write-through for directory accesses.
    pub pwt: bool,

    /// Bit 4 — Page-level cache disable for directory accesses.
    pub pcd: bool,

    /// Bits 5–11 — Reserved (must be 0 when written).
    #[bits(7)]
    reserved1: u8,

    /// Bits 12–31 — Physical base of the directory, shifted right by 12.
    #[bits(20)]
    directory_frame_raw: u32,
}

impl TranslationBase {
    /// Build a register value pointing at `directory`.
    #[must_use]
    pub const fn from_directory(directory: FrameNumber) -> Self {
        Self::new().with_directory_frame_raw(directory.as_u32())
    }

    /// Frame holding the active page directory.
    #[must_use]
    pub const fn directory_frame(&self) -> FrameNumber {
        FrameNumber::new(self.directory_frame_raw())
    }

    /// Full physical address of the active page directory.
    #[must_use]
    pub const fn directory_base(&self) -> PhysicalAddress {
        self.directory_frame().base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_directory_frame() {
        let base = TranslationBase::from_directory(FrameNumber::new(0x301));
        assert_eq!(base.directory_frame(), FrameNumber::new(0x301));
        assert_eq!(base.directory_base(), PhysicalAddress::new(0x0030_1000));
        assert!(!base.pwt());
        assert!(!base.pcd());
    }

    #[test]
    fn flags_do_not_disturb_the_base() {
        let base = TranslationBase::from_directory(FrameNumber::new(7))
            .with_pwt(true)
            .with_pcd(true);
        assert_eq!(base.directory_frame(), FrameNumber::new(7));
        assert_eq!(base.into_bits() & 0xFFF, 0b1_1000);
    }
}
