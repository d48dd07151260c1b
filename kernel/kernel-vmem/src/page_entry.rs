use bitfield_struct::bitfield;
use kernel_memory_addresses::FrameNumber;

/// One 32-bit paging entry, used both as a page-directory entry (pointing at
/// a page table) and as a page-table entry (pointing at a data frame).
///
/// The two levels share a layout; only the meaning of the target frame
/// differs.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct PageEntry {
    /// Bit 0 — Entry is valid; clear entries fault on access.
    pub present: bool,

    /// Bit 1 — Writes allowed through this entry.
    pub writable: bool,

    /// Bit 2 — User-mode access allowed (clear: supervisor only).
    pub user_access: bool,

    /// Bit 3 — Page-level write-through.
    pub write_through: bool,

    /// Bit 4 — Page-level cache disable.
    pub cache_disabled: bool,

    /// Bit 5 — Set by hardware on any access through the entry.
    pub accessed: bool,

    /// Bit 6 — Set by hardware on a write through the entry.
    pub dirty: bool,

    /// Bits 7–11 — Ignored by the walk; available to the OS.
    #[bits(5)]
    pub os_avail: u8,

    /// Bits 12–31 — Target frame index.
    #[bits(20)]
    frame_raw: u32,
}

impl PageEntry {
    /// A present, writable, supervisor-only entry targeting `frame`.
    ///
    /// The shape used for every structure this kernel maps: identity pages,
    /// page tables and demand-paged data frames alike.
    #[must_use]
    pub const fn kernel_data(frame: FrameNumber) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_frame_raw(frame.as_u32())
    }

    /// Target frame of this entry.
    #[must_use]
    pub const fn frame(&self) -> FrameNumber {
        FrameNumber::new(self.frame_raw())
    }

    /// This entry retargeted at `frame`.
    #[must_use]
    pub const fn with_frame(self, frame: FrameNumber) -> Self {
        self.with_frame_raw(frame.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_the_walk_hardware_expects() {
        let entry = PageEntry::kernel_data(FrameNumber::new(0x301));
        assert!(entry.present());
        assert!(entry.writable());
        assert!(!entry.user_access());
        // present | writable | frame << 12
        assert_eq!(entry.into_bits(), 0x0030_1003);
    }

    #[test]
    fn cleared_entries_are_not_present() {
        let entry = PageEntry::from_bits(0);
        assert!(!entry.present());
        assert_eq!(entry.frame(), FrameNumber::new(0));
    }
}
