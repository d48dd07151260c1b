use crate::error::VmemError;
use crate::page_entry::PageEntry;
use crate::translate;
use kernel_memory_addresses::{PhysMemory, TABLE_ENTRIES, VirtualAddress};
use kernel_registers::PagingRegisters;

/// Directory slot reserved for the recursive self-map.
///
/// An address space points this slot's entry back at the directory frame
/// itself, which carves the top 4 MiB of every address space into a window
/// over its own paging structures.
pub const RECURSIVE_SLOT: usize = 1023;

/// Virtual-address window over the live paging structures.
///
/// With the recursive slot installed, the normal two-level walk reaches the
/// paging entries themselves at fixed virtual addresses:
///
/// | Entry | Window address |
/// |-------|----------------|
/// | Directory entry `d` | `0xFFFF_F000 + d*4` |
/// | Table entry `t` of directory slot `d` | `0xFFC0_0000 + d*4096 + t*4` |
///
/// This is how paging code edits page tables *after* paging is enabled,
/// when table frames are no longer reachable by their physical addresses.
/// The accessors here resolve a window address through the same walk the
/// MMU performs, so they inherit its one hard sequencing rule: the
/// directory entry for slot `d` must be present before any table-window
/// address under `d` is touched. Violations surface as
/// [`VmemError::WindowFault`] instead of a wild pointer write.
#[derive(Copy, Clone, Debug, Default)]
pub struct TranslationWindow;

impl TranslationWindow {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Window address of directory entry `dir`.
    ///
    /// `dir` must be below [`TABLE_ENTRIES`] (debug-asserted).
    #[must_use]
    pub const fn pde_address(dir: usize) -> VirtualAddress {
        debug_assert!(dir < TABLE_ENTRIES);
        // dir index RECURSIVE_SLOT, table index RECURSIVE_SLOT, offset dir*4
        VirtualAddress::new(0xFFFF_F000 | (dir as u32) << 2)
    }

    /// Window address of table entry `table` under directory slot `dir`.
    #[must_use]
    pub const fn pte_address(dir: usize, table: usize) -> VirtualAddress {
        debug_assert!(dir < TABLE_ENTRIES);
        debug_assert!(table < TABLE_ENTRIES);
        // dir index RECURSIVE_SLOT, table index dir, offset table*4
        VirtualAddress::new(0xFFC0_0000 | ((dir as u32) << 12) | ((table as u32) << 2))
    }

    /// Window address of the directory entry governing `va`.
    #[must_use]
    pub const fn pde_address_of(va: VirtualAddress) -> VirtualAddress {
        Self::pde_address(va.directory_index())
    }

    /// Window address of the table entry governing `va`.
    #[must_use]
    pub const fn pte_address_of(va: VirtualAddress) -> VirtualAddress {
        Self::pte_address(va.directory_index(), va.table_index())
    }

    /// Read directory entry `dir` of the loaded address space.
    pub fn read_pde<P, R>(self, phys: &P, hw: &R, dir: usize) -> Result<PageEntry, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let va = Self::pde_address(dir);
        let pa = translate::resolve(phys, hw, va).map_err(|_| VmemError::WindowFault(va))?;
        Ok(PageEntry::from_bits(phys.read_u32(pa)))
    }

    /// Write directory entry `dir` of the loaded address space.
    pub fn write_pde<P, R>(
        self,
        phys: &mut P,
        hw: &R,
        dir: usize,
        entry: PageEntry,
    ) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let va = Self::pde_address(dir);
        let pa = translate::resolve(phys, hw, va).map_err(|_| VmemError::WindowFault(va))?;
        phys.write_u32(pa, entry.into_bits());
        Ok(())
    }

    /// Read table entry `table` under directory slot `dir`.
    ///
    /// Fails with [`VmemError::WindowFault`] if directory entry `dir` is not
    /// present.
    pub fn read_pte<P, R>(
        self,
        phys: &P,
        hw: &R,
        dir: usize,
        table: usize,
    ) -> Result<PageEntry, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let va = Self::pte_address(dir, table);
        let pa = translate::resolve(phys, hw, va).map_err(|_| VmemError::WindowFault(va))?;
        Ok(PageEntry::from_bits(phys.read_u32(pa)))
    }

    /// Write table entry `table` under directory slot `dir`.
    pub fn write_pte<P, R>(
        self,
        phys: &mut P,
        hw: &R,
        dir: usize,
        table: usize,
        entry: PageEntry,
    ) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let va = Self::pte_address(dir, table);
        let pa = translate::resolve(phys, hw, va).map_err(|_| VmemError::WindowFault(va))?;
        phys.write_u32(pa, entry.into_bits());
        Ok(())
    }

    /// Clear every entry of the table under directory slot `dir`.
    ///
    /// Run on a freshly allocated table frame, whose contents are whatever
    /// its previous owner left there. Requires directory entry `dir` to be
    /// present already.
    pub fn clear_table<P, R>(self, phys: &mut P, hw: &R, dir: usize) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        for table in 0..TABLE_ENTRIES {
            self.write_pte(phys, hw, dir, table, PageEntry::new())?;
        }
        Ok(())
    }
}
