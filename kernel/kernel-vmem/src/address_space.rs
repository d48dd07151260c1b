use crate::error::VmemError;
use crate::page_entry::PageEntry;
use crate::vm_pool::VmPoolShared;
use crate::window::{RECURSIVE_SLOT, TranslationWindow};
use alloc::rc::Rc;
use kernel_frames::{BoundedVec, FrameRegistry, PoolId};
use kernel_memory_addresses::{FrameNumber, PAGE_SIZE, PhysMemory, TABLE_ENTRIES, VirtualAddress};
use kernel_registers::{FaultCode, PagingRegisters, TranslationBase};

/// Virtual-memory pools one address space can carry.
pub const MAX_VM_POOLS: usize = 8;

/// Which frame pools back an address space, and how much low memory every
/// space identity-maps.
#[derive(Copy, Clone, Debug)]
pub struct PagingConfig {
    /// Pool for paging metadata: directories and page tables.
    pub kernel_pool: PoolId,
    /// Pool for demand-paged data frames.
    pub process_pool: PoolId,
    /// Bytes of low memory mapped 1:1 in every space (kernel image, frame
    /// bitmaps, the pools themselves). Multiple of 4 KiB.
    pub shared_size: u32,
}

/// One page directory and everything hanging off it.
///
/// The object itself owns only the directory's frame number and the list of
/// registered virtual-memory pools; the actual translation structures live
/// in physical frames from the kernel pool.
pub struct AddressSpace {
    directory: FrameNumber,
    pools: BoundedVec<Rc<VmPoolShared>, MAX_VM_POOLS>,
}

impl AddressSpace {
    /// Build a fresh address space.
    ///
    /// Allocates and zeroes a directory frame, identity-maps the shared
    /// region (present, writable, supervisor) and installs the recursive
    /// self-map in slot [`RECURSIVE_SLOT`]. Runs entirely on physical
    /// addresses; the space is not loaded and paging is untouched.
    pub fn new<P>(
        registry: &mut FrameRegistry,
        config: &PagingConfig,
        phys: &mut P,
    ) -> Result<Self, VmemError>
    where
        P: PhysMemory + ?Sized,
    {
        let directory = Self::kernel_frame(registry, config, phys)?;
        for i in 0..TABLE_ENTRIES {
            phys.write_u32(directory.byte((i * 4) as u32), 0);
        }

        let shared_pages = config.shared_size / PAGE_SIZE;
        let tables = config
            .shared_size
            .div_ceil(PAGE_SIZE * TABLE_ENTRIES as u32);
        for t in 0..tables {
            let table = Self::kernel_frame(registry, config, phys)?;
            for e in 0..TABLE_ENTRIES as u32 {
                let page = t * TABLE_ENTRIES as u32 + e;
                let bits = if page < shared_pages {
                    PageEntry::kernel_data(FrameNumber::new(page)).into_bits()
                } else {
                    0
                };
                phys.write_u32(table.byte(e * 4), bits);
            }
            phys.write_u32(
                directory.byte(t * 4),
                PageEntry::kernel_data(table).into_bits(),
            );
        }

        phys.write_u32(
            directory.byte((RECURSIVE_SLOT * 4) as u32),
            PageEntry::kernel_data(directory).into_bits(),
        );

        log::debug!(
            "address space with directory {directory:?}, {shared_pages} shared page(s)"
        );
        Ok(Self {
            directory,
            pools: BoundedVec::new(),
        })
    }

    /// Make this space the active one by loading the translation base.
    pub fn load<R>(&self, hw: &mut R)
    where
        R: PagingRegisters + ?Sized,
    {
        hw.set_translation_base(TranslationBase::from_directory(self.directory));
        log::debug!("loaded directory {:?}", self.directory);
    }

    /// Turn translation on.
    ///
    /// This space must be the loaded one; enabling paging while another
    /// directory (or none) is loaded would put the machine into an address
    /// space the caller does not hold.
    pub fn enable_paging<R>(&self, hw: &mut R) -> Result<(), VmemError>
    where
        R: PagingRegisters + ?Sized,
    {
        let loaded = hw.translation_base().directory_frame();
        if loaded != self.directory {
            log::error!(
                "enable_paging: loaded directory is {loaded:?}, not {:?}",
                self.directory
            );
            return Err(VmemError::NotLoaded {
                loaded,
                directory: self.directory,
            });
        }
        hw.set_control(hw.control().with_paging_enabled(true));
        log::info!("paging enabled, directory {:?}", self.directory);
        Ok(())
    }

    /// Serve a page fault at the address recorded in the fault register.
    ///
    /// Must run while this space is loaded (it is, when its fault arrives).
    /// The sequence on a legitimate not-present fault:
    ///
    /// 1. If the directory entry is absent: allocate a table frame from the
    ///    kernel pool, make the directory entry present, *then* wipe the new
    ///    table through the translation window. The window under a slot only
    ///    translates once that slot is present, so this order is the only
    ///    one that works.
    /// 2. Allocate a data frame from the process pool and point the table
    ///    entry at it.
    ///
    /// A protection violation or an address no registered pool claims is
    /// fatal and mapped to an error; nothing is allocated in those cases.
    pub fn handle_fault<P, R>(
        &self,
        registry: &mut FrameRegistry,
        config: &PagingConfig,
        phys: &mut P,
        hw: &R,
        code: FaultCode,
    ) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let address = hw.fault_address();
        log::debug!("page fault at {address:?}: {code}");

        if code.is_protection_violation() {
            log::error!("protection violation at {address:?} ({code})");
            return Err(VmemError::ProtectionViolation { address, code });
        }

        // Legitimacy: some registered pool must claim the address.
        if !self.pools.iter().any(|pool| pool.covers(phys, hw, address)) {
            log::error!("access to {address:?}, which no pool claims");
            return Err(VmemError::IllegalAddress(address));
        }

        let dir = address.directory_index();
        let window = TranslationWindow::new();
        if !window.read_pde(phys, hw, dir)?.present() {
            let table = Self::kernel_frame(registry, config, phys)?;
            window.write_pde(phys, hw, dir, PageEntry::kernel_data(table))?;
            window.clear_table(phys, hw, dir)?;
            log::trace!("directory slot {dir} backed by {table:?}");
        }

        let frame = registry
            .pool_mut(config.process_pool)
            .get_frames(phys, 1)
            .ok_or(VmemError::OutOfFrames("process"))?;
        window.write_pte(phys, hw, dir, address.table_index(), PageEntry::kernel_data(frame))?;
        log::trace!("mapped {:?} to {frame:?}", address.page_base());
        Ok(())
    }

    /// Unmap the page containing `page` and return its frame to whichever
    /// pool owns it.
    ///
    /// Returns the released frame, or `None` when the page was not mapped.
    /// Rewrites the translation base afterwards so no stale translation
    /// survives.
    pub fn free_page<P, R>(
        &self,
        registry: &mut FrameRegistry,
        phys: &mut P,
        hw: &mut R,
        page: VirtualAddress,
    ) -> Result<Option<FrameNumber>, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let dir = page.directory_index();
        let window = TranslationWindow::new();
        if !window.read_pde(phys, hw, dir)?.present() {
            return Ok(None);
        }
        let table = page.table_index();
        let pte = window.read_pte(phys, hw, dir, table)?;
        if !pte.present() {
            return Ok(None);
        }

        let frame = pte.frame();
        registry.release_frames(phys, frame)?;
        window.write_pte(phys, hw, dir, table, PageEntry::new())?;
        hw.set_translation_base(hw.translation_base());
        log::trace!("unmapped {:?}, released {frame:?}", page.page_base());
        Ok(Some(frame))
    }

    /// Frame holding this space's page directory.
    #[must_use]
    pub const fn directory_frame(&self) -> FrameNumber {
        self.directory
    }

    /// Number of registered virtual-memory pools.
    #[must_use]
    pub const fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub(crate) fn register_pool(&mut self, pool: Rc<VmPoolShared>) -> Result<(), VmemError> {
        self.pools.push(pool)?;
        Ok(())
    }

    fn kernel_frame<P>(
        registry: &mut FrameRegistry,
        config: &PagingConfig,
        phys: &mut P,
    ) -> Result<FrameNumber, VmemError>
    where
        P: PhysMemory + ?Sized,
    {
        registry
            .pool_mut(config.kernel_pool)
            .get_frames(phys, 1)
            .ok_or(VmemError::OutOfFrames("kernel"))
    }
}

impl core::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("directory", &self.directory)
            .field("pools", &self.pools.len())
            .finish()
    }
}
