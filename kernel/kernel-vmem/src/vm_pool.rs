use crate::access::VmAccess;
use crate::address_space::{AddressSpace, PagingConfig};
use crate::error::VmemError;
use crate::translate;
use alloc::rc::Rc;
use core::cell::Cell;
use kernel_frames::FrameRegistry;
use kernel_memory_addresses::{PAGE_SIZE, PhysMemory, VirtualAddress};
use kernel_registers::PagingRegisters;

/// Entries in each of a pool's two region arrays.
pub const MAX_REGIONS: usize = 256;

/// Byte offset of the free-region array inside the bookkeeping page. The
/// allocated-region array sits at offset 0; each entry is two `u32`s
/// (base, size), so 256 entries fill exactly half the page.
const FREE_LIST_OFFSET: u32 = (MAX_REGIONS * 8) as u32;

/// The part of a pool the address space's fault handler consults.
///
/// Shared between the [`VmPool`] handle and the owning [`AddressSpace`]
/// via `Rc`; `ready` is a [`Cell`] because the fault path holds the pool
/// through a shared reference.
pub(crate) struct VmPoolShared {
    base: VirtualAddress,
    size: u32,
    ready: Cell<bool>,
}

impl VmPoolShared {
    /// Whether an access to `va` is legitimate as far as this pool is
    /// concerned.
    ///
    /// Legitimate means inside a currently allocated region, which requires
    /// reading the region array — itself virtual memory. Before the pool
    /// has seeded its bookkeeping (`ready` is false) there are no regions
    /// to read, and exactly the bookkeeping page is claimed instead: the
    /// fault raised by the pool's own first write lands here.
    pub(crate) fn covers<P, R>(&self, phys: &P, hw: &R, va: VirtualAddress) -> bool
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let offset = va.as_u32().wrapping_sub(self.base.as_u32());
        if va.as_u32() < self.base.as_u32() || offset >= self.size {
            return false;
        }
        if !self.ready.get() {
            return va.page_base() == self.base.page_base();
        }
        for i in 0..MAX_REGIONS as u32 {
            let entry = self.base + i * 8;
            // The bookkeeping page is mapped whenever `ready` is set; a
            // miss here means the pool was corrupted, not a fault to serve.
            let Ok(base_pa) = translate::resolve(phys, hw, entry) else {
                return false;
            };
            let Ok(size_pa) = translate::resolve(phys, hw, entry + 4) else {
                return false;
            };
            let region_base = phys.read_u32(base_pa);
            let region_size = phys.read_u32(size_pa);
            if region_size != 0
                && va.as_u32() >= region_base
                && va.as_u32() - region_base < region_size
            {
                return true;
            }
        }
        false
    }

    pub(crate) const fn base(&self) -> VirtualAddress {
        self.base
    }
}

/// A contiguous virtual region that hands out page-granular sub-regions,
/// physically backed on demand.
///
/// A pool owns `size` bytes of virtual address space starting at `base`.
/// Its bookkeeping — the allocated-region and free-region arrays — lives in
/// the region's first page, in the pool's own virtual memory, so creating a
/// pool already exercises the demand-paging path it will later rely on.
///
/// Allocation is first-fit over the free array and never coalesces on
/// release; fragmentation is accepted, exhaustion of the fixed arrays is an
/// error.
pub struct VmPool {
    shared: Rc<VmPoolShared>,
}

impl VmPool {
    /// Create a pool over `size` bytes at `base` and register it with the
    /// address space behind `vm`.
    ///
    /// `base` must be page-aligned and `size` a non-zero multiple of the
    /// page size, with room for the bookkeeping page plus at least one
    /// allocatable page. Registration happens *before* the bookkeeping
    /// writes: the first write faults, and the fault is only legitimate
    /// once the address space can ask this pool about it.
    pub fn new<P, R>(
        space: &mut AddressSpace,
        registry: &mut FrameRegistry,
        config: &PagingConfig,
        phys: &mut P,
        hw: &mut R,
        base: VirtualAddress,
        size: u32,
    ) -> Result<Self, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        if base.offset() != 0 || size < 2 * PAGE_SIZE || !size.is_multiple_of(PAGE_SIZE) {
            log::error!("unusable virtual region at {base:?} ({size} bytes)");
            return Err(VmemError::InvalidRegion { base, size });
        }

        let shared = Rc::new(VmPoolShared {
            base,
            size,
            ready: Cell::new(false),
        });
        space.register_pool(Rc::clone(&shared))?;

        let mut vm = VmAccess {
            space: &*space,
            registry,
            config,
            phys,
            hw,
        };
        // The backing frame may be recycled; both arrays must start empty.
        for offset in (0..PAGE_SIZE).step_by(4) {
            vm.write_u32(base + offset, 0)?;
        }
        // Seed: the bookkeeping page itself is the first allocated region,
        // everything after it is the one free region.
        vm.write_u32(base, base.as_u32())?;
        vm.write_u32(base + 4, PAGE_SIZE)?;
        vm.write_u32(base + FREE_LIST_OFFSET, (base + PAGE_SIZE).as_u32())?;
        vm.write_u32(base + FREE_LIST_OFFSET + 4, size - PAGE_SIZE)?;
        shared.ready.set(true);

        log::debug!("virtual pool at {base:?}, {size} bytes");
        Ok(Self { shared })
    }

    /// Allocate `size` bytes (rounded up to whole pages).
    ///
    /// Returns the region's base address, or `None` when no free region is
    /// large enough (or `size` is zero). No physical frames move here; the
    /// region's pages materialize on first touch.
    pub fn allocate<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        size: u32,
    ) -> Result<Option<VirtualAddress>, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        if size == 0 {
            log::warn!("zero-byte allocation from pool at {:?}", self.shared.base);
            return Ok(None);
        }
        let Some(bytes) = size.div_ceil(PAGE_SIZE).checked_mul(PAGE_SIZE) else {
            log::warn!("allocation of {size} bytes cannot be rounded to pages");
            return Ok(None);
        };

        let Some(source) = self.find_free_region(vm, bytes)? else {
            log::warn!(
                "no free region of {bytes} bytes in pool at {:?}",
                self.shared.base
            );
            return Ok(None);
        };
        let slot = self.find_empty_slot(vm, 0)?.ok_or_else(|| {
            log::error!("allocated-region array full in pool at {:?}", self.shared.base);
            VmemError::RegionListFull { list: "allocated" }
        })?;

        let (region_base, region_size) = self.read_region(vm, FREE_LIST_OFFSET, source)?;
        self.write_region(vm, 0, slot, region_base, bytes)?;
        self.write_region(
            vm,
            FREE_LIST_OFFSET,
            source,
            region_base + bytes,
            region_size - bytes,
        )?;

        let address = VirtualAddress::new(region_base);
        log::trace!("allocated {bytes} bytes at {address:?}");
        Ok(Some(address))
    }

    /// Release the allocated region starting at `address`.
    ///
    /// The region moves to the free array as-is (no coalescing with its
    /// neighbours) and every page it spans is unmapped, its frame returned
    /// to the owning frame pool. Releasing an address that is not the base
    /// of an allocated region — including a second release of the same
    /// region — is a contract violation.
    pub fn release<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        address: VirtualAddress,
    ) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let Some(index) = self.find_allocated_region(vm, address)? else {
            log::error!("no allocated region starts at {address:?}");
            return Err(VmemError::UnknownRegion(address));
        };
        let (_, bytes) = self.read_region(vm, 0, index)?;

        let slot = self.find_empty_slot(vm, FREE_LIST_OFFSET)?.ok_or_else(|| {
            log::error!("free-region array full in pool at {:?}", self.shared.base);
            VmemError::RegionListFull { list: "free" }
        })?;
        self.write_region(vm, FREE_LIST_OFFSET, slot, address.as_u32(), bytes)?;
        self.write_region(vm, 0, index, 0, 0)?;

        for page in 0..bytes / PAGE_SIZE {
            vm.space
                .free_page(vm.registry, vm.phys, vm.hw, address + page * PAGE_SIZE)?;
        }
        log::trace!("released {bytes} bytes at {address:?}");
        Ok(())
    }

    /// Whether `va` falls inside a currently allocated region.
    #[must_use]
    pub fn is_legitimate<P, R>(&self, phys: &P, hw: &R, va: VirtualAddress) -> bool
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        self.shared.covers(phys, hw, va)
    }

    /// First address of the pool's region.
    #[must_use]
    pub fn base_address(&self) -> VirtualAddress {
        self.shared.base()
    }

    /// Size of the pool's region in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.shared.size
    }

    fn entry_address(&self, list_offset: u32, index: usize) -> VirtualAddress {
        self.shared.base + list_offset + (index as u32) * 8
    }

    fn read_region<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        list_offset: u32,
        index: usize,
    ) -> Result<(u32, u32), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let entry = self.entry_address(list_offset, index);
        Ok((vm.read_u32(entry)?, vm.read_u32(entry + 4)?))
    }

    fn write_region<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        list_offset: u32,
        index: usize,
        base: u32,
        size: u32,
    ) -> Result<(), VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        let entry = self.entry_address(list_offset, index);
        vm.write_u32(entry, base)?;
        vm.write_u32(entry + 4, size)
    }

    /// First free-array entry that can satisfy `bytes`.
    fn find_free_region<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        bytes: u32,
    ) -> Result<Option<usize>, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        for i in 0..MAX_REGIONS {
            let (_, size) = self.read_region(vm, FREE_LIST_OFFSET, i)?;
            if size >= bytes {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// First empty entry (size zero) in the array at `list_offset`.
    fn find_empty_slot<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        list_offset: u32,
    ) -> Result<Option<usize>, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        for i in 0..MAX_REGIONS {
            let (_, size) = self.read_region(vm, list_offset, i)?;
            if size == 0 {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Allocated-array index of the region starting exactly at `address`.
    fn find_allocated_region<P, R>(
        &self,
        vm: &mut VmAccess<'_, P, R>,
        address: VirtualAddress,
    ) -> Result<Option<usize>, VmemError>
    where
        P: PhysMemory + ?Sized,
        R: PagingRegisters + ?Sized,
    {
        for i in 0..MAX_REGIONS {
            let (base, size) = self.read_region(vm, 0, i)?;
            if size != 0 && base == address.as_u32() {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

impl core::fmt::Debug for VmPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "VmPool({:?}, {} bytes)",
            self.shared.base, self.shared.size
        )
    }
}
