use crate::address_space::{AddressSpace, PagingConfig};
use crate::error::VmemError;
use crate::translate;
use kernel_frames::FrameRegistry;
use kernel_memory_addresses::{PhysMemory, PhysicalAddress, VirtualAddress};
use kernel_registers::{FaultCode, PagingRegisters};

/// Everything a faulting virtual-memory access needs, in one place.
///
/// Touching unmapped virtual memory is a three-party affair: the walk (RAM
/// plus registers), the fault handler (the address space) and the frame
/// supply (registry plus config). `VmAccess` bundles the borrows so callers
/// and the pool code can say `vm.read_u32(va)` and get the demand-paging
/// behavior a real load instruction would: fault, map, retry.
pub struct VmAccess<'a, P, R>
where
    P: PhysMemory + ?Sized,
    R: PagingRegisters + ?Sized,
{
    pub space: &'a AddressSpace,
    pub registry: &'a mut FrameRegistry,
    pub config: &'a PagingConfig,
    pub phys: &'a mut P,
    pub hw: &'a mut R,
}

impl<P, R> VmAccess<'_, P, R>
where
    P: PhysMemory + ?Sized,
    R: PagingRegisters + ?Sized,
{
    /// Read an aligned `u32` at a virtual address, faulting it in if needed.
    pub fn read_u32(&mut self, va: VirtualAddress) -> Result<u32, VmemError> {
        let pa = self.ensure_mapped(va, false)?;
        Ok(self.phys.read_u32(pa))
    }

    /// Write an aligned `u32` at a virtual address, faulting it in if needed.
    pub fn write_u32(&mut self, va: VirtualAddress, value: u32) -> Result<(), VmemError> {
        let pa = self.ensure_mapped(va, true)?;
        self.phys.write_u32(pa, value);
        Ok(())
    }

    /// Resolve `va`, raising and serving at most one page fault.
    ///
    /// A second miss after successful handling means the handler and the
    /// walk disagree; bailing out with [`VmemError::FaultLoop`] beats
    /// faulting forever.
    fn ensure_mapped(
        &mut self,
        va: VirtualAddress,
        write: bool,
    ) -> Result<PhysicalAddress, VmemError> {
        if let Ok(pa) = translate::resolve(self.phys, self.hw, va) {
            return Ok(pa);
        }
        self.hw.set_fault_address(va);
        self.space.handle_fault(
            self.registry,
            self.config,
            self.phys,
            self.hw,
            FaultCode::not_present(write),
        )?;
        translate::resolve(self.phys, self.hw, va).map_err(|_| VmemError::FaultLoop(va))
    }
}
