use crate::page_entry::PageEntry;
use kernel_memory_addresses::{PhysMemory, PhysicalAddress, VirtualAddress};
use kernel_registers::PagingRegisters;

/// Where a software page walk stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Miss {
    /// The directory entry for the address is not present.
    Directory { index: usize },
    /// The directory entry is present but the table entry is not.
    Table { index: usize },
}

/// Walk the live translation structures for `va`, exactly as the MMU would.
///
/// Reads the page directory named by the translation-base register, follows
/// the directory entry to a page table and the table entry to a frame. A
/// not-present entry at either level is a [`Miss`], the software equivalent
/// of a page fault.
///
/// This is also how the recursive self-map works in practice: resolving a
/// translation-window address through this same walk lands on the physical
/// word of a directory or table entry.
pub fn resolve<P, R>(phys: &P, hw: &R, va: VirtualAddress) -> Result<PhysicalAddress, Miss>
where
    P: PhysMemory + ?Sized,
    R: PagingRegisters + ?Sized,
{
    let directory = hw.translation_base().directory_frame();
    let dir_index = va.directory_index();
    let pde = PageEntry::from_bits(phys.read_u32(directory.byte((dir_index * 4) as u32)));
    if !pde.present() {
        return Err(Miss::Directory { index: dir_index });
    }

    let table_index = va.table_index();
    let pte = PageEntry::from_bits(phys.read_u32(pde.frame().byte((table_index * 4) as u32)));
    if !pte.present() {
        return Err(Miss::Table { index: table_index });
    }

    Ok(pte.frame().byte(va.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_machine::Machine;
    use kernel_memory_addresses::FrameNumber;
    use kernel_registers::TranslationBase;

    /// Hand-build: directory in frame 1, one table in frame 2, page 0x300
    /// of directory slot 5 mapped to frame 7.
    fn tiny_mapping() -> Machine {
        let mut m = Machine::with_frames(16);
        let directory = FrameNumber::new(1);
        let table = FrameNumber::new(2);
        m.ram
            .write_u32(directory.byte(5 * 4), PageEntry::kernel_data(table).into_bits());
        m.ram
            .write_u32(table.byte(0x300 * 4), PageEntry::kernel_data(FrameNumber::new(7)).into_bits());
        m.regs
            .set_translation_base(TranslationBase::from_directory(directory));
        m
    }

    #[test]
    fn resolves_a_mapped_address() {
        let m = tiny_mapping();
        let va = VirtualAddress::new((5 << 22) | (0x300 << 12) | 0xABC);
        assert_eq!(
            resolve(&m.ram, &m.regs, va),
            Ok(PhysicalAddress::new(0x0000_7ABC))
        );
    }

    #[test]
    fn misses_name_the_level_that_stopped_the_walk() {
        let m = tiny_mapping();

        let no_table = VirtualAddress::new(6 << 22);
        assert_eq!(
            resolve(&m.ram, &m.regs, no_table),
            Err(Miss::Directory { index: 6 })
        );

        let no_page = VirtualAddress::new((5 << 22) | (0x301 << 12));
        assert_eq!(
            resolve(&m.ram, &m.regs, no_page),
            Err(Miss::Table { index: 0x301 })
        );
    }
}
