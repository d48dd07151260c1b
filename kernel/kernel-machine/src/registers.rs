use kernel_memory_addresses::VirtualAddress;
use kernel_registers::{Control, PagingRegisters, TranslationBase};

/// The simulated paging-related register file.
///
/// Plain storage; there is no simulated TLB, so rewriting the translation
/// base has no side effect beyond the new value taking hold (every walk in
/// the simulator reads the live structures anyway).
#[derive(Debug, Default, Copy, Clone)]
pub struct RegisterFile {
    translation_base: TranslationBase,
    control: Control,
    fault_address: VirtualAddress,
}

impl PagingRegisters for RegisterFile {
    fn translation_base(&self) -> TranslationBase {
        self.translation_base
    }

    fn set_translation_base(&mut self, base: TranslationBase) {
        self.translation_base = base;
    }

    fn control(&self) -> Control {
        self.control
    }

    fn set_control(&mut self, control: Control) {
        self.control = control;
    }

    fn fault_address(&self) -> VirtualAddress {
        self.fault_address
    }

    fn set_fault_address(&mut self, va: VirtualAddress) {
        self.fault_address = va;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::FrameNumber;

    #[test]
    fn registers_hold_what_was_written() {
        let mut regs = RegisterFile::default();
        assert!(!regs.control().paging_enabled());

        regs.set_translation_base(TranslationBase::from_directory(FrameNumber::new(42)));
        regs.set_control(regs.control().with_paging_enabled(true));
        regs.set_fault_address(VirtualAddress::new(0x1234_5678));

        assert_eq!(regs.translation_base().directory_frame(), FrameNumber::new(42));
        assert!(regs.control().paging_enabled());
        assert_eq!(regs.fault_address(), VirtualAddress::new(0x1234_5678));
    }
}
