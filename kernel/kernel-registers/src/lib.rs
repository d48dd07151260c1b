//! # Typed Paging Registers
//!
//! Models the machine state the paging subsystem consumes from its hardware
//! collaborator: the translation-base register (physical address of the
//! active page directory), the control register carrying the paging-enable
//! bit, and the fault record delivered on a page-fault trap (faulting
//! address plus a 3-bit cause).
//!
//! The register *values* are typed bitfields; the register *file* is reached
//! through [`PagingRegisters`], implemented by whatever embeds this kernel
//! core — privileged register moves on real hardware, plain fields on the
//! simulated machine. Paging code never talks to registers any other way.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod control;
mod fault;
mod translation_base;

pub use control::Control;
pub use fault::FaultCode;
pub use translation_base::TranslationBase;

use kernel_memory_addresses::VirtualAddress;

/// The paging-relevant register file of the machine.
///
/// One implementor per hardware environment. Loading a page table, enabling
/// paging, flushing the translation cache and reading the fault address all
/// go through this trait.
pub trait PagingRegisters {
    /// Current translation-base register (page-directory location).
    fn translation_base(&self) -> TranslationBase;

    /// Load the translation-base register.
    ///
    /// Rewriting the register — even with its current value — discards all
    /// cached translations.
    fn set_translation_base(&mut self, base: TranslationBase);

    /// Current control register.
    fn control(&self) -> Control;

    /// Store the control register.
    fn set_control(&mut self, control: Control);

    /// Address whose access caused the most recent page fault.
    fn fault_address(&self) -> VirtualAddress;

    /// Record a faulting address. Written by the trap-delivery path before
    /// the fault handler runs.
    fn set_fault_address(&mut self, va: VirtualAddress);
}
