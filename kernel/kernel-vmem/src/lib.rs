//! # Demand-Paged Virtual Memory
//!
//! The paging core of the kernel: 32-bit two-level translation with a
//! recursive self-map, demand paging driven by the page-fault handler, and
//! region-based virtual-memory pools on top.
//!
//! ## Structure
//!
//! | Piece | Role |
//! |-------|------|
//! | [`PageEntry`] | One 32-bit directory/table entry. |
//! | [`resolve`] | Software page walk, the MMU's view of the structures. |
//! | [`TranslationWindow`] | Typed access to paging entries through the recursive slot. |
//! | [`AddressSpace`] | A page directory: construction, loading, fault handling. |
//! | [`VmPool`] | A virtual region handing out sub-regions, backed on demand. |
//! | [`VmAccess`] | Bundled collaborators for faulting virtual-memory access. |
//!
//! ## Lifecycle
//!
//! An [`AddressSpace`] is built with the low *shared* region identity-mapped
//! and directory slot [`RECURSIVE_SLOT`] pointing back at the directory.
//! After [`AddressSpace::load`] and [`AddressSpace::enable_paging`], nothing
//! else is mapped: the first touch of any other page faults, and
//! [`AddressSpace::handle_fault`] decides whether the address is legitimate
//! (some registered pool claims it), then materializes the missing page
//! table and data frame from the configured frame pools.
//!
//! Physical memory and registers are only ever reached through the
//! `PhysMemory` and `PagingRegisters` traits, so the whole subsystem runs
//! unmodified against the simulated machine in tests.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod access;
mod address_space;
mod error;
mod page_entry;
mod translate;
mod vm_pool;
mod window;

pub use access::VmAccess;
pub use address_space::{AddressSpace, MAX_VM_POOLS, PagingConfig};
pub use error::VmemError;
pub use page_entry::PageEntry;
pub use translate::{Miss, resolve};
pub use vm_pool::{MAX_REGIONS, VmPool};
pub use window::{RECURSIVE_SLOT, TranslationWindow};
