//! # Simulated Machine
//!
//! A software stand-in for the hardware the memory core drives: a bank of
//! physical RAM frames and the paging-related register file. The frame and
//! paging crates only ever talk to hardware through the [`PhysMemory`] and
//! [`PagingRegisters`] traits, so swapping in this simulator lets every
//! allocator and page-table path run as an ordinary host-side test, with
//! real translation structures built in plain `Vec` storage.
//!
//! This crate is test infrastructure and deliberately `std`; it never ships
//! in a kernel image.

mod logger;
mod ram;
mod registers;

pub use logger::init_test_logging;
pub use ram::PhysRam;
pub use registers::RegisterFile;

/// A complete simulated machine: RAM plus registers.
///
/// The two halves are public fields so callers can borrow them disjointly,
/// which the fault-handling paths need (`&mut machine.ram` alongside
/// `&mut machine.regs`).
#[derive(Debug, Default)]
pub struct Machine {
    pub ram: PhysRam,
    pub regs: RegisterFile,
}

impl Machine {
    /// Machine with the default RAM size from `kernel-info`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Machine with `frames` frames of RAM.
    #[must_use]
    pub fn with_frames(frames: u32) -> Self {
        Self {
            ram: PhysRam::with_frames(frames),
            regs: RegisterFile::default(),
        }
    }
}
