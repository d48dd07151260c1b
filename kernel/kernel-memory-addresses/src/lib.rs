//! # Memory Address Types
//!
//! Strongly typed wrappers for the raw addresses used by the paging and
//! frame-management code, plus the [`PhysMemory`] seam through which physical
//! frames are read and written.
//!
//! ## Overview
//!
//! This kernel uses a 32-bit, two-level paging design: a 1024-entry page
//! directory whose entries point at 1024-entry page tables, each mapping
//! 4 KiB pages. A logical address therefore decomposes as
//!
//! ```text
//! | 31‒22           | 21‒12        | 11‒0   |
//! | directory index | table index  | offset |
//! ```
//!
//! The types here prevent mixing the three integer spaces that paging code
//! juggles constantly:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A machine/bus address. |
//! | [`VirtualAddress`]  | A logical address, translated through a page table. |
//! | [`FrameNumber`]     | A physical frame index (`PhysicalAddress >> 12`). |
//!
//! All three are `#[repr(transparent)]` wrappers over `u32` and every
//! conversion is a `const fn`, so the abstraction costs nothing in release
//! builds.
//!
//! ## Physical memory access
//!
//! Paging metadata (frame-pool bitmaps, directories, page tables) lives in
//! physical frames, not in Rust objects. The [`PhysMemory`] trait is the
//! single place where a physical address turns into bytes: boot code on real
//! hardware implements it over an identity map, the test machine implements
//! it over plain `Vec` storage. Accessors are bounds-checked against the
//! 4 KiB frame — there is no integer-to-pointer casting anywhere above this
//! trait.

#![cfg_attr(not(any(test, doctest)), no_std)]

use core::fmt;
use core::ops::Add;

/// Size of one page / frame in bytes.
pub const PAGE_SIZE: u32 = 4096;

/// `log2(PAGE_SIZE)`: number of low bits used for the in-page offset.
pub const PAGE_SHIFT: u32 = 12;

/// Entries per page directory and per page table.
pub const TABLE_ENTRIES: usize = 1024;

/// Low bit of the directory-index field of a virtual address.
pub const DIRECTORY_SHIFT: u32 = 22;

/// [`PAGE_SIZE`] as a `usize`, for slice lengths.
pub const FRAME_BYTES: usize = PAGE_SIZE as usize;

/// A **physical** memory address (machine bus address).
///
/// Newtype over `u32` to prevent mixing with virtual addresses. No alignment
/// guarantees by itself; use [`PhysicalAddress::frame`] /
/// [`FrameNumber::base`] to move between addresses and frame indices.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u32);

/// A **logical** (virtual) memory address.
///
/// Newtype over `u32`. Meaningful only relative to some loaded page table;
/// the index accessors expose the two translation fields.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u32);

/// Index of a physical frame: [`PhysicalAddress`] with the offset bits
/// stripped and shifted out.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameNumber(u32);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The frame this address falls into.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> FrameNumber {
        FrameNumber(self.0 >> PAGE_SHIFT)
    }

    /// Byte offset within the containing frame (`0..PAGE_SIZE`).
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0 & (PAGE_SIZE - 1)
    }
}

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Directory-index field (bits 31‒22), in `0..1024`.
    #[inline]
    #[must_use]
    pub const fn directory_index(self) -> usize {
        (self.0 >> DIRECTORY_SHIFT) as usize
    }

    /// Table-index field (bits 21‒12), in `0..1024`.
    #[inline]
    #[must_use]
    pub const fn table_index(self) -> usize {
        ((self.0 >> PAGE_SHIFT) & 0x3FF) as usize
    }

    /// Byte offset within the page (bits 11‒0).
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0 & (PAGE_SIZE - 1)
    }

    /// This address with the offset bits cleared (base of its page).
    #[inline]
    #[must_use]
    pub const fn page_base(self) -> Self {
        Self(self.0 & !(PAGE_SIZE - 1))
    }
}

impl FrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Physical address of the first byte of this frame.
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress(self.0 << PAGE_SHIFT)
    }

    /// Physical address `offset` bytes into this frame.
    ///
    /// `offset` must be below [`PAGE_SIZE`] (debug-asserted).
    #[inline]
    #[must_use]
    pub const fn byte(self, offset: u32) -> PhysicalAddress {
        debug_assert!(offset < PAGE_SIZE);
        PhysicalAddress((self.0 << PAGE_SHIFT) | offset)
    }
}

impl Add<u32> for PhysicalAddress {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.checked_add(rhs).expect("PhysicalAddress add"))
    }
}

impl Add<u32> for VirtualAddress {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.checked_add(rhs).expect("VirtualAddress add"))
    }
}

impl Add<u32> for FrameNumber {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.checked_add(rhs).expect("FrameNumber add"))
    }
}

impl From<u32> for PhysicalAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

impl From<u32> for VirtualAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

impl From<u32> for FrameNumber {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:08x})", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:08x})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {} (PA 0x{:08x})", self.0, self.0 << PAGE_SHIFT)
    }
}

/// Access to physical memory, one 4 KiB frame at a time.
///
/// Implementors decide how a frame index turns into storage: boot code uses
/// the identity map that exists before paging, a kernel with a direct map
/// adds its fixed offset, and the test machine indexes a `Vec` of frames.
///
/// The provided byte/word accessors are bounds-checked against the frame and
/// keep every caller free of pointer casts.
///
/// ### Contract
/// Accessing a frame the implementor does not own is a bus error; the
/// implementation is free to treat it as fatal (the simulator panics).
pub trait PhysMemory {
    /// Borrow a frame's 4 KiB of storage.
    fn frame(&self, frame: FrameNumber) -> &[u8; FRAME_BYTES];

    /// Borrow a frame's 4 KiB of storage mutably.
    fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8; FRAME_BYTES];

    /// Read one byte at a physical address.
    #[inline]
    fn read_u8(&self, pa: PhysicalAddress) -> u8 {
        self.frame(pa.frame())[pa.offset() as usize]
    }

    /// Write one byte at a physical address.
    #[inline]
    fn write_u8(&mut self, pa: PhysicalAddress, value: u8) {
        self.frame_mut(pa.frame())[pa.offset() as usize] = value;
    }

    /// Read a naturally aligned little-endian `u32` at a physical address.
    ///
    /// The address must be 4-byte aligned (debug-asserted); an entry read
    /// never straddles a frame boundary.
    #[inline]
    fn read_u32(&self, pa: PhysicalAddress) -> u32 {
        debug_assert!(pa.as_u32().is_multiple_of(4));
        let off = pa.offset() as usize;
        let bytes = self.frame(pa.frame());
        u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
    }

    /// Write a naturally aligned little-endian `u32` at a physical address.
    #[inline]
    fn write_u32(&mut self, pa: PhysicalAddress, value: u32) {
        debug_assert!(pa.as_u32().is_multiple_of(4));
        let off = pa.offset() as usize;
        let bytes = self.frame_mut(pa.frame());
        bytes[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }
}
