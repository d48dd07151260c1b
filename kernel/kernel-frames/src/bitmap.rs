use kernel_memory_addresses::{FrameNumber, PAGE_SIZE, PhysMemory, PhysicalAddress};

/// Allocation state of a single frame, packed into two bits.
///
/// Low bit = free, high bit = sequence head. `0b11` is never written by
/// this module; see [`FrameState::from_bits`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum FrameState {
    /// Allocated, continuing a sequence started by an earlier head frame.
    Continuation = 0b00,
    /// Available for allocation.
    Free = 0b01,
    /// Allocated, first frame of a contiguous sequence.
    Head = 0b10,
}

impl FrameState {
    /// Decode a two-bit pattern.
    ///
    /// `0b11` has no meaning and cannot be produced by [`StateBitmap::set`];
    /// if it is ever observed the backing frame was corrupted by something
    /// outside this module, and we conservatively treat the frame as
    /// allocated (`Continuation`) so it is never handed out again.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => Self::Free,
            0b10 => Self::Head,
            _ => Self::Continuation,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Packed two-bit-per-frame state array, stored in physical frames.
///
/// The bitmap itself holds no storage; it is a typed view over the
/// *info frames* starting at `first_frame`, accessed through [`PhysMemory`].
/// Indices are pool-relative: index 0 is the first managed frame, and the
/// caller guarantees every index is below the capacity of the info frames
/// it reserved (4 frame states per byte, 16384 per info frame).
#[derive(Copy, Clone, Debug)]
pub struct StateBitmap {
    first_frame: FrameNumber,
}

impl StateBitmap {
    #[must_use]
    pub const fn new(first_frame: FrameNumber) -> Self {
        Self { first_frame }
    }

    /// First info frame backing this bitmap.
    #[must_use]
    pub const fn first_frame(&self) -> FrameNumber {
        self.first_frame
    }

    /// State of the frame at pool-relative `index`.
    pub fn get<P: PhysMemory + ?Sized>(&self, phys: &P, index: u32) -> FrameState {
        let byte = phys.read_u8(self.byte_address(index));
        FrameState::from_bits(byte >> Self::shift(index))
    }

    /// Set the state of the frame at pool-relative `index`.
    pub fn set<P: PhysMemory + ?Sized>(&self, phys: &mut P, index: u32, state: FrameState) {
        let pa = self.byte_address(index);
        let shift = Self::shift(index);
        let byte = phys.read_u8(pa) & !(0b11 << shift);
        phys.write_u8(pa, byte | (state.bits() << shift));
    }

    fn byte_address(&self, index: u32) -> PhysicalAddress {
        let byte_index = index / 4;
        let frame = self.first_frame + byte_index / PAGE_SIZE;
        frame.byte(byte_index % PAGE_SIZE)
    }

    const fn shift(index: u32) -> u8 {
        ((index % 4) * 2) as u8
    }
}
