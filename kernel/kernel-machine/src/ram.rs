use kernel_info::memory::MACHINE_FRAMES;
use kernel_memory_addresses::{FRAME_BYTES, FrameNumber, PhysMemory};

/// Simulated physical RAM: a contiguous bank of 4 KiB frames starting at
/// physical address zero.
///
/// Frames come up zeroed, like RAM cleared by the boot loader. Accessing a
/// frame beyond the bank is the simulator's bus error and panics; the code
/// under test is expected to stay inside the pools it was configured with.
pub struct PhysRam {
    frames: Vec<Box<[u8; FRAME_BYTES]>>,
}

impl PhysRam {
    /// RAM bank of `frames` zeroed frames.
    #[must_use]
    pub fn with_frames(frames: u32) -> Self {
        let mut bank = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            bank.push(Box::new([0u8; FRAME_BYTES]));
        }
        Self { frames: bank }
    }

    /// Number of frames in the bank.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }
}

impl Default for PhysRam {
    /// The standard test machine size from `kernel-info` (32 MiB).
    fn default() -> Self {
        Self::with_frames(MACHINE_FRAMES)
    }
}

impl PhysMemory for PhysRam {
    fn frame(&self, frame: FrameNumber) -> &[u8; FRAME_BYTES] {
        match self.frames.get(frame.as_u32() as usize) {
            Some(bytes) => bytes,
            None => panic!("bus error: read of {frame:?} beyond simulated RAM"),
        }
    }

    fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8; FRAME_BYTES] {
        match self.frames.get_mut(frame.as_u32() as usize) {
            Some(bytes) => bytes,
            None => panic!("bus error: write of {frame:?} beyond simulated RAM"),
        }
    }
}

impl core::fmt::Debug for PhysRam {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PhysRam({} frames)", self.frames.len())
    }
}
