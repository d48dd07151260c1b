use bitfield_struct::bitfield;

/// Machine control register (CR0-style).
///
/// Only the bits the memory core cares about are modeled; everything else is
/// kept reserved-as-zero.
#[bitfield(u32)]
pub struct Control {
    /// Bit 0 — Protection enable. Set during early boot; paging requires it.
    pub protected_mode: bool,

    /// Bits 1–30 — Reserved (must be 0).
    #[bits(30)]
    reserved: u32,

    /// Bit 31 — Paging enable. While clear, addresses are physical; once
    /// set, every access is translated through the loaded page directory.
    pub paging_enabled: bool,
}
