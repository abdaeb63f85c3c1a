//! Guest page geometry shared by the memory mapper and the module loader.

pub const PAGE_SIZE: usize = 0x1000;
pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_MASK: u32 = 0xFFF;

/// True when `addr` sits on a page boundary.
pub fn page_aligned(addr: u32) -> bool {
    addr & PAGE_MASK == 0
}
