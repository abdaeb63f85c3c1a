use memory::SharedMemory;
use types::{PAGE_MASK, page_aligned};

use crate::cro::Cro;
use crate::error::LoadError;
use crate::layout::CRO_HEADER_SIZE;

/// Decoded module-load request, as handed over by the IPC layer.
///
/// `auto_link` and `fix_level` are carried through faithfully but unused by
/// the core: linking against other resident modules and header trimming
/// happen in the surrounding service.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest {
    pub cro_pointer: u32,
    pub map_vaddr: u32,
    pub size: u32,
    pub data_vaddr: u32,
    pub data_size: u32,
    pub bss_vaddr: u32,
    pub bss_size: u32,
    pub auto_link: bool,
    pub fix_level: u32,
}

/// Map a raw CRO image at its target address, verify it and run the full
/// rebase/relocation sequence. Returns the mapped size on success.
///
/// Malformed geometry (undersized image, unaligned pointer/size/vaddr) is
/// fatal; only a bad signature or an already-resident module comes back as
/// an error the caller can turn into a service result code.
pub fn load_module(mem: &SharedMemory, request: &LoadRequest) -> Result<u32, LoadError> {
    log::debug!(
        "load module (buffer = 0x{:08x}, vaddr = 0x{:08x}, size = 0x{:08x}, .data vaddr = 0x{:08x}, .data size = 0x{:08x}, .bss vaddr = 0x{:08x}, .bss size = 0x{:08x}, auto link = {}, fix level = {})",
        request.cro_pointer,
        request.map_vaddr,
        request.size,
        request.data_vaddr,
        request.data_size,
        request.bss_vaddr,
        request.bss_size,
        request.auto_link,
        request.fix_level
    );

    if request.size < CRO_HEADER_SIZE {
        panic!("CRO too small (size = 0x{:x})", request.size);
    }
    if request.size & PAGE_MASK != 0 {
        panic!("unaligned CRO size 0x{:x}", request.size);
    }
    if !page_aligned(request.cro_pointer) {
        panic!("unaligned CRO pointer 0x{:08x}", request.cro_pointer);
    }
    if !page_aligned(request.map_vaddr) {
        panic!("unaligned CRO output vaddr 0x{:08x}", request.map_vaddr);
    }

    // Make the in-place header/table mutations visible at the mapped address.
    mem.mirror_map(request.map_vaddr, request.cro_pointer, request.size as usize);

    let cro = Cro::new(mem.clone(), request.cro_pointer);
    cro.verify()?;
    cro.rebase(request.map_vaddr, request.data_vaddr, request.bss_vaddr);

    Ok(request.size)
}
