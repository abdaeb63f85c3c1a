use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use types::{page_aligned, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};

/// Guest physical memory with a page-granular mirror table on top.
///
/// Every virtual page resolves either through the mirror table or, by
/// default, identity-maps onto the backing buffer. `mirror_map` lets two
/// virtual ranges alias the same backing bytes, which is how a loaded
/// module's in-place mutations stay visible at its mapped address.
pub struct Memory {
    mem: Rc<RefCell<Vec<u8>>>,
    // vpn -> byte offset of the page's backing storage
    mirrors: RefCell<HashMap<u32, usize>>,
}

pub type SharedMemory = Rc<Memory>;

impl Memory {
    pub fn new(memory_size: usize) -> Self {
        Self {
            mem: Rc::new(RefCell::new(vec![0u8; memory_size])),
            mirrors: RefCell::new(HashMap::new()),
        }
    }

    pub fn size(&self) -> usize {
        self.mem.borrow().len()
    }

    /// Resolve a virtual address to an offset in the backing buffer.
    fn translate(&self, addr: u32) -> usize {
        let vpn = addr >> PAGE_SHIFT;
        match self.mirrors.borrow().get(&vpn) {
            Some(page_base) => page_base + (addr & PAGE_MASK) as usize,
            None => addr as usize,
        }
    }

    fn read_at(&self, addr: u32) -> u8 {
        let offset = self.translate(addr);
        let mem = self.mem.borrow();
        if offset >= mem.len() {
            panic!("load out of bounds: addr = 0x{:08x}", addr);
        }
        mem[offset]
    }

    fn write_at(&self, addr: u32, val: u8) {
        let offset = self.translate(addr);
        let mut mem = self.mem.borrow_mut();
        if offset >= mem.len() {
            panic!("store out of bounds: addr = 0x{:08x}", addr);
        }
        mem[offset] = val;
    }

    pub fn load_u8(&self, addr: u32) -> u8 {
        self.read_at(addr)
    }

    pub fn load_u16(&self, addr: u32) -> u16 {
        let mut bytes = [0u8; 2];
        self.read_bytes(addr, &mut bytes);
        u16::from_le_bytes(bytes)
    }

    pub fn load_u32(&self, addr: u32) -> u32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(addr, &mut bytes);
        u32::from_le_bytes(bytes)
    }

    pub fn load_u64(&self, addr: u32) -> u64 {
        let mut bytes = [0u8; 8];
        self.read_bytes(addr, &mut bytes);
        u64::from_le_bytes(bytes)
    }

    pub fn store_u8(&self, addr: u32, val: u8) {
        self.write_at(addr, val);
    }

    pub fn store_u16(&self, addr: u32, val: u16) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    pub fn store_u32(&self, addr: u32, val: u32) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    pub fn store_u64(&self, addr: u32, val: u64) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    /// Copy `buf.len()` bytes starting at `addr` into `buf`, honoring the
    /// mirror table across page boundaries.
    pub fn read_bytes(&self, addr: u32, buf: &mut [u8]) {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_at(addr.wrapping_add(i as u32));
        }
    }

    pub fn write_bytes(&self, addr: u32, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_at(addr.wrapping_add(i as u32), *byte);
        }
    }

    /// Establish a mirrored view: accesses through `[dst, dst + len)` observe
    /// the same backing bytes as `[src, src + len)`.
    ///
    /// The destination address and length must be page-aligned. The IPC layer
    /// validates this before calling in; it is re-checked here because an
    /// unaligned request means the load request itself is malformed.
    pub fn mirror_map(&self, dst: u32, src: u32, len: usize) {
        if !page_aligned(dst) {
            panic!("mirror map: unaligned destination 0x{:08x}", dst);
        }
        if len & PAGE_MASK as usize != 0 {
            panic!("mirror map: unaligned length 0x{:x}", len);
        }

        log::debug!(
            "mirror map 0x{:08x} -> 0x{:08x} (len = 0x{:x})",
            dst,
            src,
            len
        );

        let pages = len / PAGE_SIZE;
        for page in 0..pages {
            let page_bytes = (page * PAGE_SIZE) as u32;
            // Resolve the source through any existing mapping so chained
            // mirrors land on the real backing page.
            let backing = self.translate(src.wrapping_add(page_bytes)) & !(PAGE_MASK as usize);
            let vpn = dst.wrapping_add(page_bytes) >> PAGE_SHIFT;
            self.mirrors.borrow_mut().insert(vpn, backing);
        }
    }

    /// Borrow a contiguous backing-storage slice, bypassing translation.
    /// Used for bulk physical-range inspection (debug dumps).
    pub fn mem_slice(&self, start: usize, end: usize) -> Option<std::cell::Ref<'_, [u8]>> {
        let mem_ref = self.mem.borrow();
        if end > mem_ref.len() || start > end {
            return None;
        }
        Some(std::cell::Ref::map(mem_ref, move |v| &v[start..end]))
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.size())
            .field("mirrored_pages", &self.mirrors.borrow().len())
            .finish()
    }
}
