use memory::SharedMemory;

use crate::error::LoadError;
use crate::layout::*;
use crate::tag::SegmentTag;

/// One CRO image resident in guest memory, addressed by the page-aligned
/// pointer the load request supplied. All header and table mutation happens
/// in place; after `rebase` the image's offset fields hold absolute virtual
/// addresses.
///
/// Lifecycle: Unloaded -> Verified (`verify`) -> Rebased -> Relocated
/// (`rebase` runs both of the last two). No transition is reversible.
pub struct Cro {
    mem: SharedMemory,
    base: u32,
}

impl Cro {
    pub fn new(mem: SharedMemory, base: u32) -> Self {
        Self { mem, base }
    }

    fn header_u32(&self, field: u32) -> u32 {
        self.mem.load_u32(self.base + field)
    }

    fn set_header_u32(&self, field: u32, value: u32) {
        self.mem.store_u32(self.base + field, value);
    }

    /// Check the magic tag and the idempotent-load guard. The RO service
    /// sets the link fields once a module joins the loaded chain, so
    /// non-zero links mean this image is already resident.
    ///
    /// This is the one failure surrounding code may recover from; an
    /// untouched image verifies the same way every time.
    pub fn verify(&self) -> Result<(), LoadError> {
        let mut magic = [0u8; 4];
        self.mem.read_bytes(self.base + HEADER_ID, &mut magic);
        if &magic != CRO_MAGIC {
            return Err(LoadError::BadSignature);
        }

        if self.header_u32(HEADER_NEXT_CRO) != 0 || self.header_u32(HEADER_PREV_CRO) != 0 {
            return Err(LoadError::AlreadyLoaded);
        }

        Ok(())
    }

    pub fn load(&self) -> bool {
        self.verify().is_ok()
    }

    /// Rewrite every image-relative offset to an absolute virtual address
    /// and apply the internal relocation patches.
    ///
    /// The pass order is load-bearing: relocation reads the segment table in
    /// its final form, and the DATA segment's pre-rebase address (captured
    /// by the segment pass) feeds the DATA-target recomputation.
    pub fn rebase(&self, map_vaddr: u32, data_vaddr: u32, bss_vaddr: u32) -> bool {
        self.rebase_header(map_vaddr);

        let old_data_vaddr = self.rebase_segment_table(map_vaddr, data_vaddr, bss_vaddr);
        log::info!("old .data vaddr = 0x{:08x}", old_data_vaddr);

        self.rebase_named_export_table(map_vaddr);
        self.rebase_import_module_table(map_vaddr);
        self.rebase_named_import_table(map_vaddr);
        self.rebase_indexed_import_table(map_vaddr);
        self.rebase_anonymous_import_table(map_vaddr);

        self.relocate_internal(old_data_vaddr);

        true
    }

    fn rebase_header(&self, map_vaddr: u32) {
        log::debug!("rebasing CRO header");

        for field in HEADER_REBASE_OFFSETS {
            let old = self.header_u32(field);
            self.set_header_u32(field, old.wrapping_add(map_vaddr));
        }
    }

    /// Rebase segment offsets. TEXT/RODATA move with the image; DATA and BSS
    /// point at separately allocated backing memory, so their offsets are
    /// replaced with the caller-supplied addresses instead. Returns the DATA
    /// segment's pre-rebase absolute address (old offset + data vaddr),
    /// which internal relocation needs later.
    fn rebase_segment_table(&self, map_vaddr: u32, data_vaddr: u32, bss_vaddr: u32) -> u32 {
        log::debug!("rebasing segment table");

        let table_addr = self.header_u32(HEADER_SEGMENT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_SEGMENT_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!("unaligned segment table address 0x{:08x}", table_addr);
        }
        if table_size == 0 {
            panic!("segment table empty");
        }

        let mut old_data_vaddr = 0;
        for segment in 0..table_size {
            let entry = table_addr + SEGMENT_ENTRY_SIZE * segment;
            let offset = self.mem.load_u32(entry + SEGMENT_OFFSET);
            let id = self.mem.load_u32(entry + SEGMENT_ID);

            let rebased = match id {
                SEGMENT_ID_DATA => {
                    old_data_vaddr = offset.wrapping_add(data_vaddr);
                    data_vaddr
                }
                SEGMENT_ID_BSS => bss_vaddr,
                SEGMENT_ID_TEXT | SEGMENT_ID_RODATA => offset.wrapping_add(map_vaddr),
                _ => panic!("unknown segment ID {} (entry {})", id, segment),
            };
            self.mem.store_u32(entry + SEGMENT_OFFSET, rebased);

            log::trace!(
                "rebased segment table entry {} (ID = {}), addr = 0x{:08x}",
                segment,
                id,
                rebased
            );
        }

        old_data_vaddr
    }

    fn rebase_named_export_table(&self, map_vaddr: u32) {
        log::debug!("rebasing named export table");

        let table_addr = self.header_u32(HEADER_NAMED_EXPORT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_NAMED_EXPORT_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!("unaligned named export table address 0x{:08x}", table_addr);
        }

        for export in 0..table_size {
            let entry = table_addr + NAMED_EXPORT_ENTRY_SIZE * export;
            let name_offset = self.mem.load_u32(entry);
            if name_offset == 0 {
                panic!("named export {} has no name", export);
            }

            let rebased = name_offset.wrapping_add(map_vaddr);
            self.mem.store_u32(entry, rebased);

            log::trace!("rebased named export {}, addr = 0x{:08x}", export, rebased);
        }
    }

    fn rebase_import_module_table(&self, map_vaddr: u32) {
        log::debug!("rebasing import module table");

        let table_addr = self.header_u32(HEADER_IMPORT_MODULE_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_IMPORT_MODULE_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!("unaligned import module table address 0x{:08x}", table_addr);
        }

        for module in 0..table_size {
            let entry = table_addr + IMPORT_MODULE_TABLE_ENTRY_SIZE * module;
            let name = self.rebase_required_field(
                entry + IMPORT_MODULE_TABLE_NAME_OFFSET,
                map_vaddr,
                "import module name",
                module,
            );
            let indexed = self.rebase_required_field(
                entry + IMPORT_MODULE_TABLE_INDEXED_OFFSET,
                map_vaddr,
                "import module indexed subtable",
                module,
            );
            let anonymous = self.rebase_required_field(
                entry + IMPORT_MODULE_TABLE_ANONYMOUS_OFFSET,
                map_vaddr,
                "import module anonymous subtable",
                module,
            );

            log::trace!(
                "rebased import module {}, name addr = 0x{:08x}, indexed addr = 0x{:08x}, anonymous addr = 0x{:08x}",
                module,
                name,
                indexed,
                anonymous
            );
        }
    }

    fn rebase_named_import_table(&self, map_vaddr: u32) {
        log::debug!("rebasing named import table");

        let table_addr = self.header_u32(HEADER_NAMED_IMPORT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_NAMED_IMPORT_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!("unaligned named import table address 0x{:08x}", table_addr);
        }

        for import in 0..table_size {
            let entry = table_addr + NAMED_IMPORT_TABLE_ENTRY_SIZE * import;
            let name = self.rebase_required_field(
                entry + NAMED_IMPORT_NAME_OFFSET,
                map_vaddr,
                "named import name",
                import,
            );
            let relocation = self.rebase_required_field(
                entry + NAMED_IMPORT_RELOCATION_OFFSET,
                map_vaddr,
                "named import relocation list",
                import,
            );

            log::trace!(
                "rebased named import {}, name addr = 0x{:08x}, relocation addr = 0x{:08x}",
                import,
                name,
                relocation
            );
        }
    }

    fn rebase_indexed_import_table(&self, map_vaddr: u32) {
        log::debug!("rebasing indexed import table");

        let table_addr = self.header_u32(HEADER_INDEXED_IMPORT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_INDEXED_IMPORT_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!("unaligned indexed import table address 0x{:08x}", table_addr);
        }

        for import in 0..table_size {
            let entry = table_addr + INDEXED_IMPORT_TABLE_ENTRY_SIZE * import;
            let relocation = self.rebase_required_field(
                entry + INDEXED_IMPORT_RELOCATION_OFFSET,
                map_vaddr,
                "indexed import relocation list",
                import,
            );

            log::trace!(
                "rebased indexed import {}, relocation addr = 0x{:08x}",
                import,
                relocation
            );
        }
    }

    fn rebase_anonymous_import_table(&self, map_vaddr: u32) {
        log::debug!("rebasing anonymous import table");

        let table_addr = self.header_u32(HEADER_ANONYMOUS_IMPORT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_ANONYMOUS_IMPORT_TABLE_SIZE);

        if table_addr & 3 != 0 {
            panic!(
                "unaligned anonymous import table address 0x{:08x}",
                table_addr
            );
        }

        for import in 0..table_size {
            let entry = table_addr + ANONYMOUS_IMPORT_TABLE_ENTRY_SIZE * import;
            let relocation = self.rebase_required_field(
                entry + ANONYMOUS_IMPORT_RELOCATION_OFFSET,
                map_vaddr,
                "anonymous import relocation list",
                import,
            );

            log::trace!(
                "rebased anonymous import {}, relocation addr = 0x{:08x}",
                import,
                relocation
            );
        }
    }

    /// Add `map_vaddr` to the offset stored at `addr`, insisting it was
    /// non-zero to begin with. Exports and imports must reference real data.
    fn rebase_required_field(&self, addr: u32, map_vaddr: u32, what: &str, entry: u32) -> u32 {
        let offset = self.mem.load_u32(addr);
        if offset == 0 {
            panic!("{} is zero (entry {})", what, entry);
        }
        let rebased = offset.wrapping_add(map_vaddr);
        self.mem.store_u32(addr, rebased);
        rebased
    }

    /// Apply the module's internal relocation patches against the finalized
    /// segment table.
    fn relocate_internal(&self, old_data_vaddr: u32) {
        log::debug!("relocating internal symbols");

        let table_addr = self.header_u32(HEADER_RELOCATION_PATCHES_OFFSET);
        let table_size = self.header_u32(HEADER_RELOCATION_PATCHES_SIZE);

        let segment_table_addr = self.header_u32(HEADER_SEGMENT_TABLE_OFFSET);

        for relocation in 0..table_size {
            let entry = table_addr + RELOCATION_PATCH_ENTRY_SIZE * relocation;
            let tag = SegmentTag::from_raw(self.mem.load_u32(entry + RELOCATION_PATCH_TAG));
            let patch_type = self.mem.load_u8(entry + RELOCATION_PATCH_TYPE);
            let index = self.mem.load_u8(entry + RELOCATION_PATCH_INDEX);
            let addend = self.mem.load_u32(entry + RELOCATION_PATCH_ADDEND);

            log::trace!(
                "relocation {}, {:?}, patch type = {:#x}, symbol index = {:#x}, addend = {:#x}",
                relocation,
                tag,
                patch_type,
                index,
                addend
            );

            let segment_addr = self.segment_addr(tag);

            // DATA's backing memory is physically distinct from the image:
            // the segment-table-derived address points at the remapped
            // segment, not at where the patch has to land.
            let entry_id = self
                .mem
                .load_u32(segment_table_addr + SEGMENT_ENTRY_SIZE * tag.index() + SEGMENT_ID);
            let target = if entry_id == SEGMENT_ID_DATA {
                old_data_vaddr.wrapping_add(tag.offset())
            } else {
                segment_addr
            };

            if target == 0 {
                panic!("relocation {} target is NULL", relocation);
            }

            let symbol_offset = self
                .mem
                .load_u32(segment_table_addr + SEGMENT_ENTRY_SIZE * index as u32 + SEGMENT_OFFSET);

            self.patch_symbol(target, patch_type, addend, symbol_offset);
        }
    }

    fn patch_symbol(&self, target: u32, patch_type: u8, addend: u32, symbol_offset: u32) {
        match patch_type {
            PATCH_TYPE_ABSOLUTE_32 => {
                self.mem.store_u32(target, symbol_offset.wrapping_add(addend));
            }
            _ => panic!("unhandled relocation patch type {:#x}", patch_type),
        }
    }

    /// Resolve a segment tag to an absolute address via the segment table.
    /// Out-of-range indices and offsets are consistency violations.
    fn segment_addr(&self, tag: SegmentTag) -> u32 {
        let table_addr = self.header_u32(HEADER_SEGMENT_TABLE_OFFSET);
        let table_size = self.header_u32(HEADER_SEGMENT_TABLE_SIZE);

        if tag.index() >= table_size {
            panic!(
                "segment tag index {} out of range (table size = {})",
                tag.index(),
                table_size
            );
        }

        let entry = table_addr + SEGMENT_ENTRY_SIZE * tag.index();
        let entry_offset = self.mem.load_u32(entry + SEGMENT_OFFSET);
        let entry_size = self.mem.load_u32(entry + SEGMENT_SIZE);

        if tag.offset() >= entry_size {
            panic!(
                "segment tag offset 0x{:x} out of range (segment size = 0x{:x})",
                tag.offset(),
                entry_size
            );
        }

        entry_offset.wrapping_add(tag.offset())
    }
}
