//! Structural layout of the CRO wire format.
//!
//! These offsets are compatibility-critical: every field is a little-endian
//! 32-bit quantity at the exact byte position the hardware platform's RO
//! service expects. Keep them here rather than scattered through the engine.

pub const CRO_HEADER_SIZE: u32 = 0x138;
pub const CRO_MAGIC: &[u8; 4] = b"CRO0";

// Header field offsets.
pub const HEADER_ID: u32 = 0x80;
pub const HEADER_NAME_OFFSET: u32 = 0x84;
pub const HEADER_NEXT_CRO: u32 = 0x88;
pub const HEADER_PREV_CRO: u32 = 0x8C;
pub const HEADER_CODE_OFFSET: u32 = 0xB0;
pub const HEADER_DATA_OFFSET: u32 = 0xB8;
pub const HEADER_MODULE_NAME_OFFSET: u32 = 0xC0;
pub const HEADER_SEGMENT_TABLE_OFFSET: u32 = 0xC8;
pub const HEADER_SEGMENT_TABLE_SIZE: u32 = 0xCC;
pub const HEADER_NAMED_EXPORT_TABLE_OFFSET: u32 = 0xD0;
pub const HEADER_NAMED_EXPORT_TABLE_SIZE: u32 = 0xD4;
pub const HEADER_INDEXED_EXPORT_TABLE_OFFSET: u32 = 0xD8;
pub const HEADER_EXPORT_STRINGS_OFFSET: u32 = 0xE0;
pub const HEADER_EXPORT_TREE_OFFSET: u32 = 0xE8;
pub const HEADER_IMPORT_MODULE_TABLE_OFFSET: u32 = 0xF0;
pub const HEADER_IMPORT_MODULE_TABLE_SIZE: u32 = 0xF4;
pub const HEADER_IMPORT_PATCHES_OFFSET: u32 = 0xF8;
pub const HEADER_NAMED_IMPORT_TABLE_OFFSET: u32 = 0x100;
pub const HEADER_NAMED_IMPORT_TABLE_SIZE: u32 = 0x104;
pub const HEADER_INDEXED_IMPORT_TABLE_OFFSET: u32 = 0x108;
pub const HEADER_INDEXED_IMPORT_TABLE_SIZE: u32 = 0x10C;
pub const HEADER_ANONYMOUS_IMPORT_TABLE_OFFSET: u32 = 0x110;
pub const HEADER_ANONYMOUS_IMPORT_TABLE_SIZE: u32 = 0x114;
pub const HEADER_IMPORT_STRINGS_OFFSET: u32 = 0x118;
pub const HEADER_STATIC_ANONYMOUS_SYMBOLS_OFFSET: u32 = 0x120;
pub const HEADER_RELOCATION_PATCHES_OFFSET: u32 = 0x128;
pub const HEADER_RELOCATION_PATCHES_SIZE: u32 = 0x12C;
pub const HEADER_STATIC_ANONYMOUS_PATCHES_OFFSET: u32 = 0x130;

/// Header fields that encode image-relative offsets and get rebased to
/// absolute virtual addresses. Size fields are deliberately absent. The two
/// static-anonymous entries have an unconfirmed role in relocation; they are
/// rebased like the rest and otherwise left alone.
pub const HEADER_REBASE_OFFSETS: [u32; 18] = [
    HEADER_NAME_OFFSET,
    HEADER_CODE_OFFSET,
    HEADER_DATA_OFFSET,
    HEADER_MODULE_NAME_OFFSET,
    HEADER_SEGMENT_TABLE_OFFSET,
    HEADER_NAMED_EXPORT_TABLE_OFFSET,
    HEADER_INDEXED_EXPORT_TABLE_OFFSET,
    HEADER_EXPORT_STRINGS_OFFSET,
    HEADER_EXPORT_TREE_OFFSET,
    HEADER_IMPORT_MODULE_TABLE_OFFSET,
    HEADER_IMPORT_PATCHES_OFFSET,
    HEADER_NAMED_IMPORT_TABLE_OFFSET,
    HEADER_INDEXED_IMPORT_TABLE_OFFSET,
    HEADER_ANONYMOUS_IMPORT_TABLE_OFFSET,
    HEADER_IMPORT_STRINGS_OFFSET,
    HEADER_STATIC_ANONYMOUS_SYMBOLS_OFFSET,
    HEADER_RELOCATION_PATCHES_OFFSET,
    HEADER_STATIC_ANONYMOUS_PATCHES_OFFSET,
];

// Segment table entries: (offset, size, id) triples.
pub const SEGMENT_OFFSET: u32 = 0;
pub const SEGMENT_SIZE: u32 = 4;
pub const SEGMENT_ID: u32 = 8;
pub const SEGMENT_ENTRY_SIZE: u32 = 12;

pub const SEGMENT_ID_TEXT: u32 = 0;
pub const SEGMENT_ID_RODATA: u32 = 1;
pub const SEGMENT_ID_DATA: u32 = 2;
pub const SEGMENT_ID_BSS: u32 = 3;

// Named export table: name-string offset per entry.
pub const NAMED_EXPORT_ENTRY_SIZE: u32 = 8;

// Import module table: module name plus two subtable offsets.
pub const IMPORT_MODULE_TABLE_NAME_OFFSET: u32 = 0;
pub const IMPORT_MODULE_TABLE_INDEXED_OFFSET: u32 = 8;
pub const IMPORT_MODULE_TABLE_ANONYMOUS_OFFSET: u32 = 16;
pub const IMPORT_MODULE_TABLE_ENTRY_SIZE: u32 = 20;

// Named import table: name + relocation-list offsets.
pub const NAMED_IMPORT_NAME_OFFSET: u32 = 0;
pub const NAMED_IMPORT_RELOCATION_OFFSET: u32 = 4;
pub const NAMED_IMPORT_TABLE_ENTRY_SIZE: u32 = 8;

// Indexed import table: relocation-list offset only.
pub const INDEXED_IMPORT_RELOCATION_OFFSET: u32 = 4;
pub const INDEXED_IMPORT_TABLE_ENTRY_SIZE: u32 = 8;

// Anonymous import table: same shape as the indexed table.
pub const ANONYMOUS_IMPORT_RELOCATION_OFFSET: u32 = 4;
pub const ANONYMOUS_IMPORT_TABLE_ENTRY_SIZE: u32 = 8;

// Relocation patch records: segment tag, patch type, symbol segment index,
// two padding bytes, addend.
pub const RELOCATION_PATCH_TAG: u32 = 0;
pub const RELOCATION_PATCH_TYPE: u32 = 4;
pub const RELOCATION_PATCH_INDEX: u32 = 5;
pub const RELOCATION_PATCH_ADDEND: u32 = 8;
pub const RELOCATION_PATCH_ENTRY_SIZE: u32 = 12;

/// The only patch type this engine implements: write the resolved symbol
/// address plus addend as a 32-bit word at the target.
pub const PATCH_TYPE_ABSOLUTE_32: u8 = 2;
