use emu::{Config, Emulator};
use kernel::{KernelObjectType, ObjectPayload};
use loader::layout::*;
use loader::tag::SegmentTag;
use loader::{LoadError, LoadRequest};
use once_cell::sync::Lazy;
use types::CURRENT_PROCESS;

const CRO_POINTER: u32 = 0x0000_8000;
const IMAGE_SIZE: u32 = 0x2000;
const MAP_VADDR: u32 = 0x0010_0000;
const DATA_VADDR: u32 = 0x0020_0000;
const BSS_VADDR: u32 = 0x0030_0000;

const SEGMENT_TABLE: u32 = 0x140;
const RELOCATION_TABLE: u32 = 0x180;
const TEXT_OFFSET: u32 = 0x800;
const DATA_OFFSET: u32 = 0x1000;

fn put_u32(image: &mut [u8], offset: u32, value: u32) {
    let offset = offset as usize;
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Minimal linked-module image: TEXT + RODATA + DATA + BSS segments, no
/// exports or imports, one absolute32 patch into the DATA segment.
static TEST_IMAGE: Lazy<Vec<u8>> = Lazy::new(|| {
    let mut image = vec![0u8; IMAGE_SIZE as usize];
    image[HEADER_ID as usize..HEADER_ID as usize + 4].copy_from_slice(CRO_MAGIC);

    put_u32(&mut image, HEADER_SEGMENT_TABLE_OFFSET, SEGMENT_TABLE);
    put_u32(&mut image, HEADER_SEGMENT_TABLE_SIZE, 4);
    let segments = [
        (TEXT_OFFSET, 0x400, SEGMENT_ID_TEXT),
        (0xC00, 0x100, SEGMENT_ID_RODATA),
        (DATA_OFFSET, 0x100, SEGMENT_ID_DATA),
        (0, 0x100, SEGMENT_ID_BSS),
    ];
    for (i, (offset, size, id)) in segments.into_iter().enumerate() {
        let entry = SEGMENT_TABLE + SEGMENT_ENTRY_SIZE * i as u32;
        put_u32(&mut image, entry + SEGMENT_OFFSET, offset);
        put_u32(&mut image, entry + SEGMENT_SIZE, size);
        put_u32(&mut image, entry + SEGMENT_ID, id);
    }

    put_u32(&mut image, HEADER_RELOCATION_PATCHES_OFFSET, RELOCATION_TABLE);
    put_u32(&mut image, HEADER_RELOCATION_PATCHES_SIZE, 1);
    let tag = SegmentTag::new(2, 0x40);
    put_u32(&mut image, RELOCATION_TABLE + RELOCATION_PATCH_TAG, tag.raw());
    image[(RELOCATION_TABLE + RELOCATION_PATCH_TYPE) as usize] = PATCH_TYPE_ABSOLUTE_32;
    image[(RELOCATION_TABLE + RELOCATION_PATCH_INDEX) as usize] = 0;
    put_u32(&mut image, RELOCATION_TABLE + RELOCATION_PATCH_ADDEND, 8);

    image
});

fn default_request() -> LoadRequest {
    LoadRequest {
        cro_pointer: CRO_POINTER,
        map_vaddr: MAP_VADDR,
        size: IMAGE_SIZE,
        data_vaddr: DATA_VADDR,
        data_size: 0x100,
        bss_vaddr: BSS_VADDR,
        bss_size: 0x100,
        auto_link: false,
        fix_level: 0,
    }
}

fn session_with_image() -> Emulator {
    let _ = env_logger::builder().is_test(true).try_init();
    let emu = Emulator::new(Config::default());
    emu.memory.write_bytes(CRO_POINTER, &TEST_IMAGE);
    emu
}

#[test]
fn load_module_maps_rebases_and_relocates() {
    let emu = session_with_image();
    let size = emu.load_module(&default_request()).unwrap();
    assert_eq!(size, IMAGE_SIZE);

    // The mapped view aliases the rebased image.
    assert_eq!(
        emu.memory.load_u32(MAP_VADDR + HEADER_SEGMENT_TABLE_OFFSET),
        SEGMENT_TABLE + MAP_VADDR
    );

    // DATA segment rebased to the supplied backing address...
    let data_entry = CRO_POINTER + SEGMENT_TABLE + SEGMENT_ENTRY_SIZE * 2;
    assert_eq!(emu.memory.load_u32(data_entry + SEGMENT_OFFSET), DATA_VADDR);

    // ...while the patch targeted the pre-rebase DATA address.
    let old_data_vaddr = DATA_OFFSET + DATA_VADDR;
    assert_eq!(
        emu.memory.load_u32(old_data_vaddr + 0x40),
        TEXT_OFFSET + MAP_VADDR + 8
    );
}

#[test]
fn resident_module_is_rejected_on_reload() {
    let emu = session_with_image();
    emu.load_module(&default_request()).unwrap();

    // Link the module into the loaded chain the way the RO service would.
    emu.memory.store_u32(CRO_POINTER + HEADER_NEXT_CRO, MAP_VADDR);

    assert_eq!(
        emu.load_module(&default_request()),
        Err(LoadError::AlreadyLoaded)
    );
    assert_eq!(
        emu.load_module(&default_request()),
        Err(LoadError::AlreadyLoaded)
    );
}

#[test]
fn garbage_image_is_rejected_without_aborting() {
    let emu = session_with_image();
    emu.memory.store_u32(CRO_POINTER + HEADER_ID, 0x46464952);

    assert_eq!(
        emu.load_module(&default_request()),
        Err(LoadError::BadSignature)
    );
}

#[test]
fn reset_reseeds_the_object_table() {
    let mut emu = session_with_image();
    emu.load_module(&default_request()).unwrap();

    emu.kernel.make_object(KernelObjectType::Archive);
    emu.reset();

    let dummy = emu.kernel.get_object(0, KernelObjectType::Dummy).unwrap();
    assert!(matches!(dummy.payload, ObjectPayload::Dummy));
    assert!(emu.kernel.get_process(CURRENT_PROCESS).is_some());
    assert_eq!(
        emu.kernel
            .objects()
            .filter(|o| o.object_type == KernelObjectType::Archive)
            .count(),
        0
    );
}
