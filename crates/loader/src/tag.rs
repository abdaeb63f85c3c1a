/// Packed (segment index, byte offset) reference used by relocation and
/// export records: low 4 bits select the segment-table entry, the remaining
/// bits are the byte offset within that segment.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SegmentTag(u32);

impl SegmentTag {
    pub fn new(index: u32, offset: u32) -> Self {
        SegmentTag((offset << 4) | (index & 0xF))
    }

    pub fn from_raw(raw: u32) -> Self {
        SegmentTag(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn index(self) -> u32 {
        self.0 & 0xF
    }

    pub fn offset(self) -> u32 {
        self.0 >> 4
    }
}

impl core::fmt::Debug for SegmentTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "SegmentTag(index = {}, offset = 0x{:x})",
            self.index(),
            self.offset()
        )
    }
}
