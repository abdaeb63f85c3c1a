/// Opaque small-integer reference to a kernel object, scoped to one
/// emulation session. Handles double as indices into the object table.
pub type Handle = u32;

/// Reserved pseudo-handle that always resolves to the current process.
pub const CURRENT_PROCESS: Handle = 0xFFFF_8001;
