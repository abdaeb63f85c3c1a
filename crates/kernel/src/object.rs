use crate::process::ProcessData;

/// Type tag carried by every registry slot. A handle is only ever valid for
/// the exact type it was created with; there is no "any type" lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelObjectType {
    AddressArbiter,
    Archive,
    Directory,
    Dummy,
    Event,
    File,
    MemoryBlock,
    Mutex,
    Port,
    Process,
    ResourceLimit,
    Semaphore,
    Session,
    Thread,
}

/// Slot payload. A closed sum type instead of a type-erased pointer: the
/// registry owns every live payload and dropping the table releases each one
/// exactly once, with no per-type destructor dispatch to fall out of sync.
#[derive(Debug)]
pub enum ObjectPayload {
    /// Freshly allocated slot, not yet filled by the owning subsystem.
    Empty,
    /// Sentinel payload for handle 0.
    Dummy,
    Process(ProcessData),
    /// The resource-limit values live inline in the parent process payload;
    /// this slot only records which table index to follow. No second owner,
    /// so no double free and no dangling alias once the parent goes away.
    ResourceLimit { owner: usize },
    /// Thread storage lives in the kernel's fixed-size pool, never on the
    /// heap; the slot records the pool index.
    Thread { slot: usize },
}

#[derive(Debug)]
pub struct KernelObject {
    pub object_type: KernelObjectType,
    pub payload: ObjectPayload,
}

impl KernelObject {
    pub fn new(object_type: KernelObjectType) -> Self {
        Self {
            object_type,
            payload: ObjectPayload::Empty,
        }
    }
}
