use types::Handle;

/// Process id handed to the process seeded on reset.
pub const MAIN_PROCESS_ID: u32 = 1;

/// Resource-limit categories in guest ABI order. The index doubles as the
/// position in the limit-value array returned to the service layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitCategory {
    Commit = 0,
    Thread = 1,
    Event = 2,
    Mutex = 3,
    Semaphore = 4,
    Timer = 5,
    SharedMemory = 6,
    AddressArbiter = 7,
    CpuTime = 8,
}

pub const LIMIT_CATEGORY_COUNT: usize = 9;

/// Limit values embedded in the owning process. Reachable through its own
/// handle as well, via the back-reference stored in the registry slot.
#[derive(Debug)]
pub struct ResourceLimitData {
    /// Handle of the registry slot that aliases these values.
    pub handle: Handle,
    pub values: [u32; LIMIT_CATEGORY_COUNT],
}

impl ResourceLimitData {
    fn new() -> Self {
        let mut values = [0u32; LIMIT_CATEGORY_COUNT];
        // Application-core defaults for the main process.
        values[LimitCategory::Commit as usize] = 0x0400_0000;
        values[LimitCategory::Thread as usize] = 0x20;
        values[LimitCategory::Event as usize] = 0x20;
        values[LimitCategory::Mutex as usize] = 0x20;
        values[LimitCategory::Semaphore as usize] = 0x08;
        values[LimitCategory::Timer as usize] = 0x08;
        values[LimitCategory::SharedMemory as usize] = 0x10;
        values[LimitCategory::AddressArbiter as usize] = 0x02;
        values[LimitCategory::CpuTime as usize] = 0x00;
        Self { handle: 0, values }
    }

    pub fn value(&self, category: LimitCategory) -> u32 {
        self.values[category as usize]
    }
}

#[derive(Debug)]
pub struct ProcessData {
    pub id: u32,
    pub limits: ResourceLimitData,
}

impl ProcessData {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            limits: ResourceLimitData::new(),
        }
    }
}
