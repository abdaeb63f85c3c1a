use types::{CURRENT_PROCESS, Handle};

use crate::object::{KernelObject, KernelObjectType, ObjectPayload};
use crate::process::{MAIN_PROCESS_ID, ProcessData, ResourceLimitData};
use crate::thread::{ThreadData, ThreadPool};

/// Priority assigned to the main thread seeded on reset.
pub const MAIN_THREAD_PRIORITY: u32 = 0x30;

/// Process-wide object registry. Handles are monotonic indices into the
/// slot table; handle 0 is always the Dummy sentinel after a reset.
///
/// Single-threaded by design: the registry is only ever touched from the
/// guest's synchronous dispatch path.
#[derive(Debug)]
pub struct Kernel {
    objects: Vec<KernelObject>,
    handle_counter: Handle,
    next_pid: u32,
    current_process: Handle,
    main_thread: Handle,
    threads: ThreadPool,
}

impl Kernel {
    pub fn new() -> Self {
        let mut kernel = Self {
            objects: Vec::new(),
            handle_counter: 0,
            next_pid: MAIN_PROCESS_ID,
            current_process: 0,
            main_thread: 0,
            threads: ThreadPool::new(),
        };
        kernel.reset();
        kernel
    }

    /// Allocate the next handle and append a slot tagged `object_type` with
    /// an empty payload. The caller fills the payload.
    pub fn make_object(&mut self, object_type: KernelObjectType) -> Handle {
        let handle = self.handle_counter;
        self.handle_counter += 1;
        self.objects.push(KernelObject::new(object_type));
        handle
    }

    /// Look up `handle`, returning None when it was never produced by
    /// `make_object` or its tag does not match `object_type`.
    pub fn get_object(&self, handle: Handle, object_type: KernelObjectType) -> Option<&KernelObject> {
        let object = self.objects.get(handle as usize)?;
        if object.object_type == object_type {
            Some(object)
        } else {
            None
        }
    }

    pub fn get_object_mut(
        &mut self,
        handle: Handle,
        object_type: KernelObjectType,
    ) -> Option<&mut KernelObject> {
        let object = self.objects.get_mut(handle as usize)?;
        if object.object_type == object_type {
            Some(object)
        } else {
            None
        }
    }

    /// Create a process and its resource-limit object, linking the two.
    /// The limit slot stores a back-reference to the process slot instead of
    /// a second owner of the embedded values.
    pub fn make_process(&mut self) -> Handle {
        let process_handle = self.make_object(KernelObjectType::Process);
        let limit_handle = self.make_object(KernelObjectType::ResourceLimit);

        let pid = self.next_pid;
        self.next_pid += 1;

        let mut data = ProcessData::new(pid);
        data.limits.handle = limit_handle;

        let process_index = process_handle as usize;
        self.objects[process_index].payload = ObjectPayload::Process(data);
        self.objects[limit_handle as usize].payload = ObjectPayload::ResourceLimit {
            owner: process_index,
        };

        log::debug!(
            "made process {} (handle = {}, resource limit handle = {})",
            pid,
            process_handle,
            limit_handle
        );
        process_handle
    }

    /// Create a thread backed by the fixed pool. Pool exhaustion means the
    /// guest blew past its thread limit; there is no recovery path.
    pub fn make_thread(&mut self, entrypoint: u32, stack_top: u32, priority: u32) -> Handle {
        let slot = match self.threads.claim(ThreadData::new(entrypoint, stack_top, priority)) {
            Ok(slot) => slot,
            Err(_) => panic!("thread pool exhausted"),
        };
        let handle = self.make_object(KernelObjectType::Thread);
        self.objects[handle as usize].payload = ObjectPayload::Thread { slot };
        handle
    }

    /// Resolve `handle` to a process, treating the reserved pseudo-handle as
    /// the current process. None when the handle is not a process.
    pub fn get_process(&self, handle: Handle) -> Option<&KernelObject> {
        if handle == CURRENT_PROCESS {
            self.get_object(self.current_process, KernelObjectType::Process)
        } else {
            self.get_object(handle, KernelObjectType::Process)
        }
    }

    /// Follow a ResourceLimit handle's back-reference to the limit values
    /// embedded in its parent process.
    pub fn resource_limit(&self, handle: Handle) -> Option<&ResourceLimitData> {
        let object = self.get_object(handle, KernelObjectType::ResourceLimit)?;
        let ObjectPayload::ResourceLimit { owner } = &object.payload else {
            return None;
        };
        match &self.objects.get(*owner)?.payload {
            ObjectPayload::Process(data) => Some(&data.limits),
            _ => None,
        }
    }

    pub fn process_name(&self, handle: Handle) -> &'static str {
        if handle == CURRENT_PROCESS {
            "current"
        } else {
            panic!("attempted to name non-current process (handle = {})", handle);
        }
    }

    pub fn current_process(&self) -> Handle {
        self.current_process
    }

    pub fn main_thread(&self) -> Handle {
        self.main_thread
    }

    pub fn thread(&self, handle: Handle) -> Option<&ThreadData> {
        let object = self.get_object(handle, KernelObjectType::Thread)?;
        let ObjectPayload::Thread { slot } = &object.payload else {
            return None;
        };
        self.threads.get(*slot)
    }

    pub fn objects(&self) -> impl Iterator<Item = &KernelObject> {
        self.objects.iter()
    }

    /// Wipe the session: every live payload is dropped, the handle counter
    /// restarts, and the table is re-seeded with the Dummy sentinel, the
    /// main process and the main thread. The clear must happen before the
    /// re-seed because `make_process` allocates handles itself.
    pub fn reset(&mut self) {
        log::debug!("kernel reset");

        self.handle_counter = 0;
        self.next_pid = MAIN_PROCESS_ID;
        self.objects.clear();
        self.threads.clear();

        let dummy = self.make_object(KernelObjectType::Dummy);
        self.objects[dummy as usize].payload = ObjectPayload::Dummy;
        debug_assert_eq!(dummy, 0);

        self.current_process = self.make_process();
        self.main_thread = self.make_thread(0, 0, MAIN_THREAD_PRIORITY);
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
