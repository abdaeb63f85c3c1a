//! Fixed-size thread pool. Thread storage is owned here, never by the
//! object registry; registry slots only carry pool indices.

pub const MAX_THREADS: usize = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThreadStatus {
    #[default]
    Ready,
    Running,
    Dormant,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadData {
    pub entrypoint: u32,
    pub stack_top: u32,
    pub priority: u32,
    pub status: ThreadStatus,
}

impl ThreadData {
    pub fn new(entrypoint: u32, stack_top: u32, priority: u32) -> Self {
        Self {
            entrypoint,
            stack_top,
            priority,
            status: ThreadStatus::Ready,
        }
    }
}

#[derive(Debug)]
pub struct ThreadPool {
    len: usize,
    slots: [ThreadData; MAX_THREADS],
}

impl ThreadPool {
    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [ThreadData {
                entrypoint: 0,
                stack_top: 0,
                priority: 0,
                status: ThreadStatus::Ready,
            }; MAX_THREADS],
        }
    }

    /// Claim the next free slot, returning its index, or the rejected thread
    /// when the pool is full.
    pub fn claim(&mut self, thread: ThreadData) -> Result<usize, ThreadData> {
        if self.len >= MAX_THREADS {
            return Err(thread);
        }
        let idx = self.len;
        self.slots[idx] = thread;
        self.len += 1;
        Ok(idx)
    }

    pub fn get(&self, idx: usize) -> Option<&ThreadData> {
        if idx < self.len {
            Some(&self.slots[idx])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut ThreadData> {
        if idx < self.len {
            Some(&mut self.slots[idx])
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}
