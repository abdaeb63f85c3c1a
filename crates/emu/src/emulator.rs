use std::rc::Rc;

use kernel::Kernel;
use loader::{LoadError, LoadRequest, load_module};
use memory::{Memory, SharedMemory};

use crate::config::Config;

/// One emulation session: guest memory plus the kernel-object table, with
/// module loading wired through the mirror mapper. Everything runs on the
/// guest's synchronous dispatch path; there is no internal parallelism.
#[derive(Debug)]
pub struct Emulator {
    pub config: Config,
    pub memory: SharedMemory,
    pub kernel: Kernel,
}

impl Emulator {
    pub fn new(config: Config) -> Self {
        log::debug!("new session, guest memory = {} bytes", config.memory_size);
        Self {
            config,
            memory: Rc::new(Memory::new(config.memory_size)),
            kernel: Kernel::new(),
        }
    }

    /// Reset the session: wipes the object table and re-seeds the sentinel,
    /// the main process and the main thread. Guest memory contents are left
    /// alone; the surrounding frontend reloads the executable afterwards.
    pub fn reset(&mut self) {
        self.kernel.reset();
    }

    /// Map and link a relocatable module. Recoverable failures (bad
    /// signature, already resident) come back as an error for the service
    /// layer to encode; malformed geometry aborts the session.
    pub fn load_module(&self, request: &LoadRequest) -> Result<u32, LoadError> {
        load_module(&self.memory, request)
    }

    /// Hex dump of a physical range, 16 bytes per line.
    pub fn dump_memory(&self, start: usize, end: usize) -> String {
        assert!(start < end, "invalid memory range");
        let slice = self
            .memory
            .mem_slice(start, end)
            .expect("memory range out of bounds");

        let mut out = String::new();
        for (i, line) in slice.chunks(16).enumerate() {
            out.push_str(&format!(
                "{:08x}: {}\n",
                start + i * 16,
                hex::encode(line)
            ));
        }
        out
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
