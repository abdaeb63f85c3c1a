/// Session configuration consumed when the emulator is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Guest physical memory size in bytes.
    pub memory_size: usize,
    /// Echo guest debug output to the host console.
    pub debug_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: 16 * 1024 * 1024,
            debug_console: true,
        }
    }
}
