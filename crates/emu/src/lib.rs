pub mod config;
pub use config::Config;

pub mod emulator;
pub use emulator::Emulator;
