pub mod kernel;
pub use kernel::{Kernel, MAIN_THREAD_PRIORITY};

pub mod object;
pub use object::{KernelObject, KernelObjectType, ObjectPayload};

pub mod process;
pub use process::{ProcessData, ResourceLimitData, LimitCategory, MAIN_PROCESS_ID};

pub mod thread;
pub use thread::{ThreadData, ThreadPool, ThreadStatus, MAX_THREADS};
