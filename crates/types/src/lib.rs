#![no_std]

pub mod handle;
pub use handle::{CURRENT_PROCESS, Handle};

pub mod page;
pub use page::{PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, page_aligned};

pub mod result;
pub use result::ResultCode;
