//! Relocatable-module (CRO) engine: verification, rebasing and internal
//! relocation of modules loaded into an emulated process's address space.

pub mod cro;
pub use cro::Cro;

pub mod error;
pub use error::LoadError;

pub mod layout;

pub mod service;
pub use service::{LoadRequest, load_module};

pub mod tag;
pub use tag::SegmentTag;
