use thiserror::Error;
use types::ResultCode;

/// Recoverable load failures. Everything else the loader can hit (alignment,
/// zero required fields, unknown segment ids, unsupported patch types) is a
/// malformed or hostile image and aborts the session instead of surfacing
/// here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// The image does not start with the CRO magic tag.
    #[error("module signature mismatch")]
    BadSignature,

    /// The module's link fields are non-zero: it is already resident in a
    /// loaded-module chain.
    #[error("module already loaded")]
    AlreadyLoaded,
}

impl LoadError {
    /// Service-level code the IPC layer writes back into the guest's
    /// message buffer.
    pub fn result_code(self) -> ResultCode {
        ResultCode::FAILURE
    }
}
