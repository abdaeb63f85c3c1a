/// Service-level result code handed back to the IPC layer.
///
/// Zero means success; non-zero values follow the guest ABI's packed
/// error-code format, which this core treats as opaque.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const FAILURE: ResultCode = ResultCode(0xFFFF_FFFF);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ResultCode {
    fn from(raw: u32) -> Self {
        ResultCode(raw)
    }
}
