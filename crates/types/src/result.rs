//! Result codes reported by the HMI and by resumption as a whole.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code of an HMI response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    Warnings,
    UnsupportedRequest,
    UnsupportedResource,
    Disallowed,
    Rejected,
    Aborted,
    Ignored,
    InvalidData,
    InvalidId,
    DuplicateName,
    OutOfMemory,
    TooManyPendingRequests,
    DataNotAvailable,
    TimedOut,
    GenericError,
}

impl ResultCode {
    /// Whether this code counts as a successful response.
    ///
    /// Only `SUCCESS` and `WARNINGS` are successful. `UNSUPPORTED_RESOURCE`
    /// is a failure everywhere in this workspace.
    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Success | ResultCode::Warnings)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::Warnings => "WARNINGS",
            ResultCode::UnsupportedRequest => "UNSUPPORTED_REQUEST",
            ResultCode::UnsupportedResource => "UNSUPPORTED_RESOURCE",
            ResultCode::Disallowed => "DISALLOWED",
            ResultCode::Rejected => "REJECTED",
            ResultCode::Aborted => "ABORTED",
            ResultCode::Ignored => "IGNORED",
            ResultCode::InvalidData => "INVALID_DATA",
            ResultCode::InvalidId => "INVALID_ID",
            ResultCode::DuplicateName => "DUPLICATE_NAME",
            ResultCode::OutOfMemory => "OUT_OF_MEMORY",
            ResultCode::TooManyPendingRequests => "TOO_MANY_PENDING_REQUESTS",
            ResultCode::DataNotAvailable => "DATA_NOT_AVAILABLE",
            ResultCode::TimedOut => "TIMED_OUT",
            ResultCode::GenericError => "GENERIC_ERROR",
        };
        f.write_str(name)
    }
}

/// Per-item result code inside a vehicle data (un)subscription response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleDataResultCode {
    Success,
    TruncatedData,
    Disallowed,
    UserDisallowed,
    InvalidId,
    DataNotAvailable,
    DataAlreadySubscribed,
    DataNotSubscribed,
    Ignored,
}

impl VehicleDataResultCode {
    /// Only an explicit `SUCCESS` restores a vehicle data item.
    pub fn is_success(self) -> bool {
        self == VehicleDataResultCode::Success
    }
}

/// Outcome of one application's resumption, reported to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResumptionResult {
    /// Every directive succeeded.
    Success,
    /// At least one directive failed; provisionally restored state was reverted.
    ResumeFailed,
}

impl ResumptionResult {
    /// Whether resumption succeeded.
    pub fn is_success(self) -> bool {
        self == ResumptionResult::Success
    }
}

impl fmt::Display for ResumptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumptionResult::Success => f.write_str("SUCCESS"),
            ResumptionResult::ResumeFailed => f.write_str("RESUME_FAILED"),
        }
    }
}
