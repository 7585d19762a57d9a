//! Response envelopes, payload records and error definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status codes shared by response envelopes and receipts.
pub struct StatusCode;

impl StatusCode {
    pub const SUCCESS: i32 = 0;
    pub const INTERNAL_ERROR: i32 = 100;
}

/// Category of an [`SdkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A local precondition is violated (unset client, bad path or account).
    Configuration,
    /// The request could not be delivered or its answer could not be read.
    RemoteCall,
    /// No answer arrived before the deadline.
    Timeout,
    /// The server answered, but the envelope reports failure or is incomplete.
    Rpc,
    /// The remote execution itself reported failure.
    CallContract,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::RemoteCall => "remote call error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Rpc => "rpc error",
            ErrorKind::CallContract => "call contract error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error carrying a kind tag and an optional message.
///
/// The message is optional because a failed envelope may itself carry none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {}", .message.as_deref().unwrap_or("<no message>"))]
pub struct SdkError {
    kind: ErrorKind,
    message: Option<String>,
}

impl SdkError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn remote_call(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteCall, message)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "Timeout")
    }

    /// Envelope failure; `message` is whatever the server sent, if anything.
    pub fn rpc(message: Option<String>) -> Self {
        Self {
            kind: ErrorKind::Rpc,
            message,
        }
    }

    pub fn call_contract(message: Option<String>) -> Self {
        Self {
            kind: ErrorKind::CallContract,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// True when the deadline fired before any answer arrived.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Generic response envelope returned by every remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    #[serde(default)]
    pub version: Option<String>,
    pub error_code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        self.error_code == StatusCode::SUCCESS
    }
}

/// Outcome of a contract call or transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub error_code: i32,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub result: Vec<String>,
}

/// Descriptive record of a remote resource. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub stub_type: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub checksum: Option<String>,
}
