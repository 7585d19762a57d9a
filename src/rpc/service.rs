//! Transport seam.
//!
//! A transport receives a request together with the callback that must be
//! resolved once the answer (or a delivery failure) is known. It returns
//! immediately; completion may happen on any thread or task.

use crate::rpc::callback::TimedCallback;

/// Remote operation requested for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    Status,
    Info,
    Call,
    SendTransaction,
}

impl RpcMethod {
    /// Name used on the wire by the bundled HTTP transport.
    pub fn verb(&self) -> &'static str {
        match self {
            RpcMethod::Status => "status",
            RpcMethod::Info => "detail",
            RpcMethod::Call => "call",
            RpcMethod::SendTransaction => "sendTransaction",
        }
    }

    /// Whether the operation targets a contract method with an account.
    pub fn is_invocation(&self) -> bool {
        matches!(self, RpcMethod::Call | RpcMethod::SendTransaction)
    }
}

/// One request addressed to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub kind: RpcMethod,
    pub path: String,
    pub account: Option<String>,
    pub method: Option<String>,
    pub args: Vec<String>,
}

impl RpcRequest {
    /// A query that only names the resource (status, info).
    pub fn query(kind: RpcMethod, path: &str) -> Self {
        Self {
            kind,
            path: path.to_string(),
            account: None,
            method: None,
            args: Vec::new(),
        }
    }

    /// A contract invocation (call, sendTransaction).
    pub fn invocation(kind: RpcMethod, path: &str, account: &str, method: &str, args: &[&str]) -> Self {
        Self {
            kind,
            path: path.to_string(),
            account: Some(account.to_string()),
            method: Some(method.to_string()),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Delivers requests and resolves their callbacks.
///
/// The answer is the raw response envelope; JSON `null` stands for "no
/// response object".
pub trait RpcService: Send + Sync {
    fn dispatch(&self, request: RpcRequest, callback: TimedCallback<serde_json::Value>);
}
