//! Remote-call subsystem.
//!
//! # Data Flow
//! ```text
//! RpcClient::status / info / call / send_transaction
//!     → RemoteCall<T> (request + deadline settings)
//!     → send(): TimedCallback armed on the shared DeadlineTimer
//!     → RpcService::dispatch (transport, e.g. http.rs)
//!     → exactly one of: answer | transport failure | timeout
//!     → Response<T> decoded from the raw envelope
//! ```
//!
//! # Design Decisions
//! - Every call is bounded by a deadline; nothing waits forever
//! - The transport and the timer race to resolve the same callback, and
//!   a single atomic transition picks the winner
//! - No retries here; retry policy belongs to the caller

pub mod callback;
pub mod client;
pub mod http;
pub mod service;
pub mod timer;
pub mod types;

pub use callback::{Callback, CallbackState, TimedCallback, DEFAULT_CALLBACK_TIMEOUT};
pub use client::{RemoteCall, RpcClient};
pub use http::HttpService;
pub use service::{RpcMethod, RpcRequest, RpcService};
pub use timer::{DeadlineTimer, TimerEntry};
pub use types::{ErrorKind, Receipt, ResourceInfo, Response, SdkError, SdkResult, StatusCode};
