//! Cross-chain resource SDK.
//!
//! Remote calls are dispatched through a pluggable transport and bounded by
//! a deadline: every call ends in exactly one of success, failure or
//! timeout. [`Resource`] sits on top and turns answers into typed values or
//! an [`SdkError`].

pub mod config;
pub mod observability;
pub mod resource;
pub mod rpc;

pub use config::SdkConfig;
pub use resource::Resource;
pub use rpc::{ErrorKind, HttpService, RpcClient, SdkError, SdkResult, TimedCallback};
