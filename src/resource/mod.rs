//! Resource access subsystem.
//!
//! # Data Flow
//! ```text
//! Resource::check()            (local: client set, path valid, account set)
//! Resource::status / info / call / send_transaction
//!     → RpcClient issues RemoteCall
//!     → proxy.rs maps the outcome to a value or an SdkError
//! ```

pub mod path;
pub mod proxy;

pub use path::{DefaultPathValidator, PathValidator};
pub use proxy::{Resource, ACTIVE_STATUS};
