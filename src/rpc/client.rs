//! Remote-call issuer.
//!
//! # Responsibilities
//! - Build requests for the four resource operations
//! - Bound every request with a deadline on the shared timer
//! - Decode the raw envelope into a typed [`Response`]

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::resource::Resource;
use crate::rpc::callback::{TimedCallback, DEFAULT_CALLBACK_TIMEOUT};
use crate::rpc::service::{RpcMethod, RpcRequest, RpcService};
use crate::rpc::timer::DeadlineTimer;
use crate::rpc::types::{Receipt, ResourceInfo, Response, SdkError, SdkResult};

/// An issued-but-not-yet-sent request whose answer decodes to `Response<T>`.
#[must_use = "a RemoteCall does nothing until `send` is awaited"]
pub struct RemoteCall<T> {
    service: Arc<dyn RpcService>,
    timer: Arc<DeadlineTimer>,
    timeout: Duration,
    request: RpcRequest,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RemoteCall<T> {
    pub fn request(&self) -> &RpcRequest {
        &self.request
    }

    /// Dispatch the request and wait for its single outcome.
    ///
    /// `Ok(None)` means the server answered with no response object at all.
    /// Delivery failures, timeouts and undecodable envelopes are errors.
    pub async fn send(self) -> SdkResult<Option<Response<T>>> {
        let (callback, outcome) = TimedCallback::channel(&self.timer, self.timeout);

        tracing::debug!(
            op = self.request.kind.verb(),
            path = %self.request.path,
            "Dispatching remote call"
        );
        self.service.dispatch(self.request, callback);

        let raw = outcome
            .await
            .map_err(|_| SdkError::remote_call("Callback dropped before resolution"))??;

        if raw.is_null() {
            return Ok(None);
        }
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| SdkError::remote_call(format!("Malformed response: {}", e)))
    }
}

/// Client for one remote endpoint, shared by every [`Resource`] built from it.
#[derive(Clone)]
pub struct RpcClient {
    service: Arc<dyn RpcService>,
    timer: Arc<DeadlineTimer>,
    timeout: Duration,
}

impl RpcClient {
    /// Create a client on the process-wide timer with the default deadline.
    pub fn new(service: Arc<dyn RpcService>) -> Self {
        Self {
            service,
            timer: DeadlineTimer::shared(),
            timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }

    /// Use `timer` instead of the process-wide one.
    pub fn with_timer(mut self, timer: Arc<DeadlineTimer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn timer(&self) -> &Arc<DeadlineTimer> {
        &self.timer
    }

    pub fn status(&self, path: &str) -> RemoteCall<String> {
        self.issue(RpcRequest::query(RpcMethod::Status, path))
    }

    pub fn info(&self, path: &str) -> RemoteCall<ResourceInfo> {
        self.issue(RpcRequest::query(RpcMethod::Info, path))
    }

    /// Read-only contract invocation.
    pub fn call(&self, path: &str, account: &str, method: &str, args: &[&str]) -> RemoteCall<Receipt> {
        self.issue(RpcRequest::invocation(RpcMethod::Call, path, account, method, args))
    }

    /// State-mutating contract invocation.
    pub fn send_transaction(
        &self,
        path: &str,
        account: &str,
        method: &str,
        args: &[&str],
    ) -> RemoteCall<Receipt> {
        self.issue(RpcRequest::invocation(
            RpcMethod::SendTransaction,
            path,
            account,
            method,
            args,
        ))
    }

    /// Handle to the resource at `path`, acting as `account`.
    pub fn resource(&self, path: &str, account: &str) -> Resource {
        Resource::new(Some(self.clone()), path, account)
    }

    fn issue<T>(&self, request: RpcRequest) -> RemoteCall<T> {
        RemoteCall {
            service: self.service.clone(),
            timer: self.timer.clone(),
            timeout: self.timeout,
            request,
            _response: PhantomData,
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("timeout_ms", &self.timeout.as_millis())
            .field("pending_deadlines", &self.timer.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Answers every request with a fixed envelope, or never answers.
    struct FixedService {
        answer: Option<Value>,
        seen: Mutex<Vec<RpcRequest>>,
    }

    impl RpcService for FixedService {
        fn dispatch(&self, request: RpcRequest, callback: TimedCallback<Value>) {
            self.seen.lock().unwrap().push(request);
            if let Some(answer) = self.answer.clone() {
                tokio::spawn(async move {
                    callback.resolve_success(answer);
                });
            }
        }
    }

    fn client(answer: Option<Value>) -> (RpcClient, Arc<FixedService>) {
        let service = Arc::new(FixedService {
            answer,
            seen: Mutex::new(Vec::new()),
        });
        let client = RpcClient::new(service.clone()).with_timer(Arc::new(DeadlineTimer::new()));
        (client, service)
    }

    #[tokio::test]
    async fn test_status_decodes_envelope() {
        let (client, service) = client(Some(json!({ "errorCode": 0, "data": "running" })));

        let response = client.status("a.b.c").send().await.unwrap().unwrap();
        assert_eq!(response.data.as_deref(), Some("running"));

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen[0], RpcRequest::query(RpcMethod::Status, "a.b.c"));
        assert_eq!(client.timer().pending(), 0);
    }

    #[tokio::test]
    async fn test_null_envelope_is_none() {
        let (client, _) = client(Some(Value::Null));
        assert!(client.info("a.b.c").send().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_remote_call_error() {
        let (client, _) = client(Some(json!({ "unexpected": true })));
        let err = client.call("a.b.c", "alice", "get", &[]).send().await.unwrap_err();
        assert_eq!(err.kind(), crate::rpc::ErrorKind::RemoteCall);
        assert!(err.message().unwrap().starts_with("Malformed response"));
    }

    #[tokio::test]
    async fn test_invocation_carries_account_and_args() {
        let (client, service) = client(None);
        let call = client.send_transaction("a.b.c", "alice", "set", &["x", "y"]);
        assert_eq!(call.request().account.as_deref(), Some("alice"));
        assert_eq!(call.request().args, vec!["x".to_string(), "y".to_string()]);
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_service_times_out() {
        let (client, _) = client(None);
        let client = client.with_timeout(Duration::from_secs(5));

        let err = client.status("a.b.c").send().await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(client.timer().pending(), 0);
    }
}
