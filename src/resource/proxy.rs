//! Handle to one remote resource.
//!
//! # Responsibilities
//! - Validate local preconditions (client, path, account)
//! - Issue status / info / call / sendTransaction through [`RpcClient`]
//! - Turn every answer into either a validated value or an [`SdkError`]
//!
//! # Error Mapping
//! ```text
//! issuance or await fails (incl. timeout) → RemoteCall (underlying message)
//! envelope null / not SUCCESS / no data   → Rpc (envelope message)
//! receipt null / receipt not SUCCESS      → CallContract (receipt message)
//! ```

use std::sync::Arc;

use crate::observability::metrics;
use crate::resource::path::{DefaultPathValidator, PathValidator};
use crate::rpc::client::{RemoteCall, RpcClient};
use crate::rpc::types::{Receipt, ResourceInfo, Response, SdkError, SdkResult, StatusCode};

/// Status payload reported by a resource that exists on its chain.
pub const ACTIVE_STATUS: &str = "exists";

/// A named remote resource reached through one account.
#[derive(Clone)]
pub struct Resource {
    rpc: Option<RpcClient>,
    path: String,
    account: String,
    validator: Arc<dyn PathValidator>,
}

impl Resource {
    /// Create a handle. Nothing is validated until [`Resource::check`].
    pub fn new(rpc: Option<RpcClient>, path: &str, account: &str) -> Self {
        Self {
            rpc,
            path: path.to_string(),
            account: account.to_string(),
            validator: Arc::new(DefaultPathValidator),
        }
    }

    /// Replace the path rule used by [`Resource::check`].
    pub fn with_validator(mut self, validator: Arc<dyn PathValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Validate client, path and account, in that order.
    pub fn check(&self) -> SdkResult<()> {
        self.rpc()?;
        self.validator.validate(&self.path)?;
        if self.account.is_empty() {
            return Err(SdkError::configuration("Account name not set"));
        }
        Ok(())
    }

    pub async fn status(&self) -> SdkResult<String> {
        let call = self.rpc()?.status(&self.path);
        let result = Self::must_ok_request(call).await.and_then(Self::check_response);
        Self::record("status", &result);
        result
    }

    pub async fn info(&self) -> SdkResult<ResourceInfo> {
        let call = self.rpc()?.info(&self.path);
        let result = Self::must_ok_request(call).await.and_then(Self::check_response);
        Self::record("info", &result);
        result
    }

    /// True if the resource reports itself as existing; false on any error.
    pub async fn is_active(&self) -> bool {
        match self.status().await {
            Ok(status) => status == ACTIVE_STATUS,
            Err(e) => {
                tracing::debug!(path = %self.path, error = %e, "Status query failed");
                false
            }
        }
    }

    /// Read-only invocation of `method`; returns the receipt's outputs.
    pub async fn call(&self, method: &str, args: &[&str]) -> SdkResult<Vec<String>> {
        let call = self.rpc()?.call(&self.path, &self.account, method, args);
        let result = Self::invoke(call).await;
        Self::record("call", &result);
        result
    }

    /// State-mutating invocation of `method`; returns the receipt's outputs.
    pub async fn send_transaction(&self, method: &str, args: &[&str]) -> SdkResult<Vec<String>> {
        let call = self.rpc()?.send_transaction(&self.path, &self.account, method, args);
        let result = Self::invoke(call).await;
        Self::record("send_transaction", &result);
        result
    }

    async fn invoke(call: RemoteCall<Receipt>) -> SdkResult<Vec<String>> {
        let response = Self::must_ok_request(call).await?;
        let receipt = Self::check_response(response)?;
        Self::check_receipt(Some(receipt))
    }

    fn rpc(&self) -> SdkResult<&RpcClient> {
        self.rpc
            .as_ref()
            .ok_or_else(|| SdkError::configuration("RPC client not set"))
    }

    async fn must_ok_request<T>(call: RemoteCall<T>) -> SdkResult<Option<Response<T>>>
    where
        T: serde::de::DeserializeOwned,
    {
        call.send().await.map_err(|e| {
            let message = e.message().unwrap_or_default();
            tracing::error!(kind = %e.kind(), "Error in remote call: {}", message);
            SdkError::remote_call(message)
        })
    }

    /// Accept only a present, successful envelope that carries data.
    fn check_response<T>(response: Option<Response<T>>) -> SdkResult<T> {
        match response {
            Some(Response {
                error_code: StatusCode::SUCCESS,
                data: Some(data),
                ..
            }) => Ok(data),
            Some(response) => Err(SdkError::rpc(response.message)),
            None => Err(SdkError::rpc(None)),
        }
    }

    /// Accept only a present receipt whose own code is SUCCESS.
    fn check_receipt(receipt: Option<Receipt>) -> SdkResult<Vec<String>> {
        match receipt {
            Some(receipt) if receipt.error_code == StatusCode::SUCCESS => Ok(receipt.result),
            Some(receipt) => Err(SdkError::call_contract(receipt.error_message)),
            None => Err(SdkError::call_contract(Some("Receipt missing".to_string()))),
        }
    }

    fn record<T>(op: &'static str, result: &SdkResult<T>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        metrics::record_resource_request(op, outcome);
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.path)
            .field("account", &self.account)
            .field("rpc_set", &self.rpc.is_some())
            .finish()
    }
}
