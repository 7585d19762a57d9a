//! HTTP transport.
//!
//! # Request Layout
//! ```text
//! POST {server}/resource/{zone}/{chain}/{resource}/{verb}
//! X-Request-Id: <uuid v4>
//! {"version": "1", "data": {"account": ..., "method": ..., "args": [...]}}
//! ```
//!
//! The response body is handed to the callback as-is. Non-2xx statuses and
//! unreadable bodies resolve the callback with a failure.

use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::rpc::callback::TimedCallback;
use crate::rpc::service::{RpcRequest, RpcService};
use crate::rpc::types::{SdkError, SdkResult};

const PROTOCOL_VERSION: &str = "1";

#[derive(Serialize)]
struct Envelope<'a> {
    version: &'a str,
    data: RequestData<'a>,
}

#[derive(Serialize)]
struct RequestData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "no_args")]
    args: &'a [String],
}

fn no_args(args: &&[String]) -> bool {
    args.is_empty()
}

/// [`RpcService`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: reqwest::Client,
    server: Url,
}

impl HttpService {
    /// Create a transport for `server` (e.g. `http://127.0.0.1:8250`).
    pub fn new(server: &str) -> SdkResult<Self> {
        let server: Url = server
            .parse()
            .map_err(|e| SdkError::configuration(format!("Invalid server URL '{}': {}", server, e)))?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(SdkError::configuration(format!(
                "Unsupported server scheme '{}'",
                server.scheme()
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            server,
        })
    }

    /// Endpoint for `request`; path segments become URL segments.
    pub fn endpoint(&self, request: &RpcRequest) -> SdkResult<Url> {
        let mut url = self.server.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SdkError::configuration("Server URL cannot be a base"))?;
            segments.pop_if_empty().push("resource");
            for part in request.path.split('.') {
                segments.push(part);
            }
            segments.push(request.kind.verb());
        }
        Ok(url)
    }
}

impl RpcService for HttpService {
    fn dispatch(&self, request: RpcRequest, callback: TimedCallback<Value>) {
        let url = match self.endpoint(&request) {
            Ok(url) => url,
            Err(e) => {
                callback.resolve_failure(SdkError::remote_call(e.message().unwrap_or_default()));
                return;
            }
        };

        let request_id = Uuid::new_v4();
        let body = serde_json::to_value(Envelope {
            version: PROTOCOL_VERSION,
            data: RequestData {
                account: request.account.as_deref(),
                method: request.method.as_deref(),
                args: &request.args,
            },
        });
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                callback.resolve_failure(SdkError::remote_call(e.to_string()));
                return;
            }
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            tracing::debug!(%request_id, %url, "Sending HTTP request");
            let outcome = async {
                let response = client
                    .post(url.clone())
                    .header("X-Request-Id", request_id.to_string())
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| SdkError::remote_call(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(SdkError::remote_call(format!(
                        "Server returned status {}: {}",
                        status, text
                    )));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|e| SdkError::remote_call(e.to_string()))
            }
            .await;

            let delivered = match outcome {
                Ok(value) => callback.resolve_success(value),
                Err(e) => {
                    tracing::warn!(%request_id, error = %e, "HTTP request failed");
                    callback.resolve_failure(e)
                }
            };
            if !delivered {
                tracing::debug!(%request_id, "Answer arrived after the call was resolved");
            }
        });
    }
}
