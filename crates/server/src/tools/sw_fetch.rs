//! sw_fetch tool implementation.
//!
//! Offers one request to the worker. Requests the worker does not intercept
//! are fetched straight from the network, exactly as a browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Destination, Fetcher, Interception, Method, RouteRequest, RouteResponse, Worker, canonicalize};
use shellcache_core::Error;

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Resource-type hint: image, style, script, font or document.
    #[serde(default)]
    pub destination: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    /// Whether the worker handled the request.
    pub intercepted: bool,
    /// Request classification, when intercepted.
    pub kind: Option<String>,
    /// network, cache or fallback.
    pub source: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl SwFetchOutput {
    fn new(request: &RouteRequest, kind: Option<String>, response: &RouteResponse) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.to_string(),
            intercepted: kind.is_some(),
            kind,
            source: response.source.as_str().to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body_text().into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<F: Fetcher>(worker: &Worker<F>, params: &SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidInput(format!("invalid method: {}", params.method)))?;
    let url = canonicalize(&params.url, Some(&worker.router().config().origin))
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let destination = params
        .destination
        .as_deref()
        .map(Destination::parse)
        .unwrap_or_default();
    let request = RouteRequest::new(method, url).with_destination(destination);

    let output = match worker.handle_fetch(&request).await? {
        Interception::Handled { kind, response } => SwFetchOutput::new(&request, Some(kind.to_string()), &response),
        Interception::PassThrough => {
            let fetched = worker.router().fetcher().fetch(&request).await?;
            SwFetchOutput::new(&request, None, &RouteResponse::from_network(&fetched))
        }
    };

    json_result(&output)
}
