use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Query string parameters of one Action API request
pub type ApiParams = Vec<(String, String)>;

/// Build [`ApiParams`] from borrowed pairs.
pub fn api_params(pairs: &[(&str, &str)]) -> ApiParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A client bound to a single wiki's `api.php`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Issue a read request and return the decoded JSON body.
    ///
    /// An `error` object in the body is reported as `GroupScanError::Api`.
    async fn query(&self, params: &ApiParams) -> Result<Value>;
}

/// Creates per-wiki clients sharing one identity (user agent, session).
pub trait ClientFactory: Send + Sync {
    fn bind(&self, api_url: &str) -> Result<Box<dyn ApiClient>>;
}
