//! MediaWiki Action API client (reqwest, JSON, `formatversion=2`).
//!
//! One `reqwest::Client` is built per run and shared by the hub client and
//! every per-wiki client, so all requests carry the same user agent and
//! session cookies and reuse one connection pool.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::api::{api_params, ApiClient, ApiParams, ClientFactory};
use crate::error::{GroupScanError, Result};

/// Identity shared by every request of a run
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Identity {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// Build the shared HTTP client.
///
/// No request timeout is set unless `timeout` is given: slow wikis are
/// healthy wikis.
pub fn build_http_client(identity: &Identity, timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(identity.user_agent.clone())
        .cookie_store(true);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| GroupScanError::Internal(format!("failed to build HTTP client: {}", e)))
}

#[derive(Clone)]
pub struct MediaWikiClient {
    http: Client,
    api_url: Url,
}

impl MediaWikiClient {
    pub fn new(http: Client, api_url: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)?;
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_str()
    }

    /// Log in with a bot password (`action=login`).
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let tokens = self
            .query(&api_params(&[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", "login"),
                ("formatversion", "2"),
            ]))
            .await?;
        let token = tokens
            .pointer("/query/tokens/logintoken")
            .and_then(Value::as_str)
            .ok_or_else(|| GroupScanError::Auth("no login token in response".to_string()))?
            .to_string();

        let response = self
            .post(&api_params(&[
                ("action", "login"),
                ("lgname", username),
                ("lgpassword", password),
                ("lgtoken", &token),
                ("formatversion", "2"),
            ]))
            .await?;

        match response.pointer("/login/result").and_then(Value::as_str) {
            Some("Success") => {
                info!("Logged in to {} as {}", self.api_url, username);
                Ok(())
            }
            Some(result) => {
                let reason = response
                    .pointer("/login/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("no reason given");
                Err(GroupScanError::Auth(format!(
                    "login as {} failed: {} ({})",
                    username, result, reason
                )))
            }
            None => Err(GroupScanError::Auth(format!(
                "unexpected login response: {}",
                response
            ))),
        }
    }

    async fn post(&self, params: &ApiParams) -> Result<Value> {
        let mut form = params.clone();
        form.push(("format".to_string(), "json".to_string()));
        let resp = self
            .http
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await?;
        decode_response(resp).await
    }
}

#[async_trait]
impl ApiClient for MediaWikiClient {
    async fn query(&self, params: &ApiParams) -> Result<Value> {
        debug!("GET {} {:?}", self.api_url, params);
        let resp = self
            .http
            .get(self.api_url.clone())
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await?;
        decode_response(resp).await
    }
}

async fn decode_response(resp: reqwest::Response) -> Result<Value> {
    let resp = resp.error_for_status()?;
    let body: Value = resp.json().await?;
    check_api_error(body)
}

/// Turn an API `error` object into `GroupScanError::Api`.
pub(crate) fn check_api_error(body: Value) -> Result<Value> {
    if let Some(error) = body.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let info = error
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(GroupScanError::Api { code, info });
    }
    Ok(body)
}

/// Binds [`MediaWikiClient`]s to wiki endpoints over one shared `Client`.
#[derive(Clone)]
pub struct MediaWikiFactory {
    http: Client,
}

impl MediaWikiFactory {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl ClientFactory for MediaWikiFactory {
    fn bind(&self, api_url: &str) -> Result<Box<dyn ApiClient>> {
        Ok(Box::new(MediaWikiClient::new(self.http.clone(), api_url)?))
    }
}
