pub mod api;
pub mod mediawiki;

pub use api::{api_params, ApiClient, ApiParams, ClientFactory};
pub use mediawiki::{build_http_client, Identity, MediaWikiClient, MediaWikiFactory};

#[cfg(test)]
pub use api::MockApiClient;
