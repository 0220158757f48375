//! GraphQL transport for one tenant endpoint, with connection pooling.

use anyhow::{Context, Result};
use log::debug;
use serde_json::{json, Value};
use std::time::Duration;

/// Authenticated GraphQL client bound to one tenant's endpoint.
pub struct GraphClient {
    endpoint: String,
    token: String,
    http: reqwest::Client,
}

impl GraphClient {
    pub fn new(endpoint: &str, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tenant-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: graph_endpoint(endpoint),
            token,
            http,
        })
    }

    /// Execute one GraphQL operation and return its `data` payload.
    ///
    /// Both transport failures and GraphQL `errors` payloads surface as
    /// errors carrying `operation`; the raw query and variables go to the
    /// debug log for diagnosis.
    pub async fn execute(&self, operation: &str, query: &str, variables: Value) -> Result<Value> {
        let payload = json!({ "query": query, "variables": variables });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{}: request failed", operation))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{}: status {}", operation, status);
            debug!("{}: response {}", operation, body);
            debug!("{}: query {}", operation, query);
            debug!("{}: variables {}", operation, variables);
            anyhow::bail!("{}: server returned {}", operation, status);
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("{}: invalid JSON response", operation))?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            debug!("{}: query {}", operation, query);
            debug!("{}: variables {}", operation, variables);
            anyhow::bail!("{}: {}", operation, messages.join("; "));
        }

        body.get("data")
            .cloned()
            .with_context(|| format!("{}: response carries no data", operation))
    }
}

/// The platform serves GraphQL at `<endpoint>/graphql`; tolerate endpoints
/// configured with the suffix already present.
pub(crate) fn graph_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    if trimmed.ends_with("/graphql") {
        trimmed.to_string()
    } else {
        format!("{}/graphql", trimmed)
    }
}
