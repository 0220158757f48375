//! Token acquisition against a tenant's GraphQL endpoint.

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crate::config::{Environment, Tenant};

/// The platform does not report token lifetimes; assume one hour.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

const TOKEN_QUERY: &str = r#"
query token($tenantId: String!, $clientId: String!, $username: String!, $password: String!) {
    token_2(
        tenantId: $tenantId,
        clientId: $clientId,
        username: $username,
        password: $password
    ) {
        accessToken
    }
}"#;

/// A bearer token and when it stops being trustworthy.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl TokenInfo {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// Fetches and caches bearer tokens per tenant alias for one run.
pub struct AuthManager {
    tokens: HashMap<String, TokenInfo>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Return a valid token for `alias`, fetching a fresh one when the cache
    /// is empty or stale.
    pub async fn token_for(
        &mut self,
        alias: &str,
        environment: &Environment,
        tenant: &Tenant,
    ) -> Result<String> {
        if let Some(cached) = self.tokens.get(alias) {
            if !cached.is_expired() {
                debug!("Reusing cached token for tenant {}", alias);
                return Ok(cached.access_token.clone());
            }
        }

        let token = fetch_token(environment, tenant).await?;
        let access_token = token.access_token.clone();
        self.tokens.insert(alias.to_string(), token);
        Ok(access_token)
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a new bearer token via the platform's `token_2` query. This is the
/// one unauthenticated call in the system.
pub async fn fetch_token(environment: &Environment, tenant: &Tenant) -> Result<TokenInfo> {
    info!(
        "Authenticating against {} for tenant {}",
        environment.endpoint, tenant.tenant_id
    );

    let client = reqwest::Client::new();
    let response = client
        .post(super::client::graph_endpoint(&environment.endpoint))
        .json(&json!({
            "query": TOKEN_QUERY,
            "variables": {
                "tenantId": tenant.tenant_id,
                "clientId": tenant.client_id,
                "username": tenant.username,
                "password": tenant.password,
            }
        }))
        .send()
        .await
        .context("query:token request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("query:token response: {}", body);
        anyhow::bail!("Authentication failed: server returned {}", status);
    }

    let body: serde_json::Value = response
        .json()
        .await
        .context("query:token returned invalid JSON")?;

    if let Some(errors) = body.get("errors").and_then(serde_json::Value::as_array) {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(serde_json::Value::as_str))
            .collect();
        anyhow::bail!("Authentication failed: {}", messages.join("; "));
    }

    let access_token = body
        .pointer("/data/token_2/accessToken")
        .and_then(serde_json::Value::as_str)
        .context("No access token in response")?
        .to_string();

    debug!("Token acquired for tenant {}", tenant.tenant_id);

    Ok(TokenInfo {
        access_token,
        expires_at: SystemTime::now() + DEFAULT_TOKEN_TTL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tokens_are_not_expired() {
        let token = TokenInfo {
            access_token: "t".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(60),
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn past_expiry_means_expired() {
        let token = TokenInfo {
            access_token: "t".to_string(),
            expires_at: SystemTime::now() - Duration::from_secs(1),
        };
        assert!(token.is_expired());
    }
}
