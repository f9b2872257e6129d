// # ControlD Record Store
//
// This crate provides a ControlD implementation of `RecordStore` for the
// tsdns system. Rules are DNS spoof rules (`do = 2`) answering a hostname
// with a fixed address, grouped in a profile folder.
//
// ## Implementation Notes
//
// - One HTTP request per trait method
// - Full error propagation (no retry, no backoff; the caller decides)
// - HTTP timeout configured (30 seconds)
// - Specific error mapping for HTTP status codes (401/403, 404, 429, other)
// - Request and response bodies logged at debug level; the token never is
//
// ## API Endpoints
//
// ```http
// GET    /profiles/{profile}/folders
// POST   /profiles/{profile}/folders           {"name": ...}
// GET    /profiles/{profile}/rules/{folder}
// POST   /profiles/{profile}/rules             {"group", "status", "do", "via", "hostnames[]"}
// PUT    /profiles/{profile}/rules/{rule}      (same body)
// DELETE /profiles/{profile}/rules/{rule}
// ```

pub mod types;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tsdns_core::config::StoreConfig;
use tsdns_core::{Error, ExistingRule, Folder, RecordStore, Result};

use types::{
    ApiResponse, CreatedFolderBody, FolderRequest, FoldersBody, RulePayload, RuleRequest,
    RulesBody,
};

/// ControlD API base URL
const CONTROLD_API_BASE: &str = "https://api.controld.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// ControlD record store
///
/// Stateless: every trait method maps to exactly one API call.
pub struct ControlDStore {
    /// ControlD API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Profile holding the folder and its rules
    profile_id: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ControlDStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlDStore")
            .field("api_token", &"<REDACTED>")
            .field("profile_id", &self.profile_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ControlDStore {
    /// Create a new ControlD store
    ///
    /// # Parameters
    ///
    /// - `api_token`: ControlD API token with write access to the profile
    /// - `profile_id`: Profile the rules live in
    pub fn new(api_token: impl Into<String>, profile_id: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        let profile_id = profile_id.into();

        if api_token.is_empty() {
            return Err(Error::config("ControlD API token cannot be empty"));
        }
        if profile_id.is_empty() {
            return Err(Error::config("ControlD profile ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            profile_id,
            base_url: CONTROLD_API_BASE.to_string(),
            client,
        })
    }

    /// Create a store from configuration
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config.api_token.clone(), config.profile_id.clone())
    }

    /// Point the store at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn profile_path(&self, suffix: &str) -> String {
        format!("/profiles/{}/{}", self.profile_id, suffix)
    }

    /// Perform one request and return the raw body of a 2xx response
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        context: &str,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json");

        if let Some(body) = body {
            tracing::debug!("Request body: {}", body);
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            Error::record_store(format!("{}: HTTP request failed: {}", context, e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::record_store(format!("{}: failed to read response: {}", context, e))
        })?;
        tracing::debug!("Response {}: {}", status, text);

        if !status.is_success() {
            return Err(Error::from_status(status.as_u16(), context, &text));
        }

        Ok(text)
    }

    /// Parse an envelope and return its body
    fn parse_body<T: DeserializeOwned>(text: &str, context: &str) -> Result<T> {
        let envelope: ApiResponse<T> = serde_json::from_str(text)
            .map_err(|e| Error::invalid_response(format!("{}: {}", context, e)))?;
        Self::check_success(&envelope, context)?;

        envelope
            .body
            .ok_or_else(|| Error::invalid_response(format!("{}: response has no body", context)))
    }

    /// Verify a mutation response; an empty body counts as success
    fn check_mutation(text: &str, context: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let envelope: ApiResponse<Value> = serde_json::from_str(text)
            .map_err(|e| Error::invalid_response(format!("{}: {}", context, e)))?;
        Self::check_success(&envelope, context)
    }

    fn check_success<T>(envelope: &ApiResponse<T>, context: &str) -> Result<()> {
        if envelope.success == Some(false) {
            let message = envelope
                .error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Error::record_store(format!("{}: {}", context, message)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for ControlDStore {
    async fn list_folders(&self) -> Result<Vec<Folder>> {
        let context = "list folders";
        let text = self
            .execute(Method::GET, &self.profile_path("folders"), None, context)
            .await?;
        let body: FoldersBody = Self::parse_body(&text, context)?;

        Ok(body
            .folders
            .into_iter()
            .map(|f| f.into_folder())
            .filter(|f| !f.id.is_empty())
            .collect())
    }

    async fn create_folder(&self, name: &str) -> Result<Folder> {
        let context = "create folder";
        let payload = serde_json::to_value(FolderRequest { name })?;
        let text = self
            .execute(
                Method::POST,
                &self.profile_path("folders"),
                Some(payload),
                context,
            )
            .await?;
        let body: CreatedFolderBody = Self::parse_body(&text, context)?;

        let mut folder = body
            .into_folder()
            .map(|f| f.into_folder())
            .ok_or_else(|| Error::invalid_response("create folder: no folder in response"))?;
        if folder.name.is_empty() {
            folder.name = name.to_string();
        }
        Ok(folder)
    }

    async fn list_rules(&self, folder_id: &str) -> Result<Vec<ExistingRule>> {
        let context = "list rules";
        let text = self
            .execute(
                Method::GET,
                &self.profile_path(&format!("rules/{}", folder_id)),
                None,
                context,
            )
            .await?;
        let body: RulesBody = Self::parse_body(&text, context)?;

        let mut rules = Vec::with_capacity(body.rules.len());
        for raw in body.rules {
            let payload: RulePayload = serde_json::from_value(raw.clone())
                .map_err(|e| Error::invalid_response(format!("{}: {}", context, e)))?;
            match payload.into_existing_rule(raw) {
                Some(rule) => rules.push(rule),
                None => tracing::debug!("Ignoring rule without hostname in folder {}", folder_id),
            }
        }

        Ok(rules)
    }

    async fn create_rule(&self, folder_id: &str, hostname: &str, address: &str) -> Result<()> {
        let context = format!("create rule {}", hostname);
        let payload = serde_json::to_value(RuleRequest::spoof(folder_id, hostname, address))?;
        let text = self
            .execute(Method::POST, &self.profile_path("rules"), Some(payload), &context)
            .await?;
        Self::check_mutation(&text, &context)
    }

    async fn update_rule(
        &self,
        rule_id: &str,
        folder_id: &str,
        hostname: &str,
        address: &str,
    ) -> Result<()> {
        let context = format!("update rule {}", hostname);
        let payload = serde_json::to_value(RuleRequest::spoof(folder_id, hostname, address))?;
        let text = self
            .execute(
                Method::PUT,
                &self.profile_path(&format!("rules/{}", rule_id)),
                Some(payload),
                &context,
            )
            .await?;
        Self::check_mutation(&text, &context)
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<()> {
        let context = format!("delete rule {}", rule_id);
        let text = self
            .execute(
                Method::DELETE,
                &self.profile_path(&format!("rules/{}", rule_id)),
                None,
                &context,
            )
            .await?;
        Self::check_mutation(&text, &context)
    }

    fn store_name(&self) -> &'static str {
        "controld"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(ControlDStore::new("", "prof"), Err(Error::Config(_))));
        assert!(matches!(ControlDStore::new("token", ""), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let config = StoreConfig::new("token", "prof123");
        let store = ControlDStore::from_config(&config).unwrap();
        assert_eq!(store.profile_id, "prof123");
        assert_eq!(store.base_url, CONTROLD_API_BASE);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = ControlDStore::new("token", "prof")
            .unwrap()
            .with_base_url("http://127.0.0.1:9000/");
        assert_eq!(store.base_url, "http://127.0.0.1:9000");
        assert_eq!(store.profile_path("folders"), "/profiles/prof/folders");
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let store = ControlDStore::new("secret_token_12345", "prof").unwrap();

        let debug_str = format!("{:?}", store);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("ControlDStore"));
    }

    #[test]
    fn test_store_name() {
        let store = ControlDStore::new("token", "prof").unwrap();
        assert_eq!(store.store_name(), "controld");
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let err = ControlDStore::check_mutation(
            r#"{"success": false, "error": {"message": "Hostname already exists"}}"#,
            "create rule a.ts",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Record store error: create rule a.ts: Hostname already exists"
        );
        assert!(ControlDStore::check_mutation("", "delete rule x").is_ok());
    }
}
