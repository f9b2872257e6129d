// # Tailscale Inventory Source
//
// This crate provides the Tailscale implementation of `InventorySource` for
// the tsdns system.
//
// ## Architecture
//
// Each trait method is one `GET` against the Tailscale v2 API:
//
// ```http
// GET {base}/tailnet/{tailnet}/devices    -> { "devices":  [{ "name", "addresses": [...] }] }
// GET {base}/tailnet/{tailnet}/services   -> { "services": [{ "name", "ip" | "addrs": [...] }] }
// ```
//
// The source is read-only and holds no state between calls.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tsdns_core::config::InventoryConfig;
use tsdns_core::{Error, InventoryEntry, InventorySource, Result};

/// Tailscale API base URL
const TAILSCALE_API_BASE: &str = "https://api.tailscale.com/api/v2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// `GET /tailnet/{tailnet}/devices`
#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(default)]
    name: String,
    #[serde(default)]
    addresses: Vec<String>,
}

/// `GET /tailnet/{tailnet}/services`
#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    addrs: Vec<String>,
}

impl Device {
    // First address is the IPv4 one in practice
    fn into_entry(self) -> InventoryEntry {
        let address = self.addresses.into_iter().next().unwrap_or_default();
        InventoryEntry::device(&self.name, address)
    }
}

impl Service {
    fn into_entry(self) -> InventoryEntry {
        let address = self
            .ip
            .filter(|ip| !ip.is_empty())
            .or_else(|| self.addrs.into_iter().next())
            .unwrap_or_default();
        InventoryEntry::service(&self.name, address)
    }
}

/// Tailscale inventory source
pub struct TailscaleSource {
    /// Tailscale API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Tailnet identifier (`-` = the key's default tailnet)
    tailnet: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for TailscaleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailscaleSource")
            .field("api_key", &"<REDACTED>")
            .field("tailnet", &self.tailnet)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TailscaleSource {
    /// Create a new Tailscale source
    ///
    /// # Parameters
    ///
    /// - `api_key`: Tailscale API key with read access to devices and services
    /// - `tailnet`: Tailnet identifier, `-` for the key's default tailnet
    pub fn new(api_key: impl Into<String>, tailnet: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Tailscale API key cannot be empty"));
        }

        let tailnet = tailnet.into();
        let tailnet = if tailnet.trim().is_empty() {
            "-".to_string()
        } else {
            tailnet.trim().to_string()
        };

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            tailnet,
            base_url: TAILSCALE_API_BASE.to_string(),
            client,
        })
    }

    /// Create a source from configuration
    pub fn from_config(config: &InventoryConfig) -> Result<Self> {
        Self::new(config.api_key.clone(), config.tailnet.clone())
    }

    /// Point the source at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `{base}/tailnet/{tailnet}/{resource}` and decode the body
    async fn fetch<T: serde::de::DeserializeOwned>(&self, resource: &str) -> Result<T> {
        let url = format!("{}/tailnet/{}/{}", self.base_url, self.tailnet, resource);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::inventory(format!("list {}: HTTP request failed: {}", resource, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::inventory(format!("list {}: failed to read response: {}", resource, e)))?;
        tracing::debug!("Response {}: {}", status, text);

        if !status.is_success() {
            return Err(Error::from_status(
                status.as_u16(),
                &format!("list {}", resource),
                &text,
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::invalid_response(format!("list {}: {}", resource, e)))
    }
}

#[async_trait]
impl InventorySource for TailscaleSource {
    async fn list_devices(&self) -> Result<Vec<InventoryEntry>> {
        let list: DeviceList = self.fetch("devices").await?;
        Ok(list.devices.into_iter().map(Device::into_entry).collect())
    }

    async fn list_services(&self) -> Result<Vec<InventoryEntry>> {
        let list: ServiceList = self.fetch("services").await?;
        Ok(list.services.into_iter().map(Service::into_entry).collect())
    }

    fn source_name(&self) -> &'static str {
        "tailscale"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsdns_core::EntryKind;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(TailscaleSource::new("", "-"), Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_tailnet_defaults() {
        let source = TailscaleSource::new("tskey-api-x", "  ").unwrap();
        assert_eq!(source.tailnet, "-");
    }

    #[test]
    fn test_from_config() {
        let mut config = InventoryConfig::new("tskey-api-x");
        config.tailnet = "example.com".to_string();
        let source = TailscaleSource::from_config(&config).unwrap();
        assert_eq!(source.tailnet, "example.com");
        assert_eq!(source.base_url, TAILSCALE_API_BASE);
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let source = TailscaleSource::new("tskey-api-secret", "-").unwrap();
        let debug_str = format!("{:?}", source);
        assert!(!debug_str.contains("secret"));
    }

    #[test]
    fn test_device_uses_first_address() {
        let device: Device = serde_json::from_str(
            r#"{"name": "Server1.tail1234.ts.net", "addresses": ["100.64.0.1", "fd7a:115c::1"]}"#,
        )
        .unwrap();
        let entry = device.into_entry();
        assert_eq!(entry.name, "server1");
        assert_eq!(entry.address, "100.64.0.1");
        assert_eq!(entry.kind, EntryKind::Device);
    }

    #[test]
    fn test_device_without_addresses() {
        let device: Device = serde_json::from_str(r#"{"name": "offline"}"#).unwrap();
        assert!(!device.into_entry().is_complete());
    }

    #[test]
    fn test_service_address_fallback() {
        let with_ip: Service =
            serde_json::from_str(r#"{"name": "Grafana", "ip": "100.100.0.5"}"#).unwrap();
        assert_eq!(with_ip.into_entry().address, "100.100.0.5");

        let with_addrs: Service =
            serde_json::from_str(r#"{"name": "db", "addrs": ["100.100.0.6"]}"#).unwrap();
        let entry = with_addrs.into_entry();
        assert_eq!(entry.name, "db");
        assert_eq!(entry.address, "100.100.0.6");
        assert_eq!(entry.kind, EntryKind::Service);
    }
}
