//! ControlD API payload types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tsdns_core::{ExistingRule, Folder};

/// Rule status: enabled
pub const RULE_STATUS_ENABLED: u8 = 1;

/// Rule action: spoof (answer with `via`)
pub const RULE_ACTION_SPOOF: u8 = 2;

/// Common response envelope
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub body: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
}

/// `GET /profiles/{profile}/folders`
#[derive(Debug, Deserialize)]
pub struct FoldersBody {
    #[serde(default)]
    pub folders: Vec<FolderPayload>,
}

/// `POST /profiles/{profile}/folders`
///
/// The new folder is returned either as `folder` or as the only element of
/// `groups`.
#[derive(Debug, Deserialize)]
pub struct CreatedFolderBody {
    #[serde(default)]
    pub folder: Option<FolderPayload>,
    #[serde(default)]
    pub groups: Vec<FolderPayload>,
}

impl CreatedFolderBody {
    pub fn into_folder(self) -> Option<FolderPayload> {
        self.folder.or_else(|| self.groups.into_iter().next())
    }
}

#[derive(Debug, Deserialize)]
pub struct FolderPayload {
    #[serde(rename = "PK", default, deserialize_with = "string_or_number")]
    pub pk: Option<String>,
    #[serde(default, alias = "group")]
    pub name: String,
}

impl FolderPayload {
    pub fn into_folder(self) -> Folder {
        Folder {
            id: self.pk.unwrap_or_default(),
            name: self.name,
        }
    }
}

/// `GET /profiles/{profile}/rules/{folder}`
///
/// Rules are kept as raw JSON so the backup snapshot holds the exact payload.
#[derive(Debug, Deserialize)]
pub struct RulesBody {
    #[serde(default)]
    pub rules: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RulePayload {
    #[serde(rename = "PK", default, deserialize_with = "string_or_number")]
    pub pk: Option<String>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub via: Option<String>,
    #[serde(default)]
    pub action: Option<RuleAction>,
}

#[derive(Debug, Deserialize)]
pub struct RuleAction {
    #[serde(default)]
    pub via: Option<String>,
}

impl RulePayload {
    /// Convert to a rule, or `None` when the payload names no hostname
    pub fn into_existing_rule(self, raw: Value) -> Option<ExistingRule> {
        let hostname = self
            .hostnames
            .into_iter()
            .find(|h| !h.is_empty())
            .or_else(|| self.pk.clone())
            .filter(|h| !h.is_empty())?;

        let address = self
            .action
            .and_then(|a| a.via)
            .or(self.via)
            .unwrap_or_default();

        Some(ExistingRule {
            id: self.pk.unwrap_or_else(|| hostname.clone()),
            hostname,
            address,
            extra: raw,
        })
    }
}

/// Body for rule create and update
#[derive(Debug, Serialize)]
pub struct RuleRequest<'a> {
    pub group: &'a str,
    pub status: u8,
    #[serde(rename = "do")]
    pub action: u8,
    pub via: &'a str,
    #[serde(rename = "hostnames[]")]
    pub hostnames: [&'a str; 1],
}

impl<'a> RuleRequest<'a> {
    /// An enabled spoof rule answering `hostname` with `address`
    pub fn spoof(folder_id: &'a str, hostname: &'a str, address: &'a str) -> Self {
        Self {
            group: folder_id,
            status: RULE_STATUS_ENABLED,
            action: RULE_ACTION_SPOOF,
            via: address,
            hostnames: [hostname],
        }
    }
}

/// Body for folder create
#[derive(Debug, Serialize)]
pub struct FolderRequest<'a> {
    pub name: &'a str,
}

/// Accept identifiers encoded as either JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
