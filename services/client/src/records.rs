//! services/client/src/records.rs
//!
//! "Impure" wire records exchanged with the backend and the local store.
//! Each converts to or from the pure domain type it mirrors.

use chrono::{DateTime, NaiveDateTime, Utc};
use prd_client_core::domain::{Document, GenerationRequest, RegisteredAccount, UserProfile};
use prd_client_core::ports::{PortError, PortResult};
use serde::{Deserialize, Deserializer, Serialize};

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProfileRecord {
    pub fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            is_active: self.is_active,
        }
    }

    pub fn from_domain(user: &UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationRecord<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration echoes either a user object or `{message, user_id}`.
#[derive(Debug, Deserialize)]
pub struct RegisteredRecord {
    #[serde(default, deserialize_with = "optional_id_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl RegisteredRecord {
    pub fn to_domain(self) -> RegisteredAccount {
        RegisteredAccount {
            user_id: self.id.or(self.user_id),
            email: self.email,
        }
    }
}

//=========================================================================================
// Documents
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct DocumentRecord {
    #[serde(deserialize_with = "id_string")]
    id: String,
    title: String,
    #[serde(default)]
    input_prompt: Option<String>,
    template_type: String,
    format: String,
    content: String,
    #[serde(deserialize_with = "server_timestamp")]
    created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn to_domain(self) -> PortResult<Document> {
        Ok(Document {
            template_type: self
                .template_type
                .parse()
                .map_err(|e| PortError::Unexpected(format!("Document {}: {}", self.id, e)))?,
            format: self
                .format
                .parse()
                .map_err(|e| PortError::Unexpected(format!("Document {}: {}", self.id, e)))?,
            id: self.id,
            title: self.title,
            input_prompt: self.input_prompt.unwrap_or_default(),
            content: self.content,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationRecord<'a> {
    pub title: &'a str,
    pub input_prompt: &'a str,
    pub template_type: &'static str,
    pub format: &'static str,
}

impl<'a> GenerationRecord<'a> {
    pub fn from_domain(request: &'a GenerationRequest) -> Self {
        Self {
            title: &request.title,
            input_prompt: &request.input_prompt,
            template_type: request.template_type.as_str(),
            format: request.format.as_str(),
        }
    }
}

//=========================================================================================
// Field Helpers
//=========================================================================================

fn default_true() -> bool {
    true
}

/// Ids arrive as UUID strings, but integer keys are accepted too.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

/// RFC 3339 timestamps, or naive ISO timestamps which the backend emits in UTC.
fn server_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
