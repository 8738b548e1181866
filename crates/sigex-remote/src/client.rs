//! Graph API client for ThreatExchange privacy groups

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v16.0";

const GROUP_FIELDS: &str = "id,name,description,threat_updates_enabled";

/// A ThreatExchange privacy group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyGroup {
    #[serde(deserialize_with = "id_from_string")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub threat_updates_enabled: bool,
}

// Graph API ids are JSON strings
fn id_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
    }

    match Id::deserialize(deserializer)? {
        Id::Int(id) => Ok(id),
        Id::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
    next: Option<String>,
}

/// Where privacy groups come from
#[async_trait]
pub trait PrivacyGroupSource: Send + Sync {
    /// Every group the app is a member or owner of, deduplicated by id
    async fn privacy_groups(&self) -> RemoteResult<Vec<PrivacyGroup>>;

    /// One group by id
    async fn privacy_group(&self, id: i64) -> RemoteResult<PrivacyGroup>;
}

/// App tokens look like `<app id>|<secret>`
#[must_use]
pub fn is_valid_app_token(token: &str) -> bool {
    match token.split_once('|') {
        Some((app_id, secret)) => {
            !app_id.is_empty()
                && app_id.chars().all(|c| c.is_ascii_digit())
                && !secret.is_empty()
                && secret
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        None => false,
    }
}

/// HTTP client for the ThreatExchange Graph API
pub struct ThreatExchangeClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl ThreatExchangeClient {
    /// Create a client with an app token
    ///
    /// # Errors
    /// Returns `MissingToken` if the token is empty
    pub fn new(token: impl Into<String>) -> RemoteResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(RemoteError::MissingToken);
        }
        Ok(Self {
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Point the client somewhere else (tests, API version pinning)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> RemoteResult<T> {
        let mut request = self.client.get(url).query(query);
        if !url.contains("access_token=") {
            request = request.query(&[("access_token", self.token.as_str())]);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn paged(&self, edge: &str) -> RemoteResult<Vec<PrivacyGroup>> {
        let mut groups = Vec::new();
        let first = format!("{}/{edge}", self.base_url);
        let mut page: Page<PrivacyGroup> = self.get(&first, &[("fields", GROUP_FIELDS)]).await?;

        loop {
            groups.append(&mut page.data);
            match page.paging.and_then(|p| p.next) {
                // the next url already carries every query parameter
                Some(next) => page = self.get(&next, &[]).await?,
                None => break,
            }
        }

        debug!(edge, count = groups.len(), "Fetched privacy groups");
        Ok(groups)
    }
}

#[async_trait]
impl PrivacyGroupSource for ThreatExchangeClient {
    async fn privacy_groups(&self) -> RemoteResult<Vec<PrivacyGroup>> {
        let mut groups = self.paged("threat_privacy_groups_member").await?;
        for owned in self.paged("threat_privacy_groups_owner").await? {
            if !groups.iter().any(|g| g.id == owned.id) {
                groups.push(owned);
            }
        }
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn privacy_group(&self, id: i64) -> RemoteResult<PrivacyGroup> {
        let url = format!("{}/{id}", self.base_url);
        self.get(&url, &[("fields", GROUP_FIELDS)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert!(is_valid_app_token("1234|abcDEF_-9"));
        assert!(!is_valid_app_token("1234"));
        assert!(!is_valid_app_token("abc|def"));
        assert!(!is_valid_app_token("1234|"));
        assert!(!is_valid_app_token("1234|a b"));
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            ThreatExchangeClient::new("  "),
            Err(RemoteError::MissingToken)
        ));
    }

    #[test]
    fn test_group_id_from_string() {
        let group: PrivacyGroup =
            serde_json::from_str(r#"{"id": "1012", "name": "Test Group"}"#).unwrap();
        assert_eq!(group.id, 1012);
        assert_eq!(group.description, "");
        assert!(!group.threat_updates_enabled);
    }
}
