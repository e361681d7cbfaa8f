//! Remote progress records over a PostgREST-style HTTP table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tenses_core::model::UserId;
use url::Url;

use crate::repository::{RemoteProgress, RemoteProgressStore, StorageError};

const DEFAULT_TABLE: &str = "user_progress";

#[derive(Clone, Debug)]
pub struct RestConfig {
    base_url: Url,
    api_key: String,
    table: String,
    access_token: Option<String>,
}

impl RestConfig {
    /// Validate a base URL and API key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` for an unparsable URL or a blank key.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| StorageError::InvalidConfig(format!("remote url: {err}")))?;
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StorageError::InvalidConfig("remote api key is empty".into()));
        }
        Ok(Self {
            base_url,
            api_key,
            table: DEFAULT_TABLE.into(),
            access_token: None,
        })
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Per-user token from the identity provider; the API key is used otherwise.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.table
        )
    }
}

/// `RemoteProgressStore` backed by an HTTP record table keyed by `user_id`.
#[derive(Clone)]
pub struct RestRemoteStore {
    client: Client,
    config: RestConfig,
}

impl RestRemoteStore {
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
    }
}

#[derive(Debug, Serialize)]
struct ProgressRowOut<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    progress: &'a RemoteProgress,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ProgressRowIn {
    #[serde(flatten)]
    progress: RemoteProgress,
}

fn connection(err: reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl RemoteProgressStore for RestRemoteStore {
    async fn read_one(&self, user: &UserId) -> Result<RemoteProgress, StorageError> {
        let request = self
            .client
            .get(self.config.table_url())
            .query(&[
                ("user_id", format!("eq.{user}")),
                ("select", "pack_progress,recently_completed".to_string()),
                ("limit", "1".to_string()),
            ]);
        let response = self.authorize(request).send().await.map_err(connection)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Connection(format!(
                "remote read returned status {status}"
            )));
        }

        let rows: Vec<ProgressRowIn> = response
            .json()
            .await
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        tracing::debug!(user = %user, rows = rows.len(), "read remote progress");

        rows.into_iter()
            .next()
            .map(|row| row.progress)
            .ok_or(StorageError::NotFound)
    }

    async fn upsert(&self, user: &UserId, progress: &RemoteProgress) -> Result<(), StorageError> {
        let row = ProgressRowOut {
            user_id: user.as_str(),
            progress,
            updated_at: Utc::now(),
        };
        let request = self
            .client
            .post(self.config.table_url())
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        let response = self.authorize(request).send().await.map_err(connection)?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(StorageError::Conflict);
        }
        if !status.is_success() {
            return Err(StorageError::Connection(format!(
                "remote upsert returned status {status}"
            )));
        }
        tracing::debug!(user = %user, "upserted remote progress");
        Ok(())
    }
}
