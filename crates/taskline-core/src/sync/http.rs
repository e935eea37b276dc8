//! HTTP client for a REST task authority.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::models::TaskId;
use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::remote::{RemoteAuthority, RemoteError, RemoteResult, RemoteTask};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Remote authority speaking `GET/POST /tasks` and `PUT/DELETE /tasks/{id}`.
#[derive(Clone)]
pub struct HttpRemoteAuthority {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteAuthority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteAuthority")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteAuthority {
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    /// Use a preconfigured `reqwest` client (proxy, TLS, headers).
    pub fn with_client(
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the remote host answers at all.
    ///
    /// Any HTTP response counts as reachable; only transport failures and
    /// timeouts report offline.
    pub async fn probe(&self) -> bool {
        match self
            .client
            .get(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!("Remote probe failed: {error}");
                false
            }
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: &TaskId) -> String {
        format!(
            "{}/tasks/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }
}

impl RemoteAuthority for HttpRemoteAuthority {
    async fn create(&self, task: &RemoteTask) -> RemoteResult<()> {
        let response = self
            .client
            .post(self.collection_url())
            .header("Accept", "application/json")
            .json(task)
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn update(&self, task: &RemoteTask) -> RemoteResult<()> {
        let response = self
            .client
            .put(self.task_url(&task.id))
            .header("Accept", "application/json")
            .json(task)
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<()> {
        let response = self.client.delete(self.task_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Remote had no task {id}; treating delete as done");
            return Ok(());
        }
        ensure_success(response).await
    }

    async fn list_all(&self) -> RemoteResult<Vec<RemoteTask>> {
        let response = self
            .client
            .get(self.collection_url())
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<Vec<RemoteTask>>().await?)
    }
}

async fn ensure_success(response: reqwest::Response) -> RemoteResult<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api(parse_api_error(status, &body)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("remote URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "remote URL must include http:// or https://".to_string(),
        ))
    }
}
