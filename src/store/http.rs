use super::{PostStore, StoreError};
use crate::routing::encode_segment;
use crate::types::Post;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Confirmation returned by `POST /api/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub status: String,
    pub id: String,
}

/// Post store backed by a remote service.
///
/// Stateless pass-through: every call becomes one request against
/// `{base_url}/api/posts`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn posts_url(&self) -> String {
        format!("{}/api/posts", self.base_url)
    }

    /// The id is escaped so `?`, `#`, `/` and `%` stay inside its segment.
    fn post_url(&self, id: &str) -> String {
        format!("{}/api/posts/{}", self.base_url, encode_segment(id))
    }
}

async fn status_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Status { status, body }
}

fn unreachable(err: reqwest::Error) -> StoreError {
    StoreError::Unreachable(err.to_string())
}

fn decode(err: reqwest::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

#[async_trait]
impl PostStore for HttpStore {
    async fn save(&self, post: &Post) -> Result<(), StoreError> {
        let body = serde_json::to_vec(post)?;
        let response = self
            .client
            .post(self.posts_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let receipt: SaveReceipt = response.json().await.map_err(decode)?;
        tracing::debug!(id = %receipt.id, status = %receipt.status, "post saved to remote store");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let response = self
            .client
            .get(self.post_url(id))
            .send()
            .await
            .map_err(unreachable)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await.map_err(decode)?)),
            _ => Err(status_error(response).await),
        }
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let response = self
            .client
            .get(self.posts_url())
            .send()
            .await
            .map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        response.json().await.map_err(decode)
    }
}
