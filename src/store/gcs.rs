//! Google Cloud Storage state store over the JSON API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::error::StorageError;
use crate::store::StateStore;

const API_BASE: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Stores blobs as objects in one GCS bucket.
///
/// Requests carry the configured bearer token, or one obtained from the GCE
/// metadata server when running on Google infrastructure.
pub struct GcsStore {
    client: Client,
    bucket: String,
    token: Option<String>,
    api_base: String,
}

impl GcsStore {
    pub fn new(bucket: impl Into<String>, token: Option<String>) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            bucket: bucket.into(),
            token,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point at another JSON API endpoint, e.g. a storage emulator
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn object_url(&self, name: &str) -> Result<Url, StorageError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Backend(format!("unusable API base {}", self.api_base)))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", name]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn upload_url(&self, name: &str) -> Result<Url, StorageError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Backend(format!("unusable API base {}", self.api_base)))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        Ok(url)
    }

    fn base_url(&self) -> Result<Url, StorageError> {
        Url::parse(&self.api_base)
            .map_err(|e| StorageError::Backend(format!("bad API base {}: {e}", self.api_base)))
    }

    async fn bearer_token(&self) -> Result<String, StorageError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let rsp = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        if !rsp.status().is_success() {
            return Err(StorageError::Backend(format!(
                "metadata server returned {}",
                rsp.status()
            )));
        }
        let token: MetadataToken = rsp.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl StateStore for GcsStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(name)?;
        let rsp = self
            .client
            .get(url)
            .bearer_auth(self.bearer_token().await?)
            .send()
            .await?;

        match rsp.status() {
            // a missing bucket is also a 404; only a missing object means first run
            StatusCode::NOT_FOUND => {
                let text = rsp.text().await.unwrap_or_default();
                if names_missing_object(&text) {
                    Err(StorageError::NotFound(name.to_string()))
                } else {
                    Err(StorageError::Backend(format!(
                        "GCS download of gs://{}/{} returned 404: {}",
                        self.bucket,
                        name,
                        error_message(&text)
                    )))
                }
            }
            status if status.is_success() => {
                let bytes = rsp.bytes().await?;
                tracing::debug!("Downloaded {} bytes from gs://{}/{}", bytes.len(), self.bucket, name);
                Ok(bytes.to_vec())
            }
            status => Err(StorageError::Backend(format!(
                "GCS download of gs://{}/{} returned {status}",
                self.bucket, name
            ))),
        }
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let url = self.upload_url(name)?;
        let rsp = self
            .client
            .post(url)
            .bearer_auth(self.bearer_token().await?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.to_vec())
            .send()
            .await?;

        if !rsp.status().is_success() {
            return Err(StorageError::Backend(format!(
                "GCS upload of gs://{}/{} returned {}",
                self.bucket,
                name,
                rsp.status()
            )));
        }

        tracing::debug!("Uploaded {} bytes to gs://{}/{}", bytes.len(), self.bucket, name);
        Ok(())
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// True only for the "No such object" 404, not for a missing bucket
fn names_missing_object(body: &str) -> bool {
    error_message(body).starts_with("No such object")
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
