//! Cloud-drive backend
//!
//! Talks to a Google-Drive-style REST API: metadata by id, `alt=media`
//! download, multipart/related upload for create, and media PATCH for
//! replace. A replace that answers 404 falls back to creating a fresh file.

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RemoteFileHandle, RemoteStore};
use crate::error::{SyncError, SyncResult};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FILE_FIELDS: &str = "id,name,modifiedTime,size";

/// File resource as the drive API reports it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    name: String,
    #[serde(default)]
    modified_time: Option<String>,
    /// The API reports size as a decimal string
    #[serde(default)]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
}

/// Parse an RFC 3339 modification time into epoch milliseconds
fn parse_modified(raw: Option<&str>) -> u64 {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0)
}

impl FileResource {
    fn into_handle(self) -> RemoteFileHandle {
        RemoteFileHandle {
            modified_at: parse_modified(self.modified_time.as_deref()),
            size: self.size.and_then(|s| s.parse().ok()),
            id: self.id,
            name: self.name,
        }
    }
}

/// Build a multipart/related body carrying file metadata and content
fn multipart_related(boundary: &str, metadata_json: &str, body: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{b}\r\nContent-Type: application/json\r\n\r\n{body}\r\n--{b}--",
        b = boundary,
        meta = metadata_json,
        body = body
    )
}

/// Cloud-drive remote store
#[derive(Debug)]
pub struct DriveStore {
    client: reqwest::Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl DriveStore {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Point the adapter at a different API host (tests, proxies)
    pub fn with_base(mut self, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    async fn get(&self, url: &str) -> SyncResult<reqwest::Response> {
        Ok(self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?)
    }

    /// Create a new file via multipart upload
    async fn create(&self, name: &str, body: &str, description: &str) -> SyncResult<RemoteFileHandle> {
        let boundary = format!("pagesync-{}", uuid::Uuid::new_v4());
        let metadata = serde_json::json!({
            "name": name,
            "description": description,
            "mimeType": "application/json",
        })
        .to_string();
        let payload = multipart_related(&boundary, &metadata, body);

        let url = format!(
            "{}/files?uploadType=multipart&fields={}",
            self.upload_base, FILE_FIELDS
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "file create", body));
        }

        let resource: FileResource = response.json().await?;
        debug!("Created drive file {}", resource.id);
        Ok(resource.into_handle())
    }

    /// Replace an existing file's media content in place
    async fn replace(&self, file_id: &str, body: &str) -> SyncResult<RemoteFileHandle> {
        let url = format!(
            "{}/files/{}?uploadType=media&fields={}",
            self.upload_base, file_id, FILE_FIELDS
        );
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "file replace", body));
        }

        let resource: FileResource = response.json().await?;
        Ok(resource.into_handle())
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn metadata(&self, file_id: &str) -> SyncResult<Option<RemoteFileHandle>> {
        let url = format!(
            "{}/files/{}?fields={}",
            self.api_base, file_id, FILE_FIELDS
        );
        let response = self.get(&url).await?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "metadata fetch", body));
        }

        let resource: FileResource = response.json().await?;
        Ok(Some(resource.into_handle()))
    }

    async fn search_by_name(&self, name: &str) -> SyncResult<Vec<RemoteFileHandle>> {
        // Single quotes in names would break the query expression
        let escaped = name.replace('\'', "\\'");
        let query = format!("name = '{}' and trashed = false", escaped);
        let url = format!(
            "{}/files?q={}&orderBy=modifiedTime desc&fields=files({})",
            self.api_base,
            urlencode(&query),
            FILE_FIELDS
        );
        let response = self.get(&url).await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "file search", body));
        }

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().map(FileResource::into_handle).collect())
    }

    async fn download(&self, file_id: &str) -> SyncResult<String> {
        let url = format!("{}/files/{}?alt=media", self.api_base, file_id);
        let response = self.get(&url).await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, "file download", body));
        }

        Ok(response.text().await?)
    }

    async fn upload(
        &self,
        file_id: Option<&str>,
        name: &str,
        body: &str,
        description: &str,
    ) -> SyncResult<RemoteFileHandle> {
        if let Some(id) = file_id {
            match self.replace(id, body).await {
                Ok(handle) => return Ok(handle),
                Err(SyncError::NotFound { .. }) => {
                    // The known id no longer resolves; create a fresh file
                    warn!("Drive file {} is gone, creating a new one", id);
                }
                Err(e) => return Err(e),
            }
        }
        self.create(name, body, description).await
    }
}

/// Minimal percent-encoding for query expressions
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
