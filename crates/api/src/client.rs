//! HTTP client for the Cabinet file server.
//!
//! One method per endpoint. Every call is a single request with no retry;
//! failures map onto [`ApiError`] and are left to the caller to surface.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart;
use url::Url;

use crate::error::ApiError;
use crate::types::{RawEntry, StatusBody, StorageInfo};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Cabinet server endpoints.
///
/// Cheap to clone; the inner reqwest client shares its connection pool.
#[derive(Debug, Clone)]
pub struct FileApiClient {
    base: Url,
    http: reqwest::Client,
}

impl FileApiClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self { base, http })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds an endpoint URL, appending `?folder=` when non-empty.
    fn endpoint(&self, path: &str, folder: &str) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{path}: {e}")))?;
        if !folder.is_empty() {
            url.query_pairs_mut().append_pair("folder", folder);
        }
        Ok(url)
    }

    /// Lists the contents of `folder` (empty string = storage root).
    ///
    /// For subfolders the server prepends a `..` entry pointing at the
    /// parent; it arrives as an ordinary directory record.
    pub async fn list_files(&self, folder: &str) -> Result<Vec<RawEntry>, ApiError> {
        let url = self.endpoint("api/files", folder)?;
        tracing::debug!("Listing folder {:?} via {}", folder, url);

        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp).await?;

        let entries: Vec<RawEntry> = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("listing: {e}")))?;

        tracing::debug!("Listing returned {} entries", entries.len());
        Ok(entries)
    }

    /// Uploads a local file into `folder` under its own file name.
    pub async fn upload_file(&self, local_path: &Path, folder: &str) -> Result<(), ApiError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = std::fs::read(local_path).map_err(|source| ApiError::LocalFile {
            path: local_path.display().to_string(),
            source,
        })?;

        self.upload_bytes(&file_name, data, folder).await
    }

    /// Uploads in-memory bytes as `file_name` into `folder`.
    pub async fn upload_bytes(
        &self,
        file_name: &str,
        data: Vec<u8>,
        folder: &str,
    ) -> Result<(), ApiError> {
        let url = self
            .base
            .join("upload")
            .map_err(|e| ApiError::InvalidBaseUrl(format!("upload: {e}")))?;

        tracing::debug!(
            "Uploading {} ({} bytes) to folder {:?}",
            file_name,
            data.len(),
            folder
        );

        let part = multipart::Part::bytes(data).file_name(file_name.to_string());
        let mut form = multipart::Form::new().part("file", part);
        if !folder.is_empty() {
            form = form.text("folder", folder.to_string());
        }

        let resp = self.http.post(url).multipart(form).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Downloads `name` from `folder` and returns the raw bytes.
    pub async fn download_file(&self, name: &str, folder: &str) -> Result<Bytes, ApiError> {
        let path = format!("download/{}", encode_segment(name));
        let url = self.endpoint(&path, folder)?;
        tracing::debug!("Downloading {} from folder {:?}", name, folder);

        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp).await?;

        resp.bytes()
            .await
            .map_err(|e| ApiError::Decode(format!("download body: {e}")))
    }

    /// Deletes the file `name` inside `folder`.
    pub async fn delete_file(&self, name: &str, folder: &str) -> Result<(), ApiError> {
        let path = format!("delete/{}", encode_segment(name));
        let url = self.endpoint(&path, folder)?;
        tracing::debug!("Deleting file {} in folder {:?}", name, folder);

        let resp = self.http.get(url).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Recursively deletes the folder at `path` (relative to the root).
    pub async fn delete_folder(&self, path: &str) -> Result<(), ApiError> {
        let mut url = self
            .base
            .join("api/delete-folder")
            .map_err(|e| ApiError::InvalidBaseUrl(format!("delete-folder: {e}")))?;
        url.query_pairs_mut().append_pair("path", path);
        tracing::debug!("Deleting folder {:?}", path);

        let resp = self.http.get(url).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Creates folder `name` under `parent` (empty string = root).
    pub async fn create_folder(&self, name: &str, parent: &str) -> Result<(), ApiError> {
        let url = self
            .base
            .join("api/folders")
            .map_err(|e| ApiError::InvalidBaseUrl(format!("folders: {e}")))?;
        tracing::debug!("Creating folder {:?} under {:?}", name, parent);

        let resp = self
            .http
            .post(url)
            .form(&[("name", name), ("parent", parent)])
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Fetches storage usage, scoped to `folder` when non-empty.
    pub async fn storage_info(&self, folder: &str) -> Result<StorageInfo, ApiError> {
        let url = self.endpoint("api/storage", folder)?;

        let resp = self.http.get(url).send().await?;
        let resp = check_status(resp).await?;

        resp.json()
            .await
            .map_err(|e| ApiError::Decode(format!("storage info: {e}")))
    }
}

/// Maps a non-2xx response to [`ApiError::Status`], preferring the `error`
/// field of a JSON body over the raw text.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<StatusBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body
            }
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Percent-encodes a single path segment, keeping unreserved characters.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
