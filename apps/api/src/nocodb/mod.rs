/// NocoDB client: record listing for prompt metadata and file upload for
/// generated images.
///
/// Authenticates with the `xc-token` header. Each call is a single attempt
/// with its own timeout; callers treat any error as "feature unavailable".
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::NocoDbSettings;

const TOKEN_HEADER: &str = "xc-token";
const LIST_TIMEOUT: Duration = Duration::from_secs(20);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum NocoDbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    list: Vec<Value>,
}

#[derive(Clone)]
pub struct NocoDbClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl NocoDbClient {
    pub fn new(settings: &NocoDbSettings) -> Result<Self, NocoDbError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
        })
    }

    /// GET /api/v2/tables/{table_id}/records, returning the raw `list` rows.
    pub async fn list_records(&self, table_id: &str) -> Result<Vec<Value>, NocoDbError> {
        let url = format!("{}/api/v2/tables/{}/records", self.base_url, table_id);
        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let records: RecordList = serde_json::from_str(&body)?;
        debug!("NocoDB table {table_id} returned {} records", records.list.len());
        Ok(records.list)
    }

    /// POST /api/v2/storage/upload as a multipart `file` part, PNG content type.
    /// Returns the parsed response body.
    pub async fn upload_bytes(&self, filename: &str, content: Vec<u8>) -> Result<Value, NocoDbError> {
        let url = format!("{}/api/v2/storage/upload", self.base_url);
        let size = content.len();
        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str("image/png")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        debug!("Uploaded {filename} ({size} bytes) to NocoDB storage");
        Ok(serde_json::from_str(&body)?)
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, NocoDbError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("msg").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        return Err(NocoDbError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}
