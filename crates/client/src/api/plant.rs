//! Plant photo analysis endpoint.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::{debug, error, instrument};

use super::{ApiClient, truncate_body};
use crate::error::{ApiError, Result};
use crate::plant::{PlantAnalysisResult, normalize};

/// File name the backend expects on the uploaded photo.
const UPLOAD_FILE_NAME: &str = "plant.jpg";

impl ApiClient {
    /// Upload a photo from disk for analysis.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Io` if the file cannot be read, otherwise the same
    /// errors as [`ApiClient::analyze_plant_bytes`].
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn analyze_plant_image(&self, path: &Path) -> Result<PlantAnalysisResult> {
        let bytes = tokio::fs::read(path).await?;
        self.analyze_plant_bytes(bytes).await
    }

    /// Upload JPEG bytes for analysis and normalize the answer.
    ///
    /// A success body that is not JSON is normalized as text, so the call
    /// only fails on transport errors or a non-success status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` carrying the response text (or
    /// "Plant analyze request failed") on a non-success status, or
    /// `ApiError::Network` if the upload fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn analyze_plant_bytes(&self, bytes: Vec<u8>) -> Result<PlantAnalysisResult> {
        let part = Part::bytes(bytes)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("image/jpeg")?;
        let form = Form::new().part("file", part);

        let response = self
            .request(Method::POST, "/plant/analyze", false)
            .await
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(status = %status, body = %truncate_body(&text), "Plant analysis failed");
            let message = if text.trim().is_empty() {
                "Plant analyze request failed".to_string()
            } else {
                text
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let raw: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|e| {
            debug!(error = %e, "Plant analysis body is not JSON, normalizing as text");
            serde_json::Value::String(text)
        });
        Ok(normalize(raw))
    }
}
