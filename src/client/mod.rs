//! HTTP client for the patient record server
//!
//! Wraps the three server endpoints for the upload and monitor sides, plus
//! the base64 blob codec both of them use for image bytes. The server never
//! decodes blobs; encoding and decoding happen here at the edges.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::api::rest::IdListing;
use crate::protocol::{PatientReport, UpdateRequest};

#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or a non-success response from the server. Carries
    /// the server's message where one was returned.
    Http(String),
    Decode(String),
    Io(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(msg) => write!(f, "Request failed: {}", msg),
            ClientError::Decode(msg) => write!(f, "Failed to decode response: {}", msg),
            ClientError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Http(error.to_string())
    }
}

pub struct PatientClient {
    base_url: String,
    http: reqwest::Client,
}

impl PatientClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        PatientClient {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Posts one registration/upload request; returns the server's message.
    ///
    /// A 400 from the server (missing or non-integer record number) comes
    /// back as `ClientError::Http` carrying the server's validation message.
    pub async fn add_patient(&self, request: &UpdateRequest) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/new_patient", self.base_url))
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Http(format!("{}: {}", status, body)));
        }
        Ok(body)
    }

    /// Fetches every medical record number stored on the server.
    pub async fn patient_ids(&self) -> Result<Vec<i64>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/get_patient", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        let listing: IdListing = resp.json().await?;
        Ok(listing.ids)
    }

    /// Fetches one patient's full record.
    pub async fn patient(&self, id: i64) -> Result<PatientReport, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/get_patient/{}", self.base_url, id))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(ClientError::Http(format!("{}: {}", status, body)));
        }
        let report = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(report)
    }
}

/// The most recent ECG observation of a patient report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatestEcg {
    pub name: String,
    pub id: i64,
    pub ecg_image: String,
    pub heart_rate: i64,
    pub timestamp: String,
}

/// Picks the last entry of each paired history; `None` if the patient has
/// no ECG uploads yet.
pub fn latest_ecg(report: &PatientReport) -> Option<LatestEcg> {
    let ecg_image = report.ecg_image.last()?;
    let heart_rate = report.heart_rate.last()?;
    let timestamp = report.timestamp.last()?;
    Some(LatestEcg {
        name: report.name.clone(),
        id: report.id,
        ecg_image: ecg_image.clone(),
        heart_rate: *heart_rate,
        timestamp: timestamp.clone(),
    })
}

/// Encodes raw image bytes as the base64 text the server stores.
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a stored base64 blob back to image bytes.
pub fn decode_image(b64: &str) -> Result<Vec<u8>, ClientError> {
    STANDARD
        .decode(b64)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Reads an image file and encodes it for upload.
pub fn load_image(path: &Path) -> Result<String, ClientError> {
    let bytes = fs::read(path).map_err(|e| ClientError::Io(e.to_string()))?;
    Ok(encode_image(&bytes))
}

/// Decodes a stored blob and writes it to `path`.
pub fn save_image(b64: &str, path: &Path) -> Result<(), ClientError> {
    let bytes = decode_image(b64)?;
    fs::write(path, bytes).map_err(|e| ClientError::Io(e.to_string()))
}
