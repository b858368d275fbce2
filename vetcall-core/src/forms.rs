//! Request and response payloads exchanged with the backend

use crate::error::VetCallError;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Registration form contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plain-text password, hashed by the backend
    pub password: String,
    /// Phone number
    pub phone: String,
}

/// Login form contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Image attached to a symptom report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// File name sent with the multipart part
    pub file_name: String,
    /// MIME type of the image
    pub content_type: String,
    /// Raw file contents
    pub bytes: Bytes,
}

impl ImageAttachment {
    /// Create an attachment from in-memory bytes
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image file from disk, guessing its content type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, VetCallError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| VetCallError::InvalidData {
                reason: format!("cannot read {}: {}", path.display(), e),
            })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes: Bytes::from(bytes),
        })
    }
}

/// Symptom report form contents, sent as multipart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportForm {
    /// Free-text symptom description
    pub symptoms: String,
    /// Photo of the animal
    pub image: ImageAttachment,
}

/// Generic `{success, message?}` response returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the backend accepted the request
    pub success: bool,
    /// Failure reason when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response to OTP issue and resend requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpResponse {
    /// Whether an OTP was issued
    pub success: bool,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Issued code, echoed back by the backend
    #[serde(rename = "otpCode", default, skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
}

/// Hospital directory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    /// Database id
    pub id: i64,
    /// Hospital name
    pub name: String,
    /// Street address
    pub address: String,
    /// Contact phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Latitude in degrees
    #[serde(default, deserialize_with = "coordinate")]
    pub latitude: Option<f64>,
    /// Longitude in degrees
    #[serde(default, deserialize_with = "coordinate")]
    pub longitude: Option<f64>,
}

/// Medicine directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    /// Database id
    pub id: i64,
    /// Medicine name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Indications
    #[serde(default)]
    pub uses: Option<String>,
    /// Known side effects
    #[serde(default)]
    pub side_effects: Option<String>,
}

/// Request for a video-call token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCallTokenRequest {
    /// Channel both parties join
    #[serde(rename = "channelName")]
    pub channel_name: String,
    /// Caller id; the backend picks a random one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
}

/// Video-call token issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCallToken {
    /// Whether a token was issued
    pub success: bool,
    /// Token for the requested channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Stored symptom report as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Database id
    pub id: i64,
    /// Submitting user
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Report category
    #[serde(default)]
    pub report_type: Option<String>,
    /// Symptom description
    #[serde(default)]
    pub description: Option<String>,
    /// Review status
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time as rendered by the backend (HTTP date)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update time as rendered by the backend (HTTP date)
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Assistant reply to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Reply text
    pub response: String,
}

// Decimal columns come back as strings from some backends and as numbers from others.
fn coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
