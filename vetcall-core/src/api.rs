//! HTTP client for the portal backend
//!
//! The backend reports rejected requests with a 4xx status *and* a JSON
//! `{success: false, message}` body, so responses are decoded regardless of
//! status. Only transport failures and undecodable bodies surface as
//! [`VetCallError::Request`].

use crate::error::VetCallError;
use crate::forms::{
    ApiResponse, ChatReply, Hospital, LoginForm, Medicine, OtpResponse, RegistrationForm, Report,
    ReportForm, VideoCallToken, VideoCallTokenRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Endpoint paths used by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    /// Account registration
    pub register: String,
    /// Login
    pub login: String,
    /// Symptom report upload
    pub report: String,
    /// Issue a one-time password
    pub request_otp: String,
    /// Verify a one-time password
    pub verify_otp: String,
    /// Re-issue a one-time password for the current session
    pub resend_otp: String,
    /// Hospital directory
    pub hospitals: String,
    /// Medicine directory
    pub medicines: String,
    /// Stored symptom reports
    pub reports: String,
    /// Video-call token issue
    pub video_call_token: String,
    /// Assistant chat
    pub chat: String,
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self {
            register: "/api/register".to_string(),
            login: "/api/login".to_string(),
            report: "/api/report".to_string(),
            request_otp: "/request_otp".to_string(),
            verify_otp: "/verify_otp".to_string(),
            resend_otp: "/resend_otp".to_string(),
            hospitals: "/get_hospitals".to_string(),
            medicines: "/get_medicines".to_string(),
            reports: "/get_reports".to_string(),
            video_call_token: "/get_video_call_token".to_string(),
            chat: "/chat".to_string(),
        }
    }
}

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the routes are appended to, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Endpoint paths
    pub routes: ApiRoutes,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(10),
            routes: ApiRoutes::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Client for the portal backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: ClientConfig,
}

impl BackendClient {
    /// Create a client; keeps a cookie store so OTP session state survives between calls
    pub fn new(config: ClientConfig) -> Result<Self, VetCallError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| VetCallError::Initialization {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a registration
    pub async fn register(&self, form: &RegistrationForm) -> Result<ApiResponse, VetCallError> {
        let endpoint = &self.config.routes.register;
        info!("📝 Registering account for {}", form.email);
        self.send(endpoint, self.request(Method::POST, endpoint).json(form))
            .await
    }

    /// Submit a login
    pub async fn login(&self, form: &LoginForm) -> Result<ApiResponse, VetCallError> {
        let endpoint = &self.config.routes.login;
        info!("🔑 Logging in as {}", form.email);
        self.send(endpoint, self.request(Method::POST, endpoint).json(form))
            .await
    }

    /// Upload a symptom report with its image
    pub async fn submit_report(&self, form: &ReportForm) -> Result<ApiResponse, VetCallError> {
        let endpoint = &self.config.routes.report;
        let image = Part::bytes(form.image.bytes.to_vec())
            .file_name(form.image.file_name.clone())
            .mime_str(&form.image.content_type)
            .map_err(|e| VetCallError::InvalidData {
                reason: format!("invalid image content type {}: {}", form.image.content_type, e),
            })?;
        let body = Form::new()
            .text("symptoms", form.symptoms.clone())
            .part("image", image);

        info!(
            "🩺 Submitting report with image {} ({} bytes)",
            form.image.file_name,
            form.image.bytes.len()
        );
        self.send(endpoint, self.request(Method::POST, endpoint).multipart(body))
            .await
    }

    /// Ask the backend to email a one-time password
    pub async fn request_otp(&self, email: &str) -> Result<OtpResponse, VetCallError> {
        let endpoint = &self.config.routes.request_otp;
        self.send(
            endpoint,
            self.request(Method::POST, endpoint)
                .json(&json!({ "email": email })),
        )
        .await
    }

    /// Check a one-time password against the one issued for this session
    pub async fn verify_otp(&self, otp: &str) -> Result<ApiResponse, VetCallError> {
        let endpoint = &self.config.routes.verify_otp;
        self.send(
            endpoint,
            self.request(Method::POST, endpoint).json(&json!({ "otp": otp })),
        )
        .await
    }

    /// Re-issue the one-time password for this session
    pub async fn resend_otp(&self) -> Result<OtpResponse, VetCallError> {
        let endpoint = &self.config.routes.resend_otp;
        self.send(endpoint, self.request(Method::POST, endpoint).json(&json!({})))
            .await
    }

    /// Fetch the hospital directory
    pub async fn hospitals(&self) -> Result<Vec<Hospital>, VetCallError> {
        let endpoint = &self.config.routes.hospitals;
        self.send(endpoint, self.request(Method::GET, endpoint)).await
    }

    /// Fetch the medicine directory
    pub async fn medicines(&self) -> Result<Vec<Medicine>, VetCallError> {
        let endpoint = &self.config.routes.medicines;
        self.send(endpoint, self.request(Method::GET, endpoint)).await
    }

    /// List stored symptom reports
    pub async fn reports(&self) -> Result<Vec<Report>, VetCallError> {
        let endpoint = &self.config.routes.reports;
        self.send(endpoint, self.request(Method::GET, endpoint)).await
    }

    /// Fetch a token for joining `request.channel_name`
    pub async fn video_call_token(
        &self,
        request: &VideoCallTokenRequest,
    ) -> Result<VideoCallToken, VetCallError> {
        let endpoint = &self.config.routes.video_call_token;
        info!("🎟️ Requesting video call token for channel {}", request.channel_name);
        self.send(endpoint, self.request(Method::POST, endpoint).json(request))
            .await
    }

    /// Send a message to the assistant
    pub async fn chat(&self, message: &str) -> Result<ChatReply, VetCallError> {
        let endpoint = &self.config.routes.chat;
        self.send(
            endpoint,
            self.request(Method::POST, endpoint)
                .json(&json!({ "message": message })),
        )
        .await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client.request(method, url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, VetCallError> {
        let response = request.send().await.map_err(|e| VetCallError::Request {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        debug!("Backend answered {} with {}", endpoint, status);

        let body = response.bytes().await.map_err(|e| VetCallError::Request {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| VetCallError::Request {
            endpoint: endpoint.to_string(),
            reason: format!("HTTP {} with undecodable body: {}", status, e),
        })
    }
}
