//! Form submission handlers
//!
//! Each handler is a pass-through: send the form, then either alert and
//! navigate on success or alert with the backend's message on rejection.

use crate::config::NavigationConfig;
use crate::notifier::Notifier;
use std::sync::Arc;
use tracing::{error, info, warn};
use vetcall_core::{ApiResponse, BackendClient, LoginForm, RegistrationForm, ReportForm, VetCallError};

/// Result of a form submission the backend answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Backend reported success
    Accepted,
    /// Backend reported failure
    Rejected {
        /// Backend's reason, if it gave one
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Copy)]
enum FormAction {
    Registration,
    Login,
    Report,
}

impl FormAction {
    fn success_message(self) -> &'static str {
        match self {
            FormAction::Registration => "Registration successful!",
            FormAction::Login => "Login successful!",
            FormAction::Report => "Report submitted successfully!",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            FormAction::Registration => "Registration failed",
            FormAction::Login => "Login failed",
            FormAction::Report => "Report submission failed",
        }
    }

    fn next_page(self, navigation: &NavigationConfig) -> Option<&str> {
        match self {
            FormAction::Registration => Some(navigation.after_registration.as_str()),
            FormAction::Login => Some(navigation.after_login.as_str()),
            FormAction::Report => None,
        }
    }
}

/// Form handlers for the portal pages
pub struct Portal {
    client: BackendClient,
    notifier: Arc<dyn Notifier>,
    navigation: NavigationConfig,
}

impl Portal {
    /// Create new portal
    pub fn new(client: BackendClient, notifier: Arc<dyn Notifier>, navigation: NavigationConfig) -> Self {
        Self {
            client,
            notifier,
            navigation,
        }
    }

    /// Backend client used by the handlers
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Registration form submit
    pub async fn submit_registration(&self, form: &RegistrationForm) -> Result<FormOutcome, VetCallError> {
        let result = self.client.register(form).await;
        self.conclude(FormAction::Registration, result)
    }

    /// Login form submit
    pub async fn submit_login(&self, form: &LoginForm) -> Result<FormOutcome, VetCallError> {
        let result = self.client.login(form).await;
        self.conclude(FormAction::Login, result)
    }

    /// Symptom report form submit
    pub async fn submit_report(&self, form: &ReportForm) -> Result<FormOutcome, VetCallError> {
        let result = self.client.submit_report(form).await;
        self.conclude(FormAction::Report, result)
    }

    /// Video-call request form submit
    pub fn request_video_call(&self, vet: &str) {
        info!("Video call requested with {}", vet);
        self.notifier
            .alert(&format!("Starting a video call with {}", vet));
    }

    fn conclude(
        &self,
        action: FormAction,
        result: Result<ApiResponse, VetCallError>,
    ) -> Result<FormOutcome, VetCallError> {
        match result {
            Ok(response) if response.success => {
                info!("{}", action.success_message());
                self.notifier.alert(action.success_message());
                if let Some(page) = action.next_page(&self.navigation) {
                    self.notifier.navigate(page);
                }
                Ok(FormOutcome::Accepted)
            }
            Ok(response) => {
                let reason = response.message.as_deref().unwrap_or("unknown error");
                warn!("{}: {}", action.failure_prefix(), reason);
                self.notifier
                    .alert(&format!("{}: {}", action.failure_prefix(), reason));
                Ok(FormOutcome::Rejected {
                    message: response.message,
                })
            }
            Err(e) => {
                error!("{}: {}", action.failure_prefix(), e);
                self.notifier
                    .alert(&format!("{}: {}", action.failure_prefix(), e));
                Err(e)
            }
        }
    }
}
