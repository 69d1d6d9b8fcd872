use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum PaymentError {
    #[snafu(display("invalid payment params: {message}"))]
    InvalidParams { message: String },
    #[snafu(display("provider request failed: {diagnostic}"))]
    ProviderRequestFailed {
        status: Option<u16>,
        diagnostic: ProviderDiagnostic,
    },
}

/// What the provider (or the transport in front of it) reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderDiagnostic {
    Api(ErrorResponse),
    Raw(String),
    Decode(String),
    Transport(String),
}

/// PayPal error body. Payment endpoints fill `name`/`message`, the OAuth
/// endpoint fills `error`/`error_description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
}

impl Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .name
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("UNKNOWN_ERROR");
        write!(f, "{}", name)?;
        if let Some(message) = self.message.as_deref().or(self.error_description.as_deref()) {
            write!(f, ": {}", message)?;
        }
        for detail in &self.details {
            match (&detail.field, &detail.issue) {
                (Some(field), Some(issue)) => write!(f, "; {}: {}", field, issue)?,
                (None, Some(issue)) => write!(f, "; {}", issue)?,
                _ => {}
            }
        }
        if let Some(debug_id) = &self.debug_id {
            write!(f, " (debug_id {})", debug_id)?;
        }
        Ok(())
    }
}

impl Display for ProviderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderDiagnostic::Api(e) => write!(f, "{}", e),
            ProviderDiagnostic::Raw(body) => write!(f, "unexpected response body: {}", body),
            ProviderDiagnostic::Decode(e) => write!(f, "cannot decode response: {}", e),
            ProviderDiagnostic::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(e: reqwest::Error) -> Self {
        PaymentError::ProviderRequestFailed {
            status: e.status().map(|s| s.as_u16()),
            diagnostic: ProviderDiagnostic::Transport(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for PaymentError {
    fn from(e: validator::ValidationErrors) -> Self {
        PaymentError::InvalidParams {
            message: e.to_string(),
        }
    }
}
