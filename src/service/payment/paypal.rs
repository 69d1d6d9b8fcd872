use chrono::{DateTime, Utc};
use reqwest::{header, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::config::PaypalConfig;

use super::{
    error::{ErrorResponse, PaymentError, ProviderDiagnostic},
    service::{PaymentIntent, PaymentMethod},
};

pub const OAUTH_TOKEN_URI: &str = "/v1/oauth2/token";
pub const PAYMENT_URI: &str = "/v1/payments/payment";
pub const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";
pub const APPROVAL_URL_REL: &str = "approval_url";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub intent: PaymentIntent,
    pub payer: Payer,
    pub transactions: Vec<Transaction>,
    pub redirect_urls: RedirectUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Amount,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutePaymentRequest {
    /// Goes into the request path, never into the body.
    #[serde(skip)]
    pub payment_id: String,
    pub payer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Payment resource as PayPal returns it. Fields without a typed accessor
/// are kept in `extra` so the payload survives a round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Payment {
    /// Where the end user must be sent to approve a created payment.
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == APPROVAL_URL_REL)
            .map(|l| l.href.as_str())
    }

    /// `None` when absent or not RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(self.create_time.as_deref())
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        parse_time(self.update_time.as_deref())
    }
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Clone, Debug)]
pub struct PaypalProvider {
    http_client: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
}

impl PaypalProvider {
    pub fn new(cfg: &PaypalConfig, http_client: reqwest::Client) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(cfg.base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(PaypalProvider {
            http_client,
            base_url,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
        })
    }

    pub async fn create_payment(
        &self,
        req: &PaymentRequest,
        request_id: Option<&str>,
    ) -> Result<Payment, PaymentError> {
        let token = self.get_access_token().await?;
        let mut builder = self
            .http_client
            .post(self.endpoint(PAYMENT_URI, &[]))
            .bearer_auth(token)
            .json(req);
        if let Some(request_id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        let res = builder.send().await?;
        parse_response(res).await
    }

    pub async fn execute_payment(
        &self,
        req: &ExecutePaymentRequest,
    ) -> Result<Payment, PaymentError> {
        let token = self.get_access_token().await?;
        let res = self
            .http_client
            .post(self.endpoint(PAYMENT_URI, &[req.payment_id.as_str(), "execute"]))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        parse_response(res).await
    }

    async fn get_access_token(&self) -> Result<String, PaymentError> {
        let res = self
            .http_client
            .post(self.endpoint(OAUTH_TOKEN_URI, &[]))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: AccessTokenResponse = parse_response(res).await?;
        Ok(token.access_token)
    }

    fn endpoint(&self, uri: &str, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base urls are rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(uri.split('/').filter(|s| !s.is_empty()))
                .extend(segments);
        }
        url
    }
}

async fn parse_response<T: DeserializeOwned>(res: Response) -> Result<T, PaymentError> {
    let status = res.status();
    let body = res.bytes().await?;
    if !status.is_success() {
        let diagnostic = match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(e) => ProviderDiagnostic::Api(e),
            Err(_) => ProviderDiagnostic::Raw(String::from_utf8_lossy(&body).into_owned()),
        };
        tracing::error!("paypal responded with status {}: {}", status, diagnostic);
        return Err(PaymentError::ProviderRequestFailed {
            status: Some(status.as_u16()),
            diagnostic,
        });
    }
    serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("cannot decode paypal response due to err: {}", e);
        PaymentError::ProviderRequestFailed {
            status: Some(status.as_u16()),
            diagnostic: ProviderDiagnostic::Decode(e.to_string()),
        }
    })
}
