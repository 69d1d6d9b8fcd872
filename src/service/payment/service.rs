use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use validator::{Validate, ValidationError};

use crate::config::PaypalConfig;

use super::{
    error::PaymentError,
    paypal::{
        Amount, ExecutePaymentRequest, Payer, Payment, PaymentRequest, PaypalProvider,
        RedirectUrls, Transaction,
    },
};

pub const PAYMENT_INTENT_SALE: &str = "sale";
pub const PAYMENT_INTENT_AUTHORIZE: &str = "authorize";
pub const PAYMENT_METHOD_PAYPAL: &str = "paypal";
pub const PAYMENT_METHOD_CREDIT_CARD: &str = "credit_card";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntent {
    Sale,
    Authorize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Paypal,
    CreditCard,
}

impl Display for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentIntent::Sale => write!(f, "{}", PAYMENT_INTENT_SALE),
            PaymentIntent::Authorize => write!(f, "{}", PAYMENT_INTENT_AUTHORIZE),
        }
    }
}

impl PaymentIntent {
    pub fn from(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            PAYMENT_INTENT_SALE => Some(PaymentIntent::Sale),
            PAYMENT_INTENT_AUTHORIZE => Some(PaymentIntent::Authorize),
            _ => None,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Paypal => write!(f, "{}", PAYMENT_METHOD_PAYPAL),
            PaymentMethod::CreditCard => write!(f, "{}", PAYMENT_METHOD_CREDIT_CARD),
        }
    }
}

impl PaymentMethod {
    pub fn from(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            PAYMENT_METHOD_PAYPAL => Some(PaymentMethod::Paypal),
            PAYMENT_METHOD_CREDIT_CARD => Some(PaymentMethod::CreditCard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CreatePaymentParams {
    #[validate(custom(function = "validate_total"))]
    pub total: BigDecimal,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    pub method: PaymentMethod,
    pub intent: PaymentIntent,
    #[validate(length(max = 127))]
    pub description: String,
    #[validate(url)]
    pub cancel_url: String,
    #[validate(url)]
    pub success_url: String,
    /// Sent as `PayPal-Request-Id` so PayPal can deduplicate retried creates.
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExecutePaymentParams {
    pub payment_id: String,
    pub payer_id: String,
}

fn validate_total(total: &BigDecimal) -> Result<(), ValidationError> {
    if total < &BigDecimal::zero() {
        return Err(ValidationError::new("negative_total"));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::new("invalid_currency_code"));
    }
    Ok(())
}

/// Two fraction digits, half away from zero, `.` separator.
pub fn format_amount(total: &BigDecimal) -> String {
    let (digits, scale) = total
        .with_scale_round(2, RoundingMode::HalfUp)
        .as_bigint_and_exponent();
    // zero may come back normalized to scale 0
    let cents = match scale {
        s if s < 2 => digits * BigInt::from(10).pow((2 - s) as u32),
        _ => digits,
    };
    let sign = if cents.sign() == Sign::Minus { "-" } else { "" };
    let magnitude = format!("{:0>3}", cents.magnitude().to_string());
    let (units, fraction) = magnitude.split_at(magnitude.len() - 2);
    format!("{}{}.{}", sign, units, fraction)
}

impl From<&CreatePaymentParams> for PaymentRequest {
    fn from(params: &CreatePaymentParams) -> Self {
        PaymentRequest {
            intent: params.intent,
            payer: Payer {
                payment_method: params.method,
            },
            transactions: vec![Transaction {
                amount: Amount {
                    currency: params.currency.clone(),
                    total: format_amount(&params.total),
                },
                description: params.description.clone(),
            }],
            redirect_urls: RedirectUrls {
                return_url: params.success_url.clone(),
                cancel_url: params.cancel_url.clone(),
            },
        }
    }
}

impl From<ExecutePaymentParams> for ExecutePaymentRequest {
    fn from(params: ExecutePaymentParams) -> Self {
        ExecutePaymentRequest {
            payment_id: params.payment_id,
            payer_id: params.payer_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Service {
    paypal: PaypalProvider,
}

impl Service {
    pub fn new(cfg: &PaypalConfig, http_client: reqwest::Client) -> Result<Self, url::ParseError> {
        let paypal = PaypalProvider::new(cfg, http_client)?;
        Ok(Service { paypal })
    }

    pub async fn create_payment(
        &self,
        params: CreatePaymentParams,
    ) -> Result<Payment, PaymentError> {
        params.validate()?;
        let request = PaymentRequest::from(&params);
        let payment = self
            .paypal
            .create_payment(&request, params.request_id.as_deref())
            .await;
        match &payment {
            Ok(p) => tracing::info!(
                payment_id = %p.id,
                intent = %params.intent,
                total = %request.transactions[0].amount.total,
                currency = %params.currency,
                "payment created"
            ),
            Err(e) => tracing::error!("cannot create_payment due to err: {}", e),
        }
        payment
    }

    pub async fn execute_payment(
        &self,
        params: ExecutePaymentParams,
    ) -> Result<Payment, PaymentError> {
        let request = ExecutePaymentRequest::from(params);
        let payment = self.paypal.execute_payment(&request).await;
        match &payment {
            Ok(p) => tracing::info!(
                payment_id = %p.id,
                state = p.state.as_deref().unwrap_or_default(),
                "payment executed"
            ),
            Err(e) => tracing::error!(
                "cannot execute_payment {} due to err: {}",
                request.payment_id,
                e
            ),
        }
        payment
    }
}
