use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

use crate::http_server::SharedState;
use crate::service::payment::service::{
    CreatePaymentParams, ExecutePaymentParams, PaymentIntent, PaymentMethod,
};

use super::response;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    #[serde(deserialize_with = "deserialize_total")]
    pub total: BigDecimal,
    pub currency: String,
    pub method: String,
    pub intent: String,
    pub description: String,
    pub cancel_url: String,
    pub success_url: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutePaymentBody {
    pub payer_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TotalInput {
    Number(serde_json::Number),
    Text(String),
}

/// JSON numbers are parsed from their shortest decimal form, so `2.675`
/// stays `2.675` instead of the nearest binary double.
fn deserialize_total<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match TotalInput::deserialize(deserializer)? {
        TotalInput::Number(n) => n.to_string(),
        TotalInput::Text(s) => s,
    };
    BigDecimal::from_str(raw.trim()).map_err(de::Error::custom)
}

/// Query string PayPal appends to the return url after the user approves.
#[derive(Debug, Deserialize)]
pub struct ApprovalCallbackParams {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "PayerID")]
    pub payer_id: String,
}

pub async fn create_payment(
    State(state): State<SharedState>,
    Json(body): Json<CreatePaymentBody>,
) -> impl IntoResponse {
    let method = match PaymentMethod::from(&body.method) {
        Some(m) => m,
        None => {
            return response::error(StatusCode::BAD_REQUEST, "invalid payment method")
                .into_response()
        }
    };
    let intent = match PaymentIntent::from(&body.intent) {
        Some(i) => i,
        None => {
            return response::error(StatusCode::BAD_REQUEST, "invalid payment intent")
                .into_response()
        }
    };
    let res = state
        .payment_service
        .create_payment(CreatePaymentParams {
            total: body.total,
            currency: body.currency,
            method,
            intent,
            description: body.description,
            cancel_url: body.cancel_url,
            success_url: body.success_url,
            request_id: body.request_id,
        })
        .await;
    match res {
        Ok(payment) => response::success(payment, "").into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn execute_payment(
    State(state): State<SharedState>,
    Path(payment_id): Path<String>,
    Json(body): Json<ExecutePaymentBody>,
) -> impl IntoResponse {
    execute(
        state,
        ExecutePaymentParams {
            payment_id,
            payer_id: body.payer_id,
        },
    )
    .await
}

pub async fn payment_success(
    State(state): State<SharedState>,
    Query(params): Query<ApprovalCallbackParams>,
) -> impl IntoResponse {
    execute(
        state,
        ExecutePaymentParams {
            payment_id: params.payment_id,
            payer_id: params.payer_id,
        },
    )
    .await
}

pub async fn payment_cancel() -> impl IntoResponse {
    response::success((), "payment cancelled").into_response()
}

async fn execute(state: SharedState, params: ExecutePaymentParams) -> axum::response::Response {
    match state.payment_service.execute_payment(params).await {
        Ok(payment) => response::success(payment, "").into_response(),
        Err(err) => err.into_response(),
    }
}
