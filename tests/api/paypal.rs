use std::str::FromStr;

use bigdecimal::BigDecimal;
use claims::{assert_err, assert_matches, assert_ok};
use paypal_payments::service::payment::{
    error::{PaymentError, ProviderDiagnostic},
    paypal::{Payment, PAYMENT_URI, REQUEST_ID_HEADER},
    service::{CreatePaymentParams, ExecutePaymentParams, PaymentIntent, PaymentMethod},
};
use serde_json::json;
use wiremock::{
    matchers::{bearer_token, body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::helpers::{
    approved_payment, created_payment, execute_uri, mount_access_token, payment_service,
    test_settings, APPROVAL_URL, PAYER_ID, PAYMENT_ID,
};

fn create_params() -> CreatePaymentParams {
    CreatePaymentParams {
        total: BigDecimal::from_str("9.999").unwrap(),
        currency: "USD".to_string(),
        method: PaymentMethod::Paypal,
        intent: PaymentIntent::Sale,
        description: "1 month plan".to_string(),
        cancel_url: "https://shop.test/pay/cancel".to_string(),
        success_url: "https://shop.test/pay/success".to_string(),
        request_id: None,
    }
}

fn execute_params() -> ExecutePaymentParams {
    ExecutePaymentParams {
        payment_id: PAYMENT_ID.to_string(),
        payer_id: PAYER_ID.to_string(),
    }
}

#[tokio::test]
async fn create_payment_sends_request_and_returns_provider_payment() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(PAYMENT_URI))
        .and(method("POST"))
        .and(bearer_token(crate::helpers::ACCESS_TOKEN))
        .and(body_json(json!({
            "intent": "sale",
            "payer": { "payment_method": "paypal" },
            "transactions": [{
                "amount": { "currency": "USD", "total": "10.00" },
                "description": "1 month plan"
            }],
            "redirect_urls": {
                "return_url": "https://shop.test/pay/success",
                "cancel_url": "https://shop.test/pay/cancel"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let payment = service
        .create_payment(create_params())
        .await
        .expect("payment should be created");

    assert_eq!(payment.id, PAYMENT_ID);
    assert_eq!(payment.state.as_deref(), Some("created"));
    assert_eq!(payment.approval_url(), Some(APPROVAL_URL));
    assert_eq!(serde_json::to_value(&payment).unwrap(), created_payment());
}

#[tokio::test]
async fn create_payment_forwards_request_id() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(PAYMENT_URI))
        .and(method("POST"))
        .and(header(REQUEST_ID_HEADER, "order-42"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let mut params = create_params();
    params.request_id = Some("order-42".to_string());
    assert_ok!(service.create_payment(params).await);
}

#[tokio::test]
async fn create_payment_with_invalid_params_never_reaches_provider() {
    let server = MockServer::start().await;
    let service = payment_service(&test_settings(server.uri()).paypal);

    let mut negative = create_params();
    negative.total = BigDecimal::from_str("-1").unwrap();
    let mut bad_currency = create_params();
    bad_currency.currency = "dollars".to_string();
    let mut bad_url = create_params();
    bad_url.success_url = "/pay/success".to_string();

    for params in [negative, bad_currency, bad_url] {
        let err = assert_err!(service.create_payment(params).await);
        assert_matches!(err, PaymentError::InvalidParams { .. });
    }
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn create_payment_propagates_provider_rejection_without_retry() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(PAYMENT_URI))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "name": "VALIDATION_ERROR",
            "message": "Invalid request - see details",
            "debug_id": "5ab2b4b1c1af2",
            "details": [{ "field": "transactions[0].amount.currency", "issue": "Currency is not supported" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let err = assert_err!(service.create_payment(create_params()).await);
    match err {
        PaymentError::ProviderRequestFailed {
            status,
            diagnostic: ProviderDiagnostic::Api(body),
        } => {
            assert_eq!(status, Some(400));
            assert_eq!(body.name.as_deref(), Some("VALIDATION_ERROR"));
            assert_eq!(body.debug_id.as_deref(), Some("5ab2b4b1c1af2"));
            assert_eq!(body.details.len(), 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn failed_token_exchange_aborts_the_call() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/oauth2/token"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Client Authentication failed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path(PAYMENT_URI))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(0)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let err = assert_err!(service.create_payment(create_params()).await);
    let message = err.to_string();
    assert_matches!(
        err,
        PaymentError::ProviderRequestFailed { status: Some(401), diagnostic: ProviderDiagnostic::Api(ref body) }
            if body.error.as_deref() == Some("invalid_client")
    );
    assert_eq!(
        message,
        "provider request failed: invalid_client: Client Authentication failed"
    );
}

#[tokio::test]
async fn execute_payment_sends_only_payer_id() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(execute_uri(PAYMENT_ID)))
        .and(method("POST"))
        .and(bearer_token(crate::helpers::ACCESS_TOKEN))
        .and(body_json(json!({ "payer_id": PAYER_ID })))
        .respond_with(ResponseTemplate::new(200).set_body_json(approved_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let payment = service
        .execute_payment(execute_params())
        .await
        .expect("payment should be executed");

    assert_eq!(payment.state.as_deref(), Some("approved"));
    assert!(payment.updated_at().is_some());
    let expected: Payment = serde_json::from_value(approved_payment()).unwrap();
    assert_eq!(payment, expected);
}

#[tokio::test]
async fn execute_payment_propagates_server_error_without_retry() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(execute_uri(PAYMENT_ID)))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>service unavailable</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let err = assert_err!(service.execute_payment(execute_params()).await);
    assert_matches!(
        err,
        PaymentError::ProviderRequestFailed { status: Some(503), diagnostic: ProviderDiagnostic::Raw(ref body) }
            if body == "<html>service unavailable</html>"
    );
}

#[tokio::test]
async fn unexpected_success_body_is_reported() {
    let server = MockServer::start().await;
    mount_access_token(&server).await;
    Mock::given(path(execute_uri(PAYMENT_ID)))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let service = payment_service(&test_settings(server.uri()).paypal);
    let err = assert_err!(service.execute_payment(execute_params()).await);
    assert_matches!(
        err,
        PaymentError::ProviderRequestFailed { status: Some(200), diagnostic: ProviderDiagnostic::Decode(_) }
    );
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_failure() {
    // nothing listens on a port released right after binding
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let service = payment_service(&test_settings(uri).paypal);
    let err = assert_err!(service.execute_payment(execute_params()).await);
    assert_matches!(
        err,
        PaymentError::ProviderRequestFailed { status: None, diagnostic: ProviderDiagnostic::Transport(_) }
    );
}
