#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use mpesa_client::{
    DispatchRequest, FixedClock, GatewayClient, GatewayConfig, GatewayError, GatewayResponse,
    Operation, Payload, StatusCode, TokenOptions, TokenRequest, Transport, acquire_token_with,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

const FIXED_TIMESTAMP: &str = "20240102030405";

/// Transport double that records every request and answers with a canned
/// response.
struct RecordingTransport {
    dispatched: Mutex<Vec<DispatchRequest>>,
    tokens: Mutex<Vec<TokenRequest>>,
    token_status: StatusCode,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Self::with_token_status(StatusCode::OK)
    }

    fn with_token_status(token_status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            dispatched: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            token_status,
        })
    }

    fn dispatch_count(&self) -> usize {
        self.dispatched.lock().unwrap().len()
    }

    fn last_payload(&self) -> Value {
        let dispatched = self.dispatched.lock().unwrap();
        Value::Object(dispatched.last().expect("no request dispatched").payload().clone())
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn dispatch(&self, request: DispatchRequest) -> Result<GatewayResponse, GatewayError> {
        self.dispatched.lock().unwrap().push(request);
        GatewayResponse::from_json(
            StatusCode::OK,
            &json!({"ResponseCode": "0", "ResponseDescription": "Accept the service request successfully."}),
        )
    }

    async fn fetch_token(&self, request: TokenRequest) -> Result<GatewayResponse, GatewayError> {
        self.tokens.lock().unwrap().push(request);
        if self.token_status == StatusCode::OK {
            GatewayResponse::from_json(StatusCode::OK, &json!({"access_token": "abc123", "expires_in": "3599"}))
        } else {
            GatewayResponse::from_json(
                self.token_status,
                &json!({"errorCode": "400.008.01", "errorMessage": "Invalid Authentication passed"}),
            )
        }
    }
}

fn client(transport: &Arc<RecordingTransport>) -> GatewayClient {
    GatewayClient::with_transport(
        &SecretString::from("test-token".to_owned()),
        GatewayConfig::default(),
        transport.clone(),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock::new(FIXED_TIMESTAMP)))
}

/// Every required field filled in, plus a field the API must never see.
fn complete_input(op: Operation) -> Payload {
    let mut data = Payload::new();
    for field in op.required_fields() {
        data.insert((*field).to_owned(), Value::String(format!("{field}-value")));
    }
    data.insert("Unexpected".to_owned(), json!("must not leak"));
    data
}

fn expected_payload(op: Operation) -> Value {
    let mut expected = Payload::new();
    for field in op.required_fields() {
        expected.insert((*field).to_owned(), Value::String(format!("{field}-value")));
    }
    for (name, value) in op.fixed_fields(FIXED_TIMESTAMP) {
        expected.insert(name.to_owned(), value);
    }
    Value::Object(expected)
}

async fn invoke(client: &GatewayClient, op: Operation, data: &Payload) -> Result<GatewayResponse, GatewayError> {
    match op {
        Operation::B2bPaymentRequest => client.b2b_payment_request(data).await,
        Operation::B2cPaymentRequest => client.b2c_payment_request(data).await,
        Operation::C2bRegisterUrl => client.c2b_register_url(data).await,
        Operation::C2bSimulateTransaction => client.c2b_simulate_transaction(data).await,
        Operation::TransactionStatusRequest => client.transaction_status_request(data).await,
        Operation::AccountBalanceRequest => client.account_balance_request(data).await,
        Operation::ReversalRequest => client.reversal_request(data).await,
        Operation::LipaNaMpesaOnlineQuery => client.lipa_na_mpesa_online_query(data).await,
        Operation::LipaNaMpesaOnlinePayment => client.lipa_na_mpesa_online_payment(data).await,
    }
}

#[tokio::test]
async fn test_complete_input_dispatches_exact_payload() {
    for op in Operation::ALL {
        let transport = RecordingTransport::new();
        let client = client(&transport);

        let response = invoke(&client, op, &complete_input(op)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.dispatch_count(), 1, "{op}");
        assert_eq!(transport.last_payload(), expected_payload(op), "{op}");

        let dispatched = transport.dispatched.lock().unwrap();
        let request = &dispatched[0];
        assert_eq!(request.method(), &http::Method::POST);
        assert_eq!(request.headers()[http::header::AUTHORIZATION], "Bearer test-token");
        assert_eq!(request.headers()[http::header::CONTENT_TYPE], "application/json");
        assert!(request.url().as_str().starts_with("https://sandbox.safaricom.co.ke/"));
    }
}

#[tokio::test]
async fn test_missing_field_aborts_before_dispatch() {
    for op in Operation::ALL {
        for field in op.required_fields() {
            let transport = RecordingTransport::new();
            let client = client(&transport);
            let mut data = complete_input(op);
            data.remove(*field);

            let err = invoke(&client, op, &data).await.unwrap_err();

            assert_eq!(err.missing_field(), Some(*field), "{op}");
            assert_eq!(transport.dispatch_count(), 0, "{op}/{field}");
        }
    }
}

#[tokio::test]
async fn test_falsy_values_are_treated_as_missing() {
    for op in Operation::ALL {
        for &field in op.required_fields() {
            for falsy in [json!(0), json!(""), json!(false)] {
                let transport = RecordingTransport::new();
                let client = client(&transport);
                let mut data = complete_input(op);
                data.insert(field.to_owned(), falsy.clone());

                let err = invoke(&client, op, &data).await.unwrap_err();

                assert!(
                    matches!(&err, GatewayError::MissingField { field: f } if f == field),
                    "{op}/{field} with {falsy}: {err}"
                );
                assert_eq!(transport.dispatch_count(), 0, "{op}/{field} with {falsy}");
            }
        }
    }
}

#[tokio::test]
async fn test_first_missing_field_wins() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let data = Payload::new();

    let err = client.b2c_payment_request(&data).await.unwrap_err();
    assert_eq!(err.missing_field(), Some("InitiatorName"));
}

#[tokio::test]
async fn test_fixed_fields_override_caller_values() {
    let transport = RecordingTransport::new();
    let client = client(&transport);

    let mut data = complete_input(Operation::LipaNaMpesaOnlineQuery);
    data.insert("Timestamp".to_owned(), json!("19990101000000"));
    client.lipa_na_mpesa_online_query(&data).await.unwrap();
    assert_eq!(transport.last_payload()["Timestamp"], json!(FIXED_TIMESTAMP));

    let mut data = complete_input(Operation::ReversalRequest);
    data.insert("CommandID".to_owned(), json!("SomethingElse"));
    data.insert("ReceiverIdentifierType".to_owned(), json!("11"));
    client.reversal_request(&data).await.unwrap();
    let payload = transport.last_payload();
    assert_eq!(payload["CommandID"], json!("TransactionReversal"));
    assert_eq!(payload["ReceiverIdentifierType"], json!("4"));
}

#[tokio::test]
async fn test_c2b_simulate_example() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let data: Payload = serde_json::from_value(json!({
        "ShortCode": "600000",
        "Amount": "100",
        "Msisdn": "254700000000"
    }))
    .unwrap();

    let response = client.c2b_simulate_transaction(&data).await.unwrap();

    assert_eq!(response.json::<Value>().unwrap()["ResponseCode"], json!("0"));
    assert_eq!(
        transport.last_payload(),
        json!({
            "ShortCode": "600000",
            "Amount": "100",
            "Msisdn": "254700000000",
            "CommandID": "CustomerPayBillOnline"
        })
    );
    let dispatched = transport.dispatched.lock().unwrap();
    assert_eq!(
        dispatched[0].url().as_str(),
        "https://sandbox.safaricom.co.ke/mpesa/c2b/v1/simulate"
    );
}

#[tokio::test]
async fn test_unknown_version_fails_before_dispatch() {
    let transport = RecordingTransport::new();
    let client = GatewayClient::with_transport(
        &SecretString::from("t".to_owned()),
        GatewayConfig::default().with_version("v9"),
        transport.clone(),
    )
    .unwrap();

    let op = Operation::AccountBalanceRequest;
    let err = client.account_balance_request(&complete_input(op)).await.unwrap_err();

    assert!(matches!(err, GatewayError::EndpointNotConfigured { ref version, .. } if version == "v9"));
    assert_eq!(transport.dispatch_count(), 0);
}

#[tokio::test]
async fn test_timeout_is_forwarded() {
    let transport = RecordingTransport::new();
    let client = GatewayClient::with_transport(
        &SecretString::from("t".to_owned()),
        GatewayConfig::default().with_timeout(std::time::Duration::from_secs(7)),
        transport.clone(),
    )
    .unwrap();

    let op = Operation::C2bRegisterUrl;
    client.c2b_register_url(&complete_input(op)).await.unwrap();

    let dispatched = transport.dispatched.lock().unwrap();
    assert_eq!(dispatched[0].timeout_duration(), Some(std::time::Duration::from_secs(7)));
}

#[tokio::test]
async fn test_dispatch_primitive_sends_payload_verbatim() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let payload: Payload = serde_json::from_value(json!({"Anything": "goes"})).unwrap();
    let url = url::Url::parse("https://example.test/custom").unwrap();

    client.dispatch(url, payload, http::Method::PUT).await.unwrap();

    let dispatched = transport.dispatched.lock().unwrap();
    assert_eq!(dispatched[0].method(), &http::Method::PUT);
    assert_eq!(Value::Object(dispatched[0].payload().clone()), json!({"Anything": "goes"}));
}

#[test]
fn test_call_blocking_without_runtime() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let op = Operation::TransactionStatusRequest;

    let response = client.call_blocking(op, &complete_input(op)).unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.last_payload(), expected_payload(op));
}

#[tokio::test]
async fn test_call_blocking_on_current_thread_runtime_is_an_error() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let op = Operation::C2bSimulateTransaction;

    let err = client.call_blocking(op, &complete_input(op)).unwrap_err();

    assert!(matches!(err, GatewayError::BuildError(_)), "unexpected error: {err}");
    assert_eq!(transport.dispatch_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_call_blocking_inside_multi_thread_runtime() {
    let transport = RecordingTransport::new();
    let client = client(&transport);
    let op = Operation::C2bSimulateTransaction;

    let response = client.call_blocking(op, &complete_input(op)).unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.last_payload(), expected_payload(op));
}

#[tokio::test]
async fn test_token_ok_response_passes_through() {
    let transport = RecordingTransport::new();
    let secret = SecretString::from("consumer-secret".to_owned());

    let response = acquire_token_with(transport.as_ref(), "consumer-key", &secret, &TokenOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().unwrap()["access_token"], json!("abc123"));

    let tokens = transport.tokens.lock().unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(
        tokens[0].url().as_str(),
        "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials"
    );
    assert_eq!(tokens[0].consumer_key(), "consumer-key");
    assert_eq!(tokens[0].consumer_secret().expose_secret(), "consumer-secret");
}

#[tokio::test]
async fn test_token_error_response_is_returned_raw() {
    let transport = RecordingTransport::with_token_status(StatusCode::BAD_REQUEST);
    let secret = SecretString::from("wrong".to_owned());

    let response = acquire_token_with(transport.as_ref(), "consumer-key", &secret, &TokenOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().unwrap()["errorCode"], json!("400.008.01"));
    assert!(mpesa_client::AccessToken::from_response(&response).unwrap().is_empty());
}

#[tokio::test]
async fn test_token_unknown_environment() {
    let transport = RecordingTransport::new();
    let secret = SecretString::from("s".to_owned());
    let options = TokenOptions {
        environment: "staging".into(),
        ..TokenOptions::default()
    };

    let err = acquire_token_with(transport.as_ref(), "k", &secret, &options).await.unwrap_err();

    assert!(err.is_configuration());
    assert!(transport.tokens.lock().unwrap().is_empty());
}
