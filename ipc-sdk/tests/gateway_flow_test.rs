//! End-to-end tests against recorded gateway replies and a simulated gateway.
//!
//! The simulated gateway checks the merchant signature on every request and signs its replies
//! with the gateway test key, the same way the real gateway does.

use std::path::{Path, PathBuf};

use ipc_sdk::{
    IpcClient, IpcConfig, IpcError,
    operations::{
        Card, CardType, Cart, CartItemType, GetTxnStatus, IaPurchase, MandateAction,
        MandateManagement, Refund,
    },
    params::ParameterSet,
    response::{ResponseEnvelope, ResponseFormat},
    signing::{PrivateKey, PublicKey, codec, sign, verifier::flatten_values, verify},
};
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use url::form_urlencoded;
use wiremock::{Mock, MockServer, Request, ResponseTemplate, matchers::method};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn gateway_cert() -> PublicKey {
    PublicKey::from_pem_file(fixtures().join("gateway_cert.pem")).unwrap()
}

fn gateway_key() -> PrivateKey {
    PrivateKey::from_pem_file(fixtures().join("gateway_private.pem")).unwrap()
}

fn merchant_public() -> PublicKey {
    PublicKey::from_pem_file(fixtures().join("merchant_public.pem")).unwrap()
}

fn config_for(url: &str) -> IpcConfig {
    let toml = format!(
        r#"
        ipc_url = "{url}"
        sid = "000000000000010"
        wallet = "61938166610"
        key_index = 1
        partner_id = "P-100"
        application_id = "A-200"

        [keys]
        private_key_file = "merchant_private.pem"
        gateway_public_key_file = "gateway_cert.pem"

        [transport]
        timeout_secs = 5
        http_version = "http1"
        "#
    );
    IpcConfig::from_toml_str(&toml, &fixtures()).unwrap()
}

fn decode_form(body: &[u8]) -> ParameterSet {
    form_urlencoded::parse(body).into_owned().collect()
}

/// Replies like the gateway: signed JSON built by `reply` from the verified request.
fn gateway<F>(reply: F) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync
where
    F: Fn(&ParameterSet) -> Value + Send + Sync,
{
    let merchant = merchant_public();
    let key = gateway_key();
    move |request: &Request| {
        let params = decode_form(&request.body);
        let signature = params.signature().unwrap_or_default().to_owned();
        if !verify(&codec::canonicalize(&params), &signature, &merchant) {
            return ResponseTemplate::new(200)
                .set_body_string(r#"{"Status":"-1","StatusMsg":"Signature check failed"}"#);
        }

        let mut fields: Map<String, Value> = reply(&params).as_object().cloned().unwrap();
        let values = flatten_values(fields.values());
        let canonical = codec::encode_joined(values.iter().map(String::as_str));
        fields.insert("Signature".to_owned(), json!(sign(&canonical, &key).unwrap()));
        ResponseTemplate::new(200)
            .set_body_raw(Value::Object(fields).to_string(), "application/json")
    }
}

#[test]
fn test_recorded_json_reply_verifies() {
    let body = std::fs::read(fixtures().join("txn_status_response.json")).unwrap();
    let envelope = ResponseEnvelope::parse(&body, ResponseFormat::Json).unwrap();
    let response = ipc_sdk::signing::verify_response(envelope, &gateway_cert()).unwrap();

    assert!(response.is_success());
    assert_eq!(response.get_str("orderid").as_deref(), Some("X1"));
    assert_eq!(response.get_str("Amount").as_deref(), Some("10.5"));
    assert!(response.get("Signature").is_none());
}

#[test]
fn test_recorded_xml_reply_verifies() {
    let body = std::fs::read(fixtures().join("txn_status_response.xml")).unwrap();
    let envelope = ResponseEnvelope::parse(&body, ResponseFormat::Xml).unwrap();
    let response = ipc_sdk::signing::verify_response(envelope, &gateway_cert()).unwrap();

    assert_eq!(response.status(), Some(0));
    assert_eq!(response.status_msg(), Some("Success"));
    assert_eq!(response.format(), ResponseFormat::Xml);
}

#[test]
fn test_recorded_reply_tampered() {
    let body = std::fs::read_to_string(fixtures().join("txn_status_response.json")).unwrap();
    let tampered = body.replace("\"Amount\":10.5", "\"Amount\":1050");
    let envelope = ResponseEnvelope::parse(tampered.as_bytes(), ResponseFormat::Json).unwrap();
    let result = ipc_sdk::signing::verify_response(envelope, &gateway_cert());
    assert!(matches!(result, Err(IpcError::SignatureMismatch)));
}

#[tokio::test]
async fn test_status_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gateway(|params| {
            json!({
                "IPCmethod": params.get("IPCmethod"),
                "OrderID": params.get("OrderID"),
                "Status": 0,
                "StatusMsg": "Success",
                "TxnStatus": {"Status": "Completed", "Amount": "10.00"},
            })
        }))
        .expect(1)
        .mount(&server)
        .await;

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let response = client.execute(&GetTxnStatus::new("ORDER-1")).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.get_str("OrderID").as_deref(), Some("ORDER-1"));
    assert_eq!(response.get("TxnStatus").and_then(|s| s.get("Status")), Some(&json!("Completed")));
}

#[tokio::test]
async fn test_refund_confirmed_by_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gateway(|params| {
            json!({
                "Status": "0",
                "IPC_Trnref": params.get("IPC_Trnref"),
                "Amount": params.get("Amount"),
                "Currency": params.get("Currency"),
            })
        }))
        .mount(&server)
        .await;

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let refund = Refund::new("ORDER-1", "TRN-42", Decimal::new(1550, 2), "EUR");
    let response = client.execute(&refund).await.unwrap();
    assert_eq!(response.get_str("Amount").as_deref(), Some("15.50"));
}

#[tokio::test]
async fn test_purchase_sends_encrypted_card() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gateway(|params| {
            let gateway = gateway_key();
            let pan = params
                .get("PAN")
                .and_then(|c| ipc_sdk::signing::encrypt::decrypt_field(c, &gateway).ok());
            json!({
                "Status": 0,
                "CartItems": params.get("CartItems"),
                "PanDecrypted": pan.is_some_and(|p| p.as_str() == "5555555555554444"),
            })
        }))
        .mount(&server)
        .await;

    let mut cart = Cart::new();
    cart.add("T-shirt", 2, Decimal::new(1999, 2), CartItemType::Article)
        .unwrap()
        .add("Delivery", 1, Decimal::new(500, 2), CartItemType::Delivery)
        .unwrap();
    let card = Card::new(CardType::Mastercard, "5555555555554444", "JANE ROE", "08", "99", "321");

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let purchase = IaPurchase::new("ORDER-7", "EUR", card, cart);
    let params = client.prepare(&purchase).unwrap();
    assert_eq!(params.get("Amount"), Some("44.98"));

    let response = client.execute(&purchase).await.unwrap();
    assert_eq!(response.get_str("CartItems").as_deref(), Some("2"));
    assert_eq!(response.get("PanDecrypted"), Some(&json!(true)));
}

#[tokio::test]
async fn test_mandate_carries_partner_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gateway(|params| {
            json!({
                "Status": 0,
                "PartnerID": params.get("PartnerID"),
                "ApplicationID": params.get("ApplicationID"),
            })
        }))
        .mount(&server)
        .await;

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let mandate =
        MandateManagement::new("MR-1", "40000000001", MandateAction::Register, "Monthly plan");
    let response = client.execute(&mandate).await.unwrap();
    assert_eq!(response.get_str("PartnerID").as_deref(), Some("P-100"));
    assert_eq!(response.get_str("ApplicationID").as_deref(), Some("A-200"));
}

#[tokio::test]
async fn test_unsigned_reply_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Status":0}"#))
        .mount(&server)
        .await;

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let err = client.execute(&GetTxnStatus::new("ORDER-1")).await.unwrap_err();
    assert!(matches!(err, IpcError::MissingSignature));
}

#[tokio::test]
async fn test_empty_reply_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;

    let client = IpcClient::new(config_for(&server.uri())).unwrap();
    let err = client.execute(&GetTxnStatus::new("ORDER-1")).await.unwrap_err();
    assert!(matches!(err, IpcError::InvalidResponse(_)));
}
