//! Offline request signing and reply verification.
//!
//! Signs a refund request with the merchant key and checks a recorded gateway reply, without
//! any network access.
//!
//! # Running this example
//!
//! ```bash
//! export IPC_PRIVATE_KEY=ipc-sdk/tests/fixtures/merchant_private.pem
//! export IPC_GATEWAY_CERT=ipc-sdk/tests/fixtures/gateway_cert.pem
//! cargo run --example signature_generation
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "examples are allowed to use println"
)]

use std::env;

use ipc_sdk::{
    IpcConfig,
    operations::{self, Operation, Refund},
    response::{ResponseEnvelope, ResponseFormat},
    signing::{KeyMaterial, PrivateKey, PublicKey, SigningContext},
};
use rust_decimal::Decimal;

const RECORDED_REPLY: &str = include_str!("../tests/fixtures/txn_status_response.json");

fn load_keys() -> Result<KeyMaterial, Box<dyn std::error::Error>> {
    let private = env::var("IPC_PRIVATE_KEY").map_err(|_| {
        "IPC_PRIVATE_KEY not set.\nPoint it at the merchant private key PEM from the gateway \
         configuration package."
    })?;
    let gateway = env::var("IPC_GATEWAY_CERT").map_err(|_| "IPC_GATEWAY_CERT not set")?;

    let gateway = PublicKey::from_pem_file(gateway)?;
    Ok(KeyMaterial::new(
        Some(PrivateKey::from_pem_file(private)?),
        Some(gateway.clone()),
        Some(gateway),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let signing = SigningContext::new(load_keys()?, 1);
    let config = IpcConfig::new(
        "https://www.mypos.com/vmp/checkout-test",
        "000000000000010",
        "61938166610",
        signing.clone(),
    );

    let refund = Refund::new("ORDER-1", "TRN-42", Decimal::new(1000, 2), "EUR");
    refund.validate(&config)?;
    let params = operations::assemble(&refund, &config)?.finalize()?;

    println!("Signed {} request:", refund.method());
    for (name, value) in params.iter() {
        println!("  {name:<14} {value}");
    }
    println!("\nForm body:\n{}\n", params.to_form_body());

    let envelope = ResponseEnvelope::parse(RECORDED_REPLY.as_bytes(), ResponseFormat::Json)?;
    match signing.verify_response(envelope) {
        Ok(response) => println!("Recorded reply verified, status {:?}", response.status()),
        Err(e) => eprintln!("Recorded reply rejected: {e}"),
    }
    Ok(())
}
