//! Command line front end for the IPC payment gateway SDK.
//!
//! ```bash
//! ipc-cli sign --config ipc.toml IPCmethod=IPCGetTxnStatus OrderID=ORDER-1
//! ipc-cli verify --key gateway_cert.pem --format json reply.json
//! ipc-cli check-card 4111111111111111
//! ipc-cli status --config ipc.toml ORDER-1
//! ```

mod observability;

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use ipc_sdk::{
    IpcClient, IpcConfig, IpcError, Result,
    operations::GetTxnStatus,
    request::RequestAssembler,
    response::{ResponseEnvelope, ResponseFormat},
    signing::{PublicKey, verify_response},
    validate::is_valid_card_number,
};
use tracing::{error, info};

use crate::observability::{LogFormat, init_logging};

#[derive(Debug, Parser)]
#[command(name = "ipc-cli")]
#[command(about = "Sign, verify and send IPC gateway requests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log SDK internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign fields and print the form-encoded request body
    Sign {
        /// Merchant configuration file
        #[arg(short, long, env = "IPC_CONFIG", value_name = "PATH")]
        config: PathBuf,

        /// Field to encrypt with the gateway key (repeatable)
        #[arg(short, long, value_name = "NAME")]
        encrypt: Vec<String>,

        /// Fields in wire order
        #[arg(value_name = "NAME=VALUE", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Verify the signature of a gateway reply
    Verify {
        /// Gateway public key or certificate (PEM)
        #[arg(short, long, value_name = "PATH")]
        key: PathBuf,

        /// Reply format: json, xml or post
        #[arg(short, long, default_value = "json")]
        format: ResponseFormat,

        /// File holding the reply body
        #[arg(value_name = "FILE")]
        body: PathBuf,
    },

    /// Check a card number with the Luhn algorithm
    CheckCard {
        /// Card number; spaces are ignored
        #[arg(value_name = "NUMBER")]
        number: String,
    },

    /// Query the status of the last transaction of an order
    Status {
        /// Merchant configuration file
        #[arg(short, long, env = "IPC_CONFIG", value_name = "PATH")]
        config: PathBuf,

        /// Reply format: json or xml
        #[arg(short, long, default_value = "json")]
        format: ResponseFormat,

        /// Order identifier
        #[arg(value_name = "ORDER_ID")]
        order_id: String,
    },
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), value.to_owned())),
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogFormat::from_env(), cli.verbose);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Sign { config, encrypt, fields } => {
            let config = IpcConfig::from_file(config)?;
            let mut request = RequestAssembler::new(config.signing().clone());
            for (name, value) in &fields {
                request.add_field(name, value, encrypt.contains(name))?;
            }
            println!("{}", request.finalize()?.to_form_body());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { key, format, body } => {
            let key = PublicKey::from_pem_file(key)?;
            let raw = std::fs::read(&body).map_err(|e| {
                IpcError::InvalidResponse(format!("cannot read {}: {e}", body.display()))
            })?;
            let envelope = ResponseEnvelope::parse(&raw, format)?;
            match verify_response(envelope, &key) {
                Ok(response) => {
                    info!(status = response.status(), "signature verified");
                    println!("signature OK");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_untrusted_response() => {
                    println!("signature INVALID: {e}");
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e),
            }
        }
        Commands::CheckCard { number } => {
            if is_valid_card_number(&number) {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Status { config, format, order_id } => {
            let client = IpcClient::new(IpcConfig::from_file(config)?)?;
            let operation = GetTxnStatus::new(order_id).with_output_format(format);
            let response = client.execute(&operation).await?;
            let data = serde_json::to_string_pretty(response.data())
                .map_err(|e| IpcError::InvalidResponse(e.to_string()))?;
            println!("{data}");
            Ok(if response.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
