//! IPC SDK: signed requests and verified responses for the IPC payment gateway.
//!
//! Every request to the gateway carries a `Signature` field: the request's field values, in
//! the order they were added, joined with `-`, base64-encoded and signed with the merchant's
//! RSA key (PKCS#1 v1.5 over SHA-256). Every reply carries a signature made the same way with
//! the gateway's key. Card data is encrypted with the gateway's public key before signing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   validate    ┌──────────────────┐   sign    ┌───────────────┐
//! │  Operation   │──────────────▶│ RequestAssembler │──────────▶│ ParameterSet  │
//! │ (GetTxnStatus│  write fields │  normalize /     │           │ ... Signature │
//! │  Refund ...) │               │  encrypt         │           └───────┬───────┘
//! └──────────────┘               └──────────────────┘                   │ POST form
//!                                                                       ▼
//! ┌──────────────┐    verify     ┌──────────────────┐   parse   ┌───────────────┐
//! │   Response   │◀──────────────│ ResponseEnvelope │◀──────────│   Transport   │
//! └──────────────┘               └──────────────────┘           └───────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ipc_sdk::{client::IpcClient, config::IpcConfig, operations::GetTxnStatus};
//!
//! # async fn example() -> ipc_sdk::Result<()> {
//! let config = IpcConfig::from_file("ipc.toml")?;
//! let client = IpcClient::new(config)?;
//!
//! let response = client.execute(&GetTxnStatus::new("ORDER-1")).await?;
//! println!("status: {:?} {:?}", response.status(), response.status_msg());
//! # Ok(())
//! # }
//! ```
//!
//! # Signing without the client
//!
//! ```rust
//! use ipc_sdk::{params::ParameterSet, signing::codec::canonicalize};
//!
//! let params: ParameterSet =
//!     [("OrderID", "X1"), ("Amount", "10.00"), ("Currency", "EUR")].into_iter().collect();
//! assert_eq!(canonicalize(&params), b"WDEtMTAuMDAtRVVS");
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T, IpcError>`](error::Result):
//!
//! ```rust,no_run
//! use ipc_sdk::{IpcError, client::IpcClient, operations::GetTxnStatus};
//!
//! # async fn example(client: IpcClient) {
//! match client.execute(&GetTxnStatus::new("ORDER-1")).await {
//!     Ok(response) => println!("status {:?}", response.status()),
//!     Err(IpcError::Validation(msg)) => eprintln!("fix input: {msg}"),
//!     Err(e) if e.is_untrusted_response() => eprintln!("do not trust reply: {e}"),
//!     Err(IpcError::Http(e)) => eprintln!("network error: {e}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from rsa and reqwest"
)]

pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod params;
pub mod request;
pub mod response;
pub mod signing;
pub mod transport;
pub mod validate;

pub use client::IpcClient;
pub use config::IpcConfig;
pub use error::{IpcError, Result};

