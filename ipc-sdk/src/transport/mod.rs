//! Transport to the gateway.
//!
//! The gateway exposes a single endpoint that takes every operation as an
//! `application/x-www-form-urlencoded` POST. The [`Transport`] trait abstracts that one call so
//! the client can be exercised against a mock server; it is sealed, and [`HttpTransport`] is the
//! only implementation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ipc_sdk::{
//!     params::ParameterSet,
//!     transport::{HttpTransport, Transport},
//! };
//! use url::Url;
//!
//! # async fn example(signed: ParameterSet) -> ipc_sdk::Result<()> {
//! let transport = HttpTransport::new()?;
//! let url = Url::parse("https://www.mypos.com/vmp/checkout-test").unwrap();
//!
//! let response = transport.post_form(&url, &signed).await?;
//! println!("{} bytes", response.body.len());
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use url::Url;

use crate::{error::Result, params::ParameterSet};

pub mod config;
pub mod http;
mod sealed;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Raw gateway reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes, unparsed.
    pub body: Vec<u8>,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
}

/// Sends signed parameter sets to the gateway.
///
/// Implementations must be `Send + Sync` so one transport can serve concurrent operations.
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Posts `params` as a form body, preserving field order.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Http`](crate::IpcError::Http) on network failure, or
    /// [`IpcError::Transport`](crate::IpcError::Transport) if the URL is unusable or the
    /// gateway answers with a non-success HTTP status.
    fn post_form<'a>(
        &'a self,
        url: &'a Url,
        params: &'a ParameterSet,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Protocol name for logs.
    fn protocol_name(&self) -> &'static str;
}
