//! Gateway client.
//!
//! [`IpcClient`] runs an [`Operation`] end to end: validate, assemble and sign, post, parse and
//! verify. Configuration is shared behind an [`Arc`]; a reload builds a new client with
//! [`IpcClient::with_config`] while requests in flight keep the old settings.

use std::sync::Arc;

use tracing::{Span, debug, instrument, warn};
use url::Url;

use crate::{
    config::IpcConfig,
    error::{IpcError, Result},
    operations::{self, Operation, OperationState},
    params::ParameterSet,
    response::{Response, ResponseEnvelope},
    transport::{HttpTransport, Transport},
};

/// Client bound to one merchant configuration.
///
/// # Examples
///
/// ```no_run
/// use ipc_sdk::{client::IpcClient, config::IpcConfig, operations::GetTxnStatus};
///
/// # async fn example() -> ipc_sdk::Result<()> {
/// let client = IpcClient::new(IpcConfig::from_file("ipc.toml")?)?;
/// let response = client.execute(&GetTxnStatus::new("ORDER-1")).await?;
/// if response.is_success() {
///     println!("{:?}", response.get_str("TxnStatus"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IpcClient<T = HttpTransport> {
    config: Arc<IpcConfig>,
    url: Url,
    transport: T,
}

impl IpcClient<HttpTransport> {
    /// Creates a client with an HTTP transport built from the `[transport]` settings.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] if the configuration is invalid, or
    /// [`IpcError::Http`] if the HTTP client cannot be built.
    pub fn new(config: IpcConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(config.transport())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> IpcClient<T> {
    /// Creates a client over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] if the configuration is invalid.
    pub fn with_transport(config: IpcConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let url = parse_url(config.ipc_url())?;
        Ok(Self { config: Arc::new(config), url, transport })
    }

    /// Returns a client using `config` and the same transport.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] if the new configuration is invalid.
    pub fn with_config(&self, config: IpcConfig) -> Result<Self>
    where
        T: Clone,
    {
        Self::with_transport(config, self.transport.clone())
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<IpcConfig> {
        &self.config
    }

    /// Validates and signs `operation` without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] for invalid inputs, or a key error if signing or
    /// encryption fails.
    pub fn prepare<O: Operation + ?Sized>(&self, operation: &O) -> Result<ParameterSet> {
        operation.validate(&self.config)?;
        operations::assemble(operation, &self.config)?.finalize()
    }

    /// Runs `operation` and returns the verified response.
    ///
    /// Nothing is sent if validation or signing fails. The response is returned only after its
    /// signature verified and the operation accepted it.
    ///
    /// # Errors
    ///
    /// - [`IpcError::Validation`], [`IpcError::Key`], [`IpcError::Crypto`] before sending
    /// - [`IpcError::Http`] or [`IpcError::Transport`] if the gateway cannot be reached
    /// - [`IpcError::InvalidResponse`] for an unparsable reply or one the operation rejects
    /// - [`IpcError::MissingSignature`] or [`IpcError::SignatureMismatch`] for an untrusted reply
    #[instrument(
        skip_all,
        fields(method = operation.method(), format = %operation.output_format(), state)
    )]
    pub async fn execute<O: Operation + ?Sized>(&self, operation: &O) -> Result<Response> {
        record(OperationState::Unvalidated);
        let params = self.prepare(operation)?;
        record(OperationState::Validated);

        let reply = match self.transport.post_form(&self.url, &params).await {
            Ok(reply) => reply,
            Err(e) => {
                record(OperationState::TransportError);
                return Err(e);
            }
        };
        record(OperationState::Sent);

        let envelope = match ResponseEnvelope::parse(&reply.body, operation.output_format()) {
            Ok(envelope) => envelope,
            Err(e) => {
                record(OperationState::TransportError);
                return Err(e);
            }
        };

        let response = match self.config.signing().verify_response(envelope) {
            Ok(response) => response,
            Err(e) => {
                record(OperationState::VerificationFailed);
                warn!(error = %e, "gateway reply rejected");
                return Err(e);
            }
        };
        record(OperationState::Verified);

        operation.check_response(&response)?;
        debug!(status = response.status(), "operation completed");
        Ok(response)
    }
}

fn record(state: OperationState) {
    Span::current().record("state", tracing::field::display(state));
    debug!(%state, "operation state");
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| IpcError::Config(format!("Invalid IPC URL: {e}")))
}
