//! HTTP transport over `reqwest`.

use reqwest::{Client, header};
use tracing::{debug, instrument, warn};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{IpcError, Result},
    params::ParameterSet,
    transport::{Transport, TransportResponse, sealed},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Rejects anything but absolute `http`/`https` URLs with a host.
fn validate_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IpcError::Transport(format!("unsupported URL scheme: {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(IpcError::Transport(format!("URL missing host: {url}")));
    }
    if url.scheme() == "http" {
        warn!(host = url.host_str(), "gateway URL is not HTTPS");
    }
    Ok(())
}

/// Posts form-encoded requests with a pooled `reqwest` client.
///
/// # Examples
///
/// ```
/// use ipc_sdk::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config = HttpConfig { http_version: HttpVersion::Http1, ..HttpConfig::default() };
/// let transport = HttpTransport::with_config(&config)?;
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// # Ok::<(), ipc_sdk::error::IpcError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Http`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] if the configuration is out of range, or
    /// [`IpcError::Http`] if the client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;
        Ok(Self { client, http_version: config.http_version })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, params), fields(url = %url, field_count = params.len()))]
    async fn post_form<'a>(
        &'a self,
        url: &'a Url,
        params: &'a ParameterSet,
    ) -> Result<TransportResponse> {
        validate_url(url)?;

        let response = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(params.to_form_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IpcError::Transport(format!("gateway returned HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();

        debug!(status = status.as_u16(), body_len = body.len(), "gateway replied");
        Ok(TransportResponse { status: status.as_u16(), body, content_type })
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string, header as header_matcher, method},
    };

    use super::*;

    fn params() -> ParameterSet {
        [("IPCmethod", "IPCGetTxnStatus"), ("Note", "a b&c"), ("Signature", "c2ln")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_protocol_names() {
        for (version, name) in [
            (HttpVersion::Http1, "http/1.1"),
            (HttpVersion::Http2, "http/2"),
            (HttpVersion::Auto, "http"),
        ] {
            let config = HttpConfig { http_version: version, ..HttpConfig::default() };
            assert_eq!(HttpTransport::with_config(&config).unwrap().protocol_name(), name);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = HttpConfig { timeout_secs: 0, ..HttpConfig::default() };
        assert!(matches!(HttpTransport::with_config(&config), Err(IpcError::Config(_))));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url(&Url::parse("https://gateway.example.com/ipc").unwrap()).is_ok());
        assert!(validate_url(&Url::parse("http://127.0.0.1:8080").unwrap()).is_ok());
        assert!(matches!(
            validate_url(&Url::parse("ftp://gateway.example.com").unwrap()),
            Err(IpcError::Transport(_))
        ));
        assert!(matches!(
            validate_url(&Url::parse("file:///etc/passwd").unwrap()),
            Err(IpcError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_post_form_sends_ordered_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_matcher("content-type", FORM_CONTENT_TYPE))
            .and(body_string("IPCmethod=IPCGetTxnStatus&Note=a+b%26c&Signature=c2ln"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"Status":0}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let response = transport.post_form(&url, &params()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"Status":0}"#);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_post_form_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let result = transport.post_form(&url, &params()).await;

        assert!(matches!(result, Err(IpcError::Transport(msg)) if msg.contains("503")));
    }
}
