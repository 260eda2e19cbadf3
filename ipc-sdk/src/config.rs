//! Merchant configuration.
//!
//! [`IpcConfig`] is an immutable value passed explicitly to the client and to operations. It is
//! loaded from a TOML file, built in code, or filled from the base64 configuration package the
//! gateway generates for a store.
//!
//! # Examples
//!
//! ```toml
//! ipc_url = "https://www.mypos.com/vmp/checkout-test"
//! sid = "000000000000010"
//! wallet = "61938166610"
//! key_index = 1
//! language = "EN"
//!
//! [keys]
//! private_key_file = "keys/store_private.pem"
//! gateway_public_key_file = "keys/api_public.pem"
//!
//! [transport]
//! timeout_secs = 60
//! ```

use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    error::{IpcError, Result},
    signing::{KeyMaterial, PrivateKey, PublicKey, SigningContext},
    transport::HttpConfig,
    validate::is_valid_url,
};

/// Protocol version sent when none is configured.
pub const DEFAULT_VERSION: &str = "1.4";

/// Interface language sent when none is configured.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// SDK identifier sent in the `Source` field.
pub const DEFAULT_SOURCE: &str = concat!("SDK_RUST_", env!("CARGO_PKG_VERSION"));

/// Validated merchant settings and keys.
#[derive(Debug, Clone)]
pub struct IpcConfig {
    ipc_url: String,
    sid: String,
    wallet: String,
    version: String,
    language: String,
    source: String,
    developer_key: Option<String>,
    partner_id: Option<String>,
    application_id: Option<String>,
    signing: SigningContext,
    transport: HttpConfig,
}

impl IpcConfig {
    /// Creates a configuration with default version, language and source.
    ///
    /// Call [`validate`](Self::validate) before use.
    #[must_use]
    pub fn new(
        ipc_url: impl Into<String>,
        sid: impl Into<String>,
        wallet: impl Into<String>,
        signing: SigningContext,
    ) -> Self {
        Self {
            ipc_url: ipc_url.into(),
            sid: sid.into(),
            wallet: wallet.into(),
            version: DEFAULT_VERSION.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            source: DEFAULT_SOURCE.to_owned(),
            developer_key: None,
            partner_id: None,
            application_id: None,
            signing,
            transport: HttpConfig::default(),
        }
    }

    /// Parses a TOML document. Relative key paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] for malformed TOML or invalid settings, and
    /// [`IpcError::Key`] if a referenced key cannot be loaded.
    pub fn from_toml_str(toml: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(toml).map_err(|e| IpcError::Config(format!("TOML parse error: {e}")))?;
        let keys = file.keys.load(base_dir)?;

        let config = Self {
            ipc_url: file.ipc_url,
            sid: file.sid,
            wallet: file.wallet,
            version: file.version.unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            language: file.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
            source: file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_owned()),
            developer_key: file.developer_key,
            partner_id: file.partner_id,
            application_id: file.application_id,
            signing: SigningContext::new(keys, file.key_index),
            transport: file.transport,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Same as [`from_toml_str`](Self::from_toml_str), plus [`IpcError::Config`] if the file
    /// cannot be read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .map_err(|e| IpcError::Config(format!("cannot read {}: {e}", path.display())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_toml_str(&toml, base_dir)?;
        debug!(sid = %config.sid, "configuration loaded");
        Ok(config)
    }

    /// Applies a gateway-generated configuration package.
    ///
    /// The package is base64 JSON with the keys `sid`, `cn` (wallet), `pk` (private key PEM),
    /// `pc` (gateway certificate, used for both verification and encryption) and `idx` (key
    /// index). Absent keys leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] if the package is not base64 JSON or contains an unknown
    /// key, and [`IpcError::Key`] if a key does not parse.
    pub fn with_configuration_package(mut self, package: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(package.trim())
            .map_err(|_| IpcError::Config("Invalid configuration package".to_owned()))?;
        let Ok(Value::Object(data)) = serde_json::from_slice::<Value>(&decoded) else {
            return Err(IpcError::Config("Invalid configuration package".to_owned()));
        };
        if data.is_empty() {
            return Err(IpcError::Config("Invalid configuration package".to_owned()));
        }

        let mut keys = self.signing.keys().clone();
        let mut key_index = self.signing.key_index();

        for (name, value) in &data {
            match name.as_str() {
                "sid" => self.sid = package_text(name, value)?,
                "cn" => self.wallet = package_text(name, value)?,
                "pk" => {
                    let private = PrivateKey::from_pem(&package_text(name, value)?)?;
                    keys = keys.with_signing_key(private);
                }
                "pc" => {
                    let gateway = PublicKey::from_pem(&package_text(name, value)?)?;
                    keys = keys.with_verification_key(gateway.clone()).with_encryption_key(gateway);
                }
                "idx" => {
                    key_index = package_text(name, value)?.parse().map_err(|_| {
                        IpcError::Config("Invalid key index in configuration package".to_owned())
                    })?;
                }
                other => {
                    return Err(IpcError::Config(format!(
                        "Unknown configuration package parameter: {other}"
                    )));
                }
            }
        }

        self.signing = SigningContext::new(keys, key_index);
        Ok(self)
    }

    /// Checks the settings the gateway requires on every call.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_url(&self.ipc_url) {
            return Err(IpcError::Config("Invalid IPC URL".to_owned()));
        }
        if !is_numeric(&self.sid) {
            return Err(IpcError::Config("Invalid SID".to_owned()));
        }
        if !is_numeric(&self.wallet) {
            return Err(IpcError::Config("Invalid Wallet number".to_owned()));
        }
        if self.version.trim().is_empty() {
            return Err(IpcError::Config("Invalid IPC Version".to_owned()));
        }
        if !self.signing.keys().has_signing_key() {
            return Err(IpcError::Config("Invalid Private key".to_owned()));
        }
        self.transport.validate()
    }

    /// Returns a copy with the protocol version replaced.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Returns a copy with the interface language replaced.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Returns a copy with the `Source` identifier replaced.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns a copy with the developer key set.
    #[must_use]
    pub fn with_developer_key(mut self, developer_key: impl Into<String>) -> Self {
        self.developer_key = Some(developer_key.into());
        self
    }

    /// Returns a copy with the partner and application ids set.
    #[must_use]
    pub fn with_partner(
        mut self,
        partner_id: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        self.partner_id = Some(partner_id.into());
        self.application_id = Some(application_id.into());
        self
    }

    /// Returns a copy with new keys, e.g. after a rotation.
    #[must_use]
    pub fn with_signing(mut self, signing: SigningContext) -> Self {
        self.signing = signing;
        self
    }

    /// Returns a copy with different HTTP settings.
    #[must_use]
    pub fn with_transport(mut self, transport: HttpConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Gateway endpoint.
    #[must_use]
    pub fn ipc_url(&self) -> &str {
        &self.ipc_url
    }

    /// Store id.
    #[must_use]
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Merchant wallet number.
    #[must_use]
    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    /// Index of the merchant key pair.
    #[must_use]
    pub const fn key_index(&self) -> u32 {
        self.signing.key_index()
    }

    /// Protocol version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Interface language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// SDK identifier.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Developer key, if any.
    #[must_use]
    pub fn developer_key(&self) -> Option<&str> {
        self.developer_key.as_deref()
    }

    /// Partner id, if any.
    #[must_use]
    pub fn partner_id(&self) -> Option<&str> {
        self.partner_id.as_deref()
    }

    /// Application id, if any.
    #[must_use]
    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Keys and key index.
    #[must_use]
    pub const fn signing(&self) -> &SigningContext {
        &self.signing
    }

    /// HTTP settings.
    #[must_use]
    pub const fn transport(&self) -> &HttpConfig {
        &self.transport
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn package_text(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(IpcError::Config(format!("Invalid configuration package value for {name}"))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    ipc_url: String,
    sid: String,
    wallet: String,
    key_index: u32,
    version: Option<String>,
    language: Option<String>,
    source: Option<String>,
    developer_key: Option<String>,
    partner_id: Option<String>,
    application_id: Option<String>,
    #[serde(default)]
    keys: KeysFile,
    #[serde(default)]
    transport: HttpConfig,
}

/// `[keys]` table: each key given either as a file path or as inline PEM.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeysFile {
    private_key_file: Option<PathBuf>,
    private_key_pem: Option<String>,
    gateway_public_key_file: Option<PathBuf>,
    gateway_public_key_pem: Option<String>,
    encryption_key_file: Option<PathBuf>,
    encryption_key_pem: Option<String>,
}

impl KeysFile {
    /// Loads every configured key; the encryption key falls back to the gateway key.
    fn load(self, base_dir: &Path) -> Result<KeyMaterial> {
        let signing =
            pick_pem("private_key", self.private_key_file, self.private_key_pem, base_dir)?
                .map(|pem| PrivateKey::from_pem(&pem))
                .transpose()?;
        let verification = pick_pem(
            "gateway_public_key",
            self.gateway_public_key_file,
            self.gateway_public_key_pem,
            base_dir,
        )?
        .map(|pem| PublicKey::from_pem(&pem))
        .transpose()?;
        let encryption =
            pick_pem("encryption_key", self.encryption_key_file, self.encryption_key_pem, base_dir)?
                .map(|pem| PublicKey::from_pem(&pem))
                .transpose()?
                .or_else(|| verification.clone());

        Ok(KeyMaterial::new(signing, verification, encryption))
    }
}

fn pick_pem(
    name: &str,
    file: Option<PathBuf>,
    pem: Option<String>,
    base_dir: &Path,
) -> Result<Option<String>> {
    match (file, pem) {
        (Some(_), Some(_)) => {
            Err(IpcError::Config(format!("set either {name}_file or {name}_pem, not both")))
        }
        (Some(file), None) => {
            let path = if file.is_absolute() { file } else { base_dir.join(file) };
            std::fs::read_to_string(&path)
                .map(Some)
                .map_err(|e| IpcError::Key(format!("cannot read key file {}: {e}", path.display())))
        }
        (None, pem) => Ok(pem),
    }
}
