//! YAML configuration.
//!
//! The file holds one library section, `ad_manager` (or the older `dfp`):
//!
//! ```yaml
//! ad_manager:
//!   application_name: Acme Trafficker
//!   network_code: 1234
//!   https_proxy: proxy.internal:3128
//!   enable_compression: true
//!   custom_http_headers:
//!     x-team: ads
//!   client_id: 123.apps.googleusercontent.com
//!   client_secret: s3cret
//!   refresh_token: 1/abc
//! ```
//!
//! Credentials are either `access_token`, or all of `client_id`,
//! `client_secret` and `refresh_token`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::builder::DfpClientBuilder;
use crate::credentials::{AccessTokenCredentials, RefreshTokenCredentials};
use crate::error::ClientError;
use crate::transport::HyperTransport;

/// File looked up in the home directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "googleads.yaml";

/// Library section of the configuration document.
pub const CONFIG_SECTION: &str = "ad_manager";

/// Section name used by older configuration files.
pub const LEGACY_CONFIG_SECTION: &str = "dfp";

/// Settings read from the library section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub application_name: Option<String>,
    /// Written as a number in most files.
    #[serde(default, deserialize_with = "scalar_string")]
    pub network_code: Option<String>,
    #[serde(default)]
    pub https_proxy: Option<String>,
    #[serde(default)]
    pub enable_compression: bool,
    #[serde(default)]
    pub custom_http_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Keys this library does not recognise.
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

impl ClientConfig {
    /// `googleads.yaml` in the user's home directory.
    pub fn default_path() -> Result<PathBuf, ClientError> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_FILE))
            .ok_or_else(|| ClientError::config("cannot locate the home directory; pass a configuration path"))
    }

    /// Read and parse the file at `path`, or at [`ClientConfig::default_path`].
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        let yaml = std::fs::read_to_string(&path).map_err(|e| {
            ClientError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&yaml)
    }

    /// Parse a configuration document.
    pub fn parse(yaml: &str) -> Result<Self, ClientError> {
        let mut document: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(yaml)
            .map_err(|e| ClientError::config(format!("invalid configuration document: {e}")))?;
        let section = document
            .remove(CONFIG_SECTION)
            .or_else(|| document.remove(LEGACY_CONFIG_SECTION))
            .ok_or_else(|| {
                ClientError::config(format!(
                    "configuration has no {CONFIG_SECTION:?} (or {LEGACY_CONFIG_SECTION:?}) section"
                ))
            })?;
        let config: ClientConfig = serde_yaml::from_value(section)
            .map_err(|e| ClientError::config(format!("invalid {CONFIG_SECTION} section: {e}")))?;

        #[cfg(feature = "tracing")]
        for key in config.unknown_keys() {
            tracing::warn!(key, "ignoring unrecognised configuration key");
        }

        Ok(config)
    }

    /// Keys present in the section that this library ignores.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.unknown.keys().map(String::as_str)
    }

    /// Turn the configuration into a client builder.
    ///
    /// The application name is checked later, by
    /// [`DfpClientBuilder::build`].
    pub fn into_builder(self) -> Result<DfpClientBuilder, ClientError> {
        let application_name = self
            .application_name
            .ok_or_else(|| ClientError::config("application_name is required"))?;

        let mut builder = match (
            self.access_token,
            self.client_id,
            self.client_secret,
            self.refresh_token,
        ) {
            (Some(token), _, _, _) => {
                DfpClientBuilder::new(AccessTokenCredentials::new(&token)?, application_name)
            }
            (None, Some(client_id), Some(client_secret), Some(refresh_token)) => {
                let mut credentials =
                    RefreshTokenCredentials::new(client_id, client_secret, refresh_token)?;
                if let Some(proxy) = &self.https_proxy {
                    credentials = credentials
                        .with_transport(HyperTransport::builder().https_proxy(proxy.as_str()).build()?);
                }
                DfpClientBuilder::new(credentials, application_name)
            }
            _ => {
                return Err(ClientError::config(
                    "credentials missing: set access_token, or client_id, client_secret and refresh_token",
                ));
            }
        };

        if let Some(network_code) = self.network_code {
            builder = builder.network_code(network_code);
        }
        if let Some(proxy) = self.https_proxy {
            builder = builder.https_proxy(proxy);
        }
        builder = builder.enable_compression(self.enable_compression);
        for (name, value) in self.custom_http_headers {
            builder = builder.custom_http_header(name, value);
        }
        Ok(builder)
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    use serde::de::Error;

    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
ad_manager:
  application_name: Acme Trafficker
  network_code: 1234
  https_proxy: proxy.internal:3128
  enable_compression: true
  custom_http_headers:
    x-team: ads
  client_id: 123.apps.googleusercontent.com
  client_secret: s3cret
  refresh_token: 1/abc
  path_to_private_key_file: /tmp/key.json
"#;

    #[test]
    fn test_parse_full_section() {
        let config = ClientConfig::parse(FULL).unwrap();
        assert_eq!(config.application_name.as_deref(), Some("Acme Trafficker"));
        assert_eq!(config.network_code.as_deref(), Some("1234"));
        assert_eq!(config.https_proxy.as_deref(), Some("proxy.internal:3128"));
        assert!(config.enable_compression);
        assert_eq!(config.custom_http_headers["x-team"], "ads");
        assert_eq!(config.refresh_token.as_deref(), Some("1/abc"));
        assert_eq!(
            config.unknown_keys().collect::<Vec<_>>(),
            vec!["path_to_private_key_file"]
        );
    }

    #[test]
    fn test_legacy_section() {
        let config = ClientConfig::parse("dfp:\n  application_name: Old App\n  network_code: '42'\n").unwrap();
        assert_eq!(config.application_name.as_deref(), Some("Old App"));
        assert_eq!(config.network_code.as_deref(), Some("42"));
        assert!(!config.enable_compression);
    }

    #[test]
    fn test_missing_section() {
        assert!(matches!(
            ClientConfig::parse("adwords:\n  developer_token: x\n"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ClientConfig::parse("ad_manager: [unclosed"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_into_builder_requires_credentials() {
        let config = ClientConfig::parse("ad_manager:\n  application_name: Acme\n  client_id: id\n").unwrap();
        let err = config.into_builder().unwrap_err();
        assert!(err.to_string().contains("credentials missing"), "{err}");
    }

    #[test]
    fn test_into_builder_requires_application_name() {
        let config = ClientConfig::parse("ad_manager:\n  access_token: t\n").unwrap();
        assert!(matches!(config.into_builder(), Err(ClientError::Config(_))));
    }

    #[cfg(feature = "tls-ring")]
    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = ClientConfig::load(Some(file.path())).unwrap();
        let client = config.into_builder().unwrap().build().unwrap();
        assert_eq!(client.application_name(), "Acme Trafficker");
        assert_eq!(client.network_code(), Some("1234"));
        assert_eq!(client.https_proxy(), Some("proxy.internal:3128"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::load(Some(&dir.path().join("googleads.yaml")));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
