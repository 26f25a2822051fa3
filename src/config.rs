//! Client configuration.
//!
//! Settings come from `config.toml` in the client's config directory, then
//! from the environment. Anything left unset keeps its default.

use std::{
    fs, io,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use derive_getters::Getters;
use directories_next::ProjectDirs;
use plural_http::HttpServiceConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Endpoint of the public registry.
pub const DEFAULT_ENDPOINT: &str = "https://app.plural.sh/gql";
/// Nodes requested per page when walking a connection.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(100) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "PLURAL_ENDPOINT";
/// Overrides the configured page size.
pub const PAGE_SIZE_ENV: &str = "PLURAL_PAGE_SIZE";

const CONFIG_FILE: &str = "config.toml";

/// Errors that may occur while loading a [`ClientConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a configuration directory for this platform")]
    ConfigDirNotFound,

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("`{value}` is not a valid endpoint: {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("`{value}` is not a valid page size")]
    InvalidPageSize { value: String },

    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// The on-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoint: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
    accept_invalid_certificates: Option<bool>,
    user_agent: Option<String>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(FileConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything needed to talk to a registry.
#[derive(Clone, Debug, Getters, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: Url,
    page_size: NonZeroU32,
    timeout: Duration,
    accept_invalid_certificates: bool,
    user_agent: Option<String>,
}

#[buildstructor::buildstructor]
impl ClientConfig {
    /// Creates a config for `endpoint`; unset options take their defaults.
    #[builder]
    pub fn new(
        endpoint: Url,
        page_size: Option<NonZeroU32>,
        timeout: Option<Duration>,
        accept_invalid_certificates: Option<bool>,
        user_agent: Option<String>,
    ) -> ClientConfig {
        ClientConfig {
            endpoint,
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            accept_invalid_certificates: accept_invalid_certificates.unwrap_or_default(),
            user_agent,
        }
    }

    /// Loads the config from `override_home` (or the platform config
    /// directory) and the process environment.
    pub fn load(override_home: Option<&Path>) -> Result<ClientConfig, ConfigError> {
        ClientConfig::load_with_env(override_home, |key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::load`], reading environment overrides through `env`.
    pub fn load_with_env(
        override_home: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        let path = config_home(override_home)?.join(CONFIG_FILE);
        let file = FileConfig::read(&path)?;

        let endpoint = env(ENDPOINT_ENV)
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)
            .map_err(|source| ConfigError::InvalidEndpoint { value: endpoint, source })?;

        let page_size = match env(PAGE_SIZE_ENV) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidPageSize { value })?,
            ),
            None => file.page_size,
        };
        let page_size = page_size
            .map(|size| NonZeroU32::new(size).ok_or(ConfigError::ZeroPageSize))
            .transpose()?;

        let config = ClientConfig::builder()
            .endpoint(endpoint)
            .and_page_size(page_size)
            .and_timeout(file.timeout_secs.map(Duration::from_secs))
            .and_accept_invalid_certificates(file.accept_invalid_certificates)
            .and_user_agent(file.user_agent)
            .build();
        tracing::debug!(
            endpoint = %config.endpoint,
            page_size = config.page_size.get(),
            "loaded client config"
        );
        Ok(config)
    }

    /// The HTTP settings for the default transport.
    pub fn http_config(&self) -> HttpServiceConfig {
        HttpServiceConfig::builder()
            .accept_invalid_certificates(self.accept_invalid_certificates)
            .timeout(self.timeout)
            .and_user_agent(self.user_agent.clone())
            .build()
    }
}

/// The directory `config.toml` is read from.
///
/// Lin: /home/alice/.config/plural
/// Win: C:\Users\Alice\AppData\Roaming\Plural\plural\config
/// Mac: /Users/Alice/Library/Application Support/sh.Plural.plural
pub fn config_home(override_home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match override_home {
        Some(home) => Ok(home.to_path_buf()),
        None => Ok(ProjectDirs::from("sh", "Plural", "plural")
            .ok_or(ConfigError::ConfigDirNotFound)?
            .config_dir()
            .to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, num::NonZeroU32, time::Duration};

    use assert_fs::{prelude::*, TempDir};
    use indoc::indoc;
    use rstest::{fixture, rstest};
    use speculoos::prelude::*;
    use url::Url;

    use super::{ClientConfig, ConfigError, DEFAULT_ENDPOINT, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};

    #[fixture]
    fn home() -> TempDir {
        TempDir::new().unwrap()
    }

    fn load(home: &TempDir, env: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ClientConfig::load_with_env(Some(home.path()), |key| env.get(key).cloned())
    }

    #[rstest]
    fn missing_file_uses_defaults(home: TempDir) {
        let config = load(&home, &[]).unwrap();

        assert_that!(config.endpoint().as_str()).is_equal_to(DEFAULT_ENDPOINT);
        assert_that!(*config.page_size()).is_equal_to(DEFAULT_PAGE_SIZE);
        assert_that!(*config.timeout()).is_equal_to(DEFAULT_TIMEOUT);
        assert!(!*config.accept_invalid_certificates());
    }

    #[rstest]
    fn file_values_are_applied(home: TempDir) {
        home.child("config.toml")
            .write_str(indoc! {r#"
                endpoint = "https://registry.example.com/gql"
                page_size = 25
                timeout_secs = 5
                accept_invalid_certificates = true
                user_agent = "deploy-bot/1.0"
            "#})
            .unwrap();

        let config = load(&home, &[]).unwrap();

        assert_that!(config.endpoint().as_str()).is_equal_to("https://registry.example.com/gql");
        assert_that!(config.page_size().get()).is_equal_to(25);
        assert_that!(*config.timeout()).is_equal_to(Duration::from_secs(5));
        assert!(*config.accept_invalid_certificates());
        assert_that!(config.user_agent().as_deref()).is_equal_to(Some("deploy-bot/1.0"));
    }

    #[rstest]
    fn environment_overrides_the_file(home: TempDir) {
        home.child("config.toml")
            .write_str("endpoint = \"https://registry.example.com/gql\"\npage_size = 25\n")
            .unwrap();

        let config = load(
            &home,
            &[
                ("PLURAL_ENDPOINT", "http://localhost:4000/gql"),
                ("PLURAL_PAGE_SIZE", "7"),
            ],
        )
        .unwrap();

        assert_that!(config.endpoint().as_str()).is_equal_to("http://localhost:4000/gql");
        assert_that!(*config.page_size()).is_equal_to(NonZeroU32::new(7).unwrap());
    }

    #[rstest]
    #[case::from_env(&[("PLURAL_PAGE_SIZE", "0")], "")]
    #[case::from_file(&[], "page_size = 0\n")]
    fn zero_page_size_is_rejected(
        home: TempDir,
        #[case] env: &[(&str, &str)],
        #[case] file: &str,
    ) {
        home.child("config.toml").write_str(file).unwrap();

        let err = load(&home, env).unwrap_err();

        assert!(matches!(err, ConfigError::ZeroPageSize));
    }

    #[rstest]
    #[case::not_a_number("lots")]
    #[case::negative("-1")]
    fn unparseable_page_size_is_rejected(home: TempDir, #[case] value: &str) {
        let err = load(&home, &[("PLURAL_PAGE_SIZE", value)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPageSize { .. }));
    }

    #[rstest]
    fn bad_endpoints_are_rejected(home: TempDir) {
        let err = load(&home, &[("PLURAL_ENDPOINT", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[rstest]
    fn unknown_keys_are_rejected(home: TempDir) {
        home.child("config.toml").write_str("api_key = \"secret\"\n").unwrap();

        let err = load(&home, &[]).unwrap_err();

        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn http_config_carries_transport_settings() {
        let config = ClientConfig::builder()
            .endpoint(Url::parse("https://registry.example.com/gql").unwrap())
            .timeout(Duration::from_secs(3))
            .accept_invalid_certificates(true)
            .build();

        let http = config.http_config();

        assert_that!(*http.timeout()).is_equal_to(Some(Duration::from_secs(3)));
        assert_that!(*http.accept_invalid_certificates()).is_equal_to(Some(true));
        assert!(http.user_agent().is_none());
    }
}
