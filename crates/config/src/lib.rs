//! # srcfetch-config
//!
//! Configuration for srcfetch: the layered [`Config`], the [`ChainId`] type and the explorer
//! [`ChainRegistry`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Re-exported so that consumers can build providers without depending on `figment` directly.
pub use figment;

mod chain;
pub use chain::ChainId;

pub mod error;
pub use error::{ExtractConfigError, RegistryError};

mod registry;
pub use registry::ChainRegistry;

/// Settings for a single srcfetch invocation.
///
/// Values are layered, lowest priority first: built-in defaults, the global
/// `~/.srcfetch/srcfetch.toml`, the local `srcfetch.toml` and `SRCFETCH_` prefixed environment
/// variables. Command line flags are merged on top by the binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Chain used for bare addresses when no chain is given on the command line.
    pub default_chain: ChainId,
    /// Base URL of the source lookup service.
    pub source_api_url: String,
    /// The aggregator hostname whose paths encode `/{chain}/{address}` directly.
    pub aggregator_host: String,
    /// Optional `hostname -> chain id` JSON file replacing the bundled registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_registry: Option<PathBuf>,
    /// Whether existing destination files are merged instead of refused.
    pub merge: bool,
}

impl Config {
    /// The name of the local config file.
    pub const FILE_NAME: &'static str = "srcfetch.toml";

    /// The name of the directory holding the global config.
    pub const DIR_NAME: &'static str = ".srcfetch";

    /// The environment variable prefix for config keys.
    pub const ENV_PREFIX: &'static str = "SRCFETCH_";

    /// Env key naming an alternative local config file.
    pub const CONFIG_ENV_KEY: &'static str = "CONFIG";

    /// Env key switching the error report to its verbose form.
    pub const DEBUG_ENV_KEY: &'static str = "DEBUG";

    /// The default source lookup service.
    pub const DEFAULT_SOURCE_API_URL: &'static str = "https://contract.tools";

    /// The default aggregator host.
    pub const DEFAULT_AGGREGATOR_HOST: &'static str = "contract.tools";

    /// Attempts to extract a `Config` from `provider`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use figment::providers::{Format, Toml};
    /// use srcfetch_config::Config;
    ///
    /// // Use the default `Figment`, but allow values from `other.toml` to supersede its values.
    /// let figment = Config::figment().merge(Toml::file("other.toml"));
    ///
    /// let config = Config::try_from(figment);
    /// ```
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        trace!(target: "srcfetch::config", "load config with provider: {:?}", provider.metadata());
        Figment::from(provider).extract::<Self>().map_err(ExtractConfigError::new)
    }

    /// Returns the default figment rooted at the current working directory.
    pub fn figment() -> Figment {
        Self::figment_with_root(".")
    }

    /// Returns the layered figment, reading the local config file from `root`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::from(Self::default());

        if let Some(global_toml) = Self::global_config_file().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_toml));
        }

        let local_toml = std::env::var_os(Self::env_var(Self::CONFIG_ENV_KEY))
            .map(PathBuf::from)
            .unwrap_or_else(|| root.as_ref().join(Self::FILE_NAME));
        figment.merge(Toml::file(local_toml)).merge(
            Env::prefixed(Self::ENV_PREFIX).ignore(&[Self::CONFIG_ENV_KEY, Self::DEBUG_ENV_KEY]),
        )
    }

    /// Returns the full environment variable name for `key`, e.g. `SRCFETCH_DEBUG`.
    pub fn env_var(key: &str) -> String {
        format!("{}{key}", Self::ENV_PREFIX)
    }

    /// Returns the path of the global config directory, `~/.srcfetch`.
    pub fn global_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(Self::DIR_NAME))
    }

    /// Returns the path of the global config file, `~/.srcfetch/srcfetch.toml`.
    pub fn global_config_file() -> Option<PathBuf> {
        Self::global_dir().map(|p| p.join(Self::FILE_NAME))
    }

    /// Loads the configured chain registry, or the bundled one if none is configured.
    pub fn chain_registry(&self) -> Result<ChainRegistry, RegistryError> {
        let registry = match &self.chain_registry {
            Some(path) => ChainRegistry::load(path)?,
            None => ChainRegistry::bundled()?,
        };
        debug!(target: "srcfetch::config", hosts = registry.len(), path = ?self.chain_registry, "loaded chain registry");
        Ok(registry)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_chain: ChainId::default(),
            source_api_url: Self::DEFAULT_SOURCE_API_URL.to_string(),
            aggregator_host: Self::DEFAULT_AGGREGATOR_HOST.to_string(),
            chain_registry: None,
            merge: false,
        }
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("srcfetch config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
