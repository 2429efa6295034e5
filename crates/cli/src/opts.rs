//! Shared command line options.

use clap::Parser;
use srcfetch_config::{
    ChainId, Config, ExtractConfigError,
    figment::{
        self, Figment, Metadata, Profile,
        value::{Dict, Map, Value},
    },
};
use std::path::PathBuf;

/// Options that override the layered [`Config`].
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Lookup options")]
pub struct LookupOpts {
    /// The chain name or chain ID used for bare addresses.
    ///
    /// Ignored when the contract is given as a URL.
    #[arg(long, value_name = "NAME_OR_ID", env = "SRCFETCH_CHAIN")]
    pub chain: Option<ChainId>,

    /// Base URL of the source lookup service.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to a JSON file mapping explorer hostnames to chain IDs.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Hostname treated as the `/{chain}/{address}` aggregator.
    #[arg(long, value_name = "HOST")]
    pub aggregator_host: Option<String>,
}

impl LookupOpts {
    /// Returns the config keys set on the command line.
    pub fn dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(chain) = &self.chain {
            let value: Value = match chain {
                ChainId::Id(id) => (*id).into(),
                ChainId::Named(name) => name.clone().into(),
            };
            dict.insert("default_chain".into(), value);
        }
        if let Some(url) = &self.api_url {
            dict.insert("source_api_url".into(), url.clone().into());
        }
        if let Some(path) = &self.registry {
            dict.insert("chain_registry".into(), path.to_string_lossy().into_owned().into());
        }
        if let Some(host) = &self.aggregator_host {
            dict.insert("aggregator_host".into(), host.clone().into());
        }
        dict
    }

    /// Returns the default figment with these options merged on top.
    pub fn figment(&self) -> Figment {
        Config::figment().merge(self.clone())
    }

    /// Loads the config with these options applied.
    pub fn load_config(&self) -> Result<Config, ExtractConfigError> {
        Config::try_from(self.figment())
    }
}

impl figment::Provider for LookupOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("LookupOpts")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Default, self.dict())]))
    }
}
