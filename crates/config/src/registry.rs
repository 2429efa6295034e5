//! Explorer hostname to chain id lookup table.

use crate::{ChainId, error::RegistryError};
use srcfetch_common::fs;
use std::{collections::BTreeMap, path::Path};

/// The registry shipped with the binary.
const BUNDLED_REGISTRY: &str = include_str!("../data/chains.json");

/// Maps block explorer hostnames to the numeric id of the chain they index.
///
/// The table is loaded once and only ever read afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainRegistry {
    hosts: BTreeMap<String, u64>,
}

impl ChainRegistry {
    /// Creates a registry from `(hostname, chain id)` pairs.
    pub fn new(hosts: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|(host, id)| (host.into().to_ascii_lowercase(), id))
                .collect(),
        }
    }

    /// Returns the registry bundled with this crate.
    pub fn bundled() -> Result<Self, RegistryError> {
        Self::from_json(BUNDLED_REGISTRY)
    }

    /// Parses a JSON object of `hostname -> chain id`.
    pub fn from_json(s: &str) -> Result<Self, RegistryError> {
        let hosts: BTreeMap<String, u64> = serde_json::from_str(s)?;
        Ok(Self::new(hosts))
    }

    /// Reads a registry file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let hosts: BTreeMap<String, u64> = fs::read_json_file(path.as_ref())?;
        trace!(target: "srcfetch::config", path = %path.as_ref().display(), hosts = hosts.len(), "loaded chain registry");
        Ok(Self::new(hosts))
    }

    /// Returns the chain indexed by the explorer at `host`.
    ///
    /// Falls back to the bare domain when `host` carries a `www.` prefix that is not registered.
    pub fn lookup(&self, host: &str) -> Option<ChainId> {
        let host = host.to_ascii_lowercase();
        self.hosts
            .get(&host)
            .or_else(|| host.strip_prefix("www.").and_then(|bare| self.hosts.get(bare)))
            .copied()
            .map(ChainId::Id)
    }

    /// Returns the number of registered hostnames.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if no hostname is registered.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
