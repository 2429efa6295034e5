//! Config and registry errors.

use srcfetch_common::errors::FsPathError;
use std::{collections::HashSet, error::Error, fmt};

/// The message shown when the config could not be extracted from the figment.
pub const FAILED_TO_EXTRACT_CONFIG_MSG: &str = "failed to extract srcfetch config:";

/// Represents a failed attempt to extract `Config` from a `Figment`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractConfigError {
    /// error thrown when extracting the `Config`
    pub(crate) error: figment::Error,
}

impl ExtractConfigError {
    /// Wraps the figment error
    pub fn new(error: figment::Error) -> Self {
        Self { error }
    }
}

impl fmt::Display for ExtractConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unique = HashSet::with_capacity(self.error.count());
        writeln!(f, "{FAILED_TO_EXTRACT_CONFIG_MSG}")?;
        for err in self.error.clone() {
            let mut msg = err.to_string();
            if !err.path.is_empty() {
                // the path holds the key, e.g. `["source_api_url"]`
                msg.push_str(&format!(" for setting `{}`", err.path.join(".")));
            }
            if unique.insert(msg.clone()) {
                writeln!(f, "{msg}")?;
            }
        }
        Ok(())
    }
}

impl Error for ExtractConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(&self.error)
    }
}

/// Errors that can occur while loading a chain registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error(transparent)]
    Fs(#[from] FsPathError),
    /// The registry is not a JSON object of hostname to numeric chain id.
    #[error("invalid chain registry: {0}")]
    Parse(#[from] serde_json::Error),
}
