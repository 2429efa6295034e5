//! # srcfetch
//!
//! Downloads the verified sources of a contract, given its address or an explorer URL, and
//! writes them to a directory.
//!
//! The pipeline runs in three strictly sequential steps:
//! 1. [`Resolver::resolve`] turns the reference into an address and an optional chain,
//! 2. a [`SourceProvider`] fetches the [`SourceBundle`],
//! 3. [`materialize`] writes the bundle to disk.

#[macro_use]
extern crate tracing;

pub mod bundle;
pub use bundle::SourceBundle;

pub mod fetch;
pub use fetch::{FetchError, SourceApiClient, SourceProvider};

pub mod materialize;
pub use materialize::{
    FileOutcome, MaterializationPolicy, MaterializeError, MaterializeReport, materialize,
};

pub mod resolve;
pub use resolve::{ResolveError, ResolvedTarget, Resolver};

pub use srcfetch_config::ChainId;

use std::path::{Path, PathBuf};

/// Any failure of the download pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// A single download request.
#[derive(Clone, Debug)]
pub struct Download<'a> {
    /// The address or URL given by the user.
    pub reference: &'a str,
    /// Chain used when the reference does not name one.
    pub default_chain: &'a ChainId,
    /// Destination directory; defaults to a directory named after the contract.
    pub directory: Option<PathBuf>,
    /// How to treat existing files in the destination.
    pub policy: MaterializationPolicy,
}

/// The result of a successful [`Download`].
#[derive(Clone, Debug)]
pub struct Downloaded {
    /// The resolved contract.
    pub target: ResolvedTarget,
    /// The chain the sources were fetched from.
    pub chain: ChainId,
    /// The name of the contract, if the service reported one.
    pub contract_name: Option<String>,
    /// The directory the files were written to.
    pub directory: PathBuf,
    /// What happened to each file.
    pub report: MaterializeReport,
}

impl Download<'_> {
    /// Resolves, fetches and writes the sources.
    pub async fn run<P: SourceProvider + ?Sized>(
        self,
        resolver: &Resolver,
        provider: &P,
    ) -> Result<Downloaded, Error> {
        let target = resolver.resolve(self.reference)?;
        let chain = target.chain_or(self.default_chain);
        debug!(target: "srcfetch", address = %target.address, %chain, "fetching sources");

        let bundle = provider.fetch(&target.address, &chain).await?;
        let directory = self
            .directory
            .unwrap_or_else(|| default_directory(Path::new("."), &bundle, &target.address));
        let report = materialize(&bundle, &directory, self.policy).await?;

        Ok(Downloaded {
            target,
            chain,
            contract_name: bundle.contract_name,
            directory,
            report,
        })
    }
}

/// Returns `base/<contract name>`, or `base/<address>` if the contract name is unknown.
pub fn default_directory(base: &Path, bundle: &SourceBundle, address: &str) -> PathBuf {
    let name = bundle
        .contract_name
        .as_deref()
        .map(srcfetch_common::fs::sanitize_relative)
        .filter(|name| !name.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(address));
    base.join(name)
}
