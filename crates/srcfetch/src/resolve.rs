//! Turns a command line contract reference into a `(chain, address)` pair.
//!
//! A reference is one of:
//! - a bare address, `0x` followed by 40 hex digits,
//! - an aggregator URL, `https://{aggregator}/{chain}/{address}`,
//! - a block explorer URL whose host is listed in the [`ChainRegistry`].

use regex::Regex;
use srcfetch_config::{ChainId, ChainRegistry};
use std::sync::LazyLock;
use url::Url;

/// Matches a hex encoded 20 byte address.
pub static RE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap());

/// Path segments after which explorers place the contract address.
const ADDRESS_MARKERS: [&str; 3] = ["address", "token", "contract"];

/// Returns `true` if `s` is a `0x` prefixed, 40 hex digit address.
pub fn is_address(s: &str) -> bool {
    RE_ADDRESS.is_match(s)
}

/// Errors returned when a reference cannot be resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("`{0}` is neither a contract address nor a URL")]
    InvalidAddress(String),
    #[error("URL `{0}` has no host")]
    MissingHost(String),
    #[error("aggregator URL `{0}` must have the form https://<host>/<chain>/<address>")]
    MissingAggregatorSegments(String),
    #[error("`{address}` in aggregator URL `{url}` is not a contract address")]
    InvalidAggregatorAddress { url: String, address: String },
    #[error("unsupported explorer domain `{0}`")]
    UnsupportedDomain(String),
    #[error("no contract address found in `{0}`")]
    AddressNotFound(String),
}

/// The outcome of resolving a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The contract address.
    pub address: String,
    /// The chain, if the reference carried one.
    pub chain: Option<ChainId>,
}

impl ResolvedTarget {
    /// Returns the chain of this target, or `default` if the reference carried none.
    pub fn chain_or(&self, default: &ChainId) -> ChainId {
        self.chain.clone().unwrap_or_else(|| default.clone())
    }
}

/// How the address and chain are encoded in a URL, decided once from its host.
#[derive(Clone, Debug, PartialEq, Eq)]
enum UrlKind {
    /// `/{chain}/{address}`, chain taken verbatim.
    Aggregator,
    /// A registered explorer; the chain comes from the registry.
    GenericExplorer(ChainId),
}

/// Resolves contract references against a chain registry.
#[derive(Clone, Debug)]
pub struct Resolver {
    registry: ChainRegistry,
    aggregator_host: String,
}

impl Resolver {
    /// Creates a resolver for the given registry and aggregator host.
    pub fn new(registry: ChainRegistry, aggregator_host: impl Into<String>) -> Self {
        Self { registry, aggregator_host: aggregator_host.into() }
    }

    /// Resolves `token` to a contract address and, for URLs, its chain.
    ///
    /// Anything that does not parse as a URL is treated as a bare address.
    pub fn resolve(&self, token: &str) -> Result<ResolvedTarget, ResolveError> {
        let token = token.trim();
        let url = match Url::parse(token) {
            Ok(url) => url,
            Err(_) if is_address(token) => {
                trace!(target: "srcfetch::resolve", address = token, "bare address");
                return Ok(ResolvedTarget { address: token.to_string(), chain: None });
            }
            // `etherscan.io/address/0x..` without a scheme
            Err(_) if looks_like_schemeless_url(token) => Url::parse(&format!("https://{token}"))
                .map_err(|_| ResolveError::InvalidAddress(token.to_string()))?,
            Err(_) => return Err(ResolveError::InvalidAddress(token.to_string())),
        };
        self.resolve_url(&url)
    }

    /// Resolves an already parsed URL.
    pub fn resolve_url(&self, url: &Url) -> Result<ResolvedTarget, ResolveError> {
        let segments = path_segments(url);
        let target = match self.classify(url)? {
            UrlKind::Aggregator => resolve_aggregator(url, &segments)?,
            UrlKind::GenericExplorer(chain) => resolve_explorer(url, &segments, chain)?,
        };
        debug!(target: "srcfetch::resolve", %url, address = %target.address, chain = ?target.chain, "resolved URL");
        Ok(target)
    }

    fn classify(&self, url: &Url) -> Result<UrlKind, ResolveError> {
        let host = url.host_str().ok_or_else(|| ResolveError::MissingHost(url.to_string()))?;
        if host.eq_ignore_ascii_case(&self.aggregator_host) {
            return Ok(UrlKind::Aggregator);
        }
        self.registry
            .lookup(host)
            .map(UrlKind::GenericExplorer)
            .ok_or_else(|| ResolveError::UnsupportedDomain(host.to_string()))
    }
}

/// The aggregator accepts chain names and ids alike, so the chain is not checked against the
/// registry.
fn resolve_aggregator(url: &Url, segments: &[&str]) -> Result<ResolvedTarget, ResolveError> {
    let [chain, address, ..] = segments else {
        return Err(ResolveError::MissingAggregatorSegments(url.to_string()));
    };
    if !is_address(address) {
        return Err(ResolveError::InvalidAggregatorAddress {
            url: url.to_string(),
            address: address.to_string(),
        });
    }
    let chain = chain.parse().unwrap_or_else(|never| match never {});
    Ok(ResolvedTarget { address: address.to_string(), chain: Some(chain) })
}

/// The segment following a marker is taken as is, even if it is not address shaped.
fn resolve_explorer(
    url: &Url,
    segments: &[&str],
    chain: ChainId,
) -> Result<ResolvedTarget, ResolveError> {
    let after_marker = segments
        .windows(2)
        .find(|pair| ADDRESS_MARKERS.iter().any(|marker| pair[0].eq_ignore_ascii_case(marker)))
        .map(|pair| pair[1]);
    let address = after_marker
        .or_else(|| segments.iter().copied().find(|segment| is_address(segment)))
        .ok_or_else(|| ResolveError::AddressNotFound(url.to_string()))?;
    Ok(ResolvedTarget { address: address.to_string(), chain: Some(chain) })
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn looks_like_schemeless_url(token: &str) -> bool {
    token.split_once('/').is_some_and(|(host, _)| host.contains('.') && !host.contains(' '))
}
