use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt, str::FromStr};

/// The chain a contract lives on, as understood by the source lookup service.
///
/// The service accepts both numeric chain ids and chain names, so both forms are carried through
/// unchanged; a name is never mapped to an id or vice versa.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChainId {
    /// A numeric chain id, e.g. `1`.
    Id(u64),
    /// A chain name, kept verbatim, e.g. `ethereum`.
    Named(String),
}

impl ChainId {
    /// The name used when no chain is given.
    pub const DEFAULT_NAME: &'static str = "ethereum";
}

impl Default for ChainId {
    fn default() -> Self {
        Self::Named(Self::DEFAULT_NAME.to_string())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for ChainId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<u64>().map(Self::Id).unwrap_or_else(|_| Self::Named(s.to_string())))
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Id(id) => serializer.serialize_u64(*id),
            Self::Named(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ChainIdRepr {
            Id(u64),
            Named(String),
        }

        Ok(match ChainIdRepr::deserialize(deserializer)? {
            ChainIdRepr::Id(id) => Self::Id(id),
            ChainIdRepr::Named(s) => s.parse().unwrap_or_else(|never| match never {}),
        })
    }
}
