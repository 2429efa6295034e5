//! The normalized set of source files returned by a lookup.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Name used for the synthetic single file when the service reports no contract name.
pub const FALLBACK_CONTRACT_NAME: &str = "Contract";

/// Extension used for the synthetic single file when the service reports none.
pub const FALLBACK_EXTENSION: &str = "sol";

/// Verified sources of a contract, keyed by their path relative to the project root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceBundle {
    /// Name of the verified contract, if known.
    pub contract_name: Option<String>,
    /// File contents keyed by relative path. Never empty for a fetched bundle.
    pub files: BTreeMap<String, String>,
    /// Import remappings in their original order. `None` entries are kept as blank lines.
    pub remappings: Vec<Option<String>>,
}

impl SourceBundle {
    /// Name of the file holding the remappings, at the destination root.
    pub const REMAPPINGS_FILE: &'static str = "remappings.txt";

    /// Builds a bundle from a raw source payload.
    ///
    /// The payload is either a standard JSON input (`{"sources": {path: {"content"}},
    /// "settings": {"remappings"}}`, optionally wrapped in an extra pair of braces), a bare
    /// `{path: {"content"}}` map, or plain source text. Plain text, and JSON without any
    /// sources, become a single `{contract_name}.{ext}` file.
    pub fn from_payload(payload: &str, contract_name: Option<String>, ext: Option<&str>) -> Self {
        match parse_structured(payload) {
            Some(StructuredSources { files, remappings }) if !files.is_empty() => {
                trace!(target: "srcfetch::fetch", files = files.len(), remappings = remappings.len(), "structured source payload");
                Self { contract_name, files, remappings }
            }
            _ => {
                let file_name = single_file_name(contract_name.as_deref(), ext);
                trace!(target: "srcfetch::fetch", %file_name, "single file source payload");
                Self {
                    contract_name,
                    files: BTreeMap::from([(file_name, payload.to_string())]),
                    remappings: Vec::new(),
                }
            }
        }
    }

    /// Returns the contents of `remappings.txt`, or `None` if there are no remappings.
    pub fn remappings_txt(&self) -> Option<String> {
        if self.remappings.is_empty() {
            return None;
        }
        Some(
            self.remappings
                .iter()
                .map(|remapping| remapping.as_deref().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Returns every file to write: the sources followed by `remappings.txt`, if any.
    pub fn entries(&self) -> Vec<(&str, String)> {
        let mut entries: Vec<(&str, String)> =
            self.files.iter().map(|(path, content)| (path.as_str(), content.clone())).collect();
        if let Some(remappings) = self.remappings_txt() {
            entries.push((Self::REMAPPINGS_FILE, remappings));
        }
        entries
    }
}

fn single_file_name(contract_name: Option<&str>, ext: Option<&str>) -> String {
    let name = contract_name.filter(|n| !n.is_empty()).unwrap_or(FALLBACK_CONTRACT_NAME);
    let ext = ext.map(|e| e.trim_start_matches('.')).filter(|e| !e.is_empty());
    format!("{name}.{}", ext.unwrap_or(FALLBACK_EXTENSION))
}

struct StructuredSources {
    files: BTreeMap<String, String>,
    remappings: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct SourceEntry {
    content: String,
}

#[derive(Default, Deserialize)]
struct Settings {
    #[serde(default)]
    remappings: Option<Vec<Option<String>>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    StandardJson {
        sources: BTreeMap<String, SourceEntry>,
        #[serde(default)]
        settings: Option<Settings>,
    },
    Sources(BTreeMap<String, SourceEntry>),
}

fn parse_structured(payload: &str) -> Option<StructuredSources> {
    let trimmed = payload.trim();
    // Etherscan wraps standard JSON input in a second pair of braces.
    let unwrapped = trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .map(|inner| format!("{{{inner}}}"));
    let json = unwrapped.as_deref().unwrap_or(trimmed);

    let (sources, settings) = match serde_json::from_str::<Payload>(json).ok()? {
        Payload::StandardJson { sources, settings } => (sources, settings.unwrap_or_default()),
        Payload::Sources(sources) => (sources, Settings::default()),
    };
    Some(StructuredSources {
        files: sources.into_iter().map(|(path, entry)| (path, entry.content)).collect(),
        remappings: settings.remappings.unwrap_or_default(),
    })
}
