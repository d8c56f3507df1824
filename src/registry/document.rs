//! Typed model of `customIcons/data.json`.
//!
//! The document maps icon ids to [`IconRecord`]s:
//!
//! ```json
//! {
//!   "6F1C...": { "url": "/path/to/images/6F1C....png", "nickname": "Icon 1", "padding": 0 }
//! }
//! ```
//!
//! Decoding is lenient: a missing or malformed file is an empty document and
//! individual malformed entries are dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::RegistryError;

/// Metadata for one custom icon. The id is the key in [`RegistryDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconRecord {
    /// Absolute path of the copied image owned by the registry.
    #[serde(rename = "url")]
    pub source_path: PathBuf,

    /// User-facing name.
    pub nickname: String,

    /// Extra menu-bar spacing in points.
    #[serde(default, deserialize_with = "lenient_padding")]
    #[cfg_attr(feature = "jsonschema", schemars(with = "u32"))]
    pub padding: u32,
}

fn lenient_padding<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(0))
}

/// The whole registry document, keyed by icon id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(transparent)]
pub struct RegistryDocument {
    pub entries: BTreeMap<String, IconRecord>,
}

impl RegistryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a document, treating anything unreadable as empty.
    pub fn decode(json: &str) -> Self {
        let root = match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(root)) => root,
            Ok(_) => {
                tracing::warn!("registry document is not a JSON object, treating as empty");
                return Self::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "registry document is malformed, treating as empty");
                return Self::new();
            }
        };

        let mut entries = BTreeMap::new();
        for (id, value) in root {
            match serde_json::from_value::<IconRecord>(value) {
                Ok(record) => {
                    entries.insert(id, record);
                }
                Err(e) => tracing::warn!(id = %id, error = %e, "dropping malformed registry entry"),
            }
        }
        Self { entries }
    }

    /// Loads the document at `path`. A missing file is an empty document.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::decode(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read registry document");
                Self::new()
            }
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Replaces the file at `path` with this document.
    ///
    /// The JSON is written to a sibling temporary file which is then renamed
    /// over the target, so readers never observe a half-written document.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let json = self.encode()?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| RegistryError::io("write", &tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary registry document");
            }
            return Err(RegistryError::io("replace", path, e));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&IconRecord> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut IconRecord> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, record: IconRecord) {
        self.entries.insert(id.into(), record);
    }

    pub fn remove(&mut self, id: &str) -> Option<IconRecord> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
