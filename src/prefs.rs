//! Typed preference storage for the built-in separators.
//!
//! Settings live in a flat key/value store shared with the component that
//! draws the live menu bar. [`Preferences`] wraps a [`PreferenceBackend`] and
//! exposes one typed getter/setter per key, applying the default fallbacks
//! in a single place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::color::IconColor;

/// Preference key names. These are shared with the live menu-bar renderer.
pub mod keys {
    pub const LINE_THICKNESS: &str = "lineThickness";
    pub const LINE_HEIGHT: &str = "lineHeight";
    pub const LINE_COLOR: &str = "lineColor";
    pub const LINE_PADDING: &str = "linePadding";
    pub const DOT_THICKNESS: &str = "dotThickness";
    pub const DOT_COLOR: &str = "dotColor";
    pub const DOT_PADDING: &str = "dotPadding";
    pub const MIGRATED_FROM_GROUP_CONTAINER: &str = "migratedFromGroupContainer";
}

pub const DEFAULT_LINE_THICKNESS: f64 = 1.0;
pub const DEFAULT_DOT_THICKNESS: f64 = 4.0;

/// Errors from preference persistence.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("failed to write preferences to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// BuiltinKind
// ============================================================================

/// The two programmatically rendered separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Line,
    Dot,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 2] = [BuiltinKind::Line, BuiltinKind::Dot];

    /// Identifier used for the built-in entry in the icon library.
    pub fn id(self) -> &'static str {
        match self {
            Self::Line => "builtin-line",
            Self::Dot => "builtin-dot",
        }
    }

    /// Display name shown in the icon library.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Dot => "Dot",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    fn thickness_key(self) -> &'static str {
        match self {
            Self::Line => keys::LINE_THICKNESS,
            Self::Dot => keys::DOT_THICKNESS,
        }
    }

    fn color_key(self) -> &'static str {
        match self {
            Self::Line => keys::LINE_COLOR,
            Self::Dot => keys::DOT_COLOR,
        }
    }

    fn padding_key(self) -> &'static str {
        match self {
            Self::Line => keys::LINE_PADDING,
            Self::Dot => keys::DOT_PADDING,
        }
    }

    fn default_thickness(self) -> f64 {
        match self {
            Self::Line => DEFAULT_LINE_THICKNESS,
            Self::Dot => DEFAULT_DOT_THICKNESS,
        }
    }
}

// ============================================================================
// Backends
// ============================================================================

/// A flat key/value store holding JSON values.
pub trait PreferenceBackend {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError>;

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError>;
}

/// Process-local backend, used by tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Backend persisted as a single JSON object on disk.
///
/// The whole file is rewritten on every change. A missing or malformed file
/// loads as an empty store.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %path.display(), "preferences file is malformed, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read preferences file, starting empty");
                Map::new()
            }
        };
        Self { path, values }
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// Typed access to the separator preferences.
pub struct Preferences {
    backend: Box<dyn PreferenceBackend>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Preferences {
    pub fn new(backend: impl PreferenceBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn f64_value(&self, key: &str) -> Option<f64> {
        self.backend.get(key).and_then(|v| v.as_f64())
    }

    fn positive(&self, key: &str) -> Option<f64> {
        self.f64_value(key).filter(|v| *v > 0.0)
    }

    fn set_f64(&mut self, key: &str, value: f64) -> Result<(), PreferenceError> {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.backend.set(key, value)
    }

    /// Thickness (line width or dot diameter); non-positive values fall back
    /// to the kind's default.
    pub fn thickness(&self, kind: BuiltinKind) -> f64 {
        self.positive(kind.thickness_key())
            .unwrap_or_else(|| kind.default_thickness())
    }

    pub fn set_thickness(&mut self, kind: BuiltinKind, value: f64) -> Result<(), PreferenceError> {
        self.set_f64(kind.thickness_key(), value)
    }

    /// Explicit line height, or `None` for automatic.
    pub fn line_height(&self) -> Option<f64> {
        self.positive(keys::LINE_HEIGHT)
    }

    pub fn set_line_height(&mut self, value: Option<f64>) -> Result<(), PreferenceError> {
        match value {
            Some(v) => self.set_f64(keys::LINE_HEIGHT, v),
            None => self.backend.remove(keys::LINE_HEIGHT),
        }
    }

    /// Stored color, or `None` to follow the system template tone.
    pub fn color(&self, kind: BuiltinKind) -> Option<IconColor> {
        self.backend
            .get(kind.color_key())
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set_color(
        &mut self,
        kind: BuiltinKind,
        color: Option<IconColor>,
    ) -> Result<(), PreferenceError> {
        match color {
            Some(c) => self.backend.set(kind.color_key(), serde_json::to_value(c)?),
            None => self.backend.remove(kind.color_key()),
        }
    }

    pub fn padding(&self, kind: BuiltinKind) -> u32 {
        self.backend
            .get(kind.padding_key())
            .and_then(|v| v.as_u64())
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    }

    pub fn set_padding(&mut self, kind: BuiltinKind, value: u32) -> Result<(), PreferenceError> {
        self.backend.set(kind.padding_key(), Value::from(value))
    }

    pub fn migrated_from_group_container(&self) -> bool {
        self.backend
            .get(keys::MIGRATED_FROM_GROUP_CONTAINER)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn set_migrated_from_group_container(&mut self, value: bool) -> Result<(), PreferenceError> {
        self.backend
            .set(keys::MIGRATED_FROM_GROUP_CONTAINER, Value::Bool(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.thickness(BuiltinKind::Line), 1.0);
        assert_eq!(prefs.thickness(BuiltinKind::Dot), 4.0);
        assert_eq!(prefs.line_height(), None);
        assert_eq!(prefs.color(BuiltinKind::Line), None);
        assert_eq!(prefs.padding(BuiltinKind::Dot), 0);
        assert!(!prefs.migrated_from_group_container());
    }

    #[test]
    fn non_positive_values_fall_back() {
        let mut prefs = Preferences::in_memory();
        prefs.set_thickness(BuiltinKind::Line, 0.0).unwrap();
        prefs.set_line_height(Some(-3.0)).unwrap();
        assert_eq!(prefs.thickness(BuiltinKind::Line), 1.0);
        assert_eq!(prefs.line_height(), None);
    }

    #[test]
    fn typed_round_trip() {
        let mut prefs = Preferences::in_memory();
        prefs.set_thickness(BuiltinKind::Dot, 7.5).unwrap();
        prefs.set_line_height(Some(12.0)).unwrap();
        prefs.set_padding(BuiltinKind::Line, 9).unwrap();
        prefs
            .set_color(BuiltinKind::Dot, Some(IconColor::rgb(1, 2, 3)))
            .unwrap();

        assert_eq!(prefs.thickness(BuiltinKind::Dot), 7.5);
        assert_eq!(prefs.line_height(), Some(12.0));
        assert_eq!(prefs.padding(BuiltinKind::Line), 9);
        assert_eq!(prefs.color(BuiltinKind::Dot), Some(IconColor::rgb(1, 2, 3)));

        prefs.set_color(BuiltinKind::Dot, None).unwrap();
        assert_eq!(prefs.color(BuiltinKind::Dot), None);
    }

    #[test]
    fn corrupt_color_reads_as_absent() {
        let mut backend = MemoryBackend::new();
        backend.set(keys::LINE_COLOR, Value::from("not a color")).unwrap();
        let prefs = Preferences::new(backend);
        assert_eq!(prefs.color(BuiltinKind::Line), None);
    }

    #[test]
    fn builtin_ids_round_trip() {
        for kind in BuiltinKind::ALL {
            assert_eq!(BuiltinKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(BuiltinKind::from_id("something-else"), None);
    }

    #[test]
    fn json_file_backend_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("prefs.json");

        let mut prefs = Preferences::new(JsonFileBackend::open(&path));
        prefs.set_padding(BuiltinKind::Dot, 4).unwrap();
        prefs
            .set_color(BuiltinKind::Line, Some(IconColor::rgb(255, 0, 0)))
            .unwrap();
        prefs.set_migrated_from_group_container(true).unwrap();

        let reopened = Preferences::new(JsonFileBackend::open(&path));
        assert_eq!(reopened.padding(BuiltinKind::Dot), 4);
        assert_eq!(reopened.color(BuiltinKind::Line), Some(IconColor::rgb(255, 0, 0)));
        assert!(reopened.migrated_from_group_container());
    }

    #[test]
    fn json_file_backend_tolerates_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let prefs = Preferences::new(JsonFileBackend::open(&path));
        assert_eq!(prefs.thickness(BuiltinKind::Line), 1.0);
    }

    #[test]
    fn json_file_backend_tolerates_unreadable_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.json");
        std::fs::write(&path, [0xFF, 0xFE, 0x00, 0x7B]).unwrap();

        let prefs = Preferences::new(JsonFileBackend::open(&path));
        assert_eq!(prefs.padding(BuiltinKind::Line), 0);
        assert_eq!(prefs.color(BuiltinKind::Dot), None);
    }
}
