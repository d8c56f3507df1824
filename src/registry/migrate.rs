//! One-time move of the registry out of the legacy shared container.
//!
//! Earlier releases kept `customIcons/` inside an app-group container. The
//! first launch of a newer release copies that tree to the per-user data
//! directory and points every stored `url` at the new location.
//!
//! The move is attempted at most once per installation: the
//! `migratedFromGroupContainer` preference records that an attempt happened,
//! whatever its outcome.

use std::path::{Path, PathBuf};

use super::{RegistryDocument, RegistryError, StoreLayout};
use crate::prefs::Preferences;

/// App-group identifier of the legacy shared container.
pub const LEGACY_GROUP_ID: &str = "group.com.justinhamilton.Menu-Bar-Splitter.sharedData";

/// Returns the legacy `customIcons` directory inside the group container.
pub fn default_legacy_dir() -> Option<PathBuf> {
    let dirs = directories::BaseDirs::new()?;
    Some(
        dirs.home_dir()
            .join("Library/Group Containers")
            .join(LEGACY_GROUP_ID)
            .join("Library/Application Support")
            .join(super::APP_DIR_NAME)
            .join("customIcons"),
    )
}

/// Whether the migration has been attempted on this installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    NotAttempted,
    Attempted,
}

impl MigrationState {
    pub fn load(prefs: &Preferences) -> Self {
        if prefs.migrated_from_group_container() {
            Self::Attempted
        } else {
            Self::NotAttempted
        }
    }

    /// Takes the only transition, `NotAttempted -> Attempted`, and persists it.
    fn mark_attempted(prefs: &mut Preferences) -> Self {
        if let Err(e) = prefs.set_migrated_from_group_container(true) {
            tracing::warn!(error = %e, "failed to record legacy migration attempt");
        }
        Self::Attempted
    }
}

/// What a call to [`migrate_if_needed`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// An earlier call already made the attempt.
    AlreadyAttempted,
    /// The new location already has a `data.json`.
    DestinationPopulated,
    /// There is no legacy store to copy.
    NoLegacyStore,
    /// The tree was copied and `rewritten` urls were updated.
    Migrated { rewritten: usize },
    /// The attempt failed; the message was logged.
    Failed(String),
}

/// Copies the legacy store into `layout` if this has never been attempted.
///
/// `legacy_dir` is the legacy `customIcons` directory; `None` means the
/// legacy container could not be located.
pub fn migrate_if_needed(
    prefs: &mut Preferences,
    layout: &StoreLayout,
    legacy_dir: Option<&Path>,
) -> MigrationOutcome {
    if MigrationState::load(prefs) == MigrationState::Attempted {
        return MigrationOutcome::AlreadyAttempted;
    }

    let outcome = attempt(layout, legacy_dir);
    MigrationState::mark_attempted(prefs);

    match &outcome {
        MigrationOutcome::Migrated { rewritten } => {
            tracing::info!(rewritten, "migrated custom icons from group container");
        }
        MigrationOutcome::Failed(reason) => {
            tracing::error!(reason = %reason, "migration from group container failed");
        }
        other => tracing::debug!(outcome = ?other, "no legacy migration needed"),
    }
    outcome
}

fn attempt(layout: &StoreLayout, legacy_dir: Option<&Path>) -> MigrationOutcome {
    if layout.data_file().exists() {
        return MigrationOutcome::DestinationPopulated;
    }
    let Some(legacy_dir) = legacy_dir.filter(|dir| dir.is_dir()) else {
        return MigrationOutcome::NoLegacyStore;
    };

    match copy_and_rewrite(layout, legacy_dir) {
        Ok(rewritten) => MigrationOutcome::Migrated { rewritten },
        Err(e) => MigrationOutcome::Failed(e.to_string()),
    }
}

fn copy_and_rewrite(layout: &StoreLayout, legacy_dir: &Path) -> Result<usize, RegistryError> {
    let base = layout.base_dir();
    std::fs::create_dir_all(base).map_err(|e| RegistryError::io("create", base, e))?;

    let new_dir = layout.custom_icons_dir();
    if !new_dir.exists() {
        copy_dir_all(legacy_dir, &new_dir)?;
    }

    let data_file = layout.data_file();
    if !data_file.exists() {
        return Ok(0);
    }

    let mut doc = RegistryDocument::load(&data_file);
    let mut rewritten = 0;
    for record in doc.entries.values_mut() {
        if let Ok(rest) = record.source_path.strip_prefix(legacy_dir) {
            record.source_path = new_dir.join(rest);
            rewritten += 1;
        }
    }
    doc.save(&data_file)?;
    Ok(rewritten)
}

/// Recursively copies the directory `from` to `to`.
fn copy_dir_all(from: &Path, to: &Path) -> Result<(), RegistryError> {
    std::fs::create_dir_all(to).map_err(|e| RegistryError::io("create", to, e))?;
    let entries = std::fs::read_dir(from).map_err(|e| RegistryError::io("read", from, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| RegistryError::io("read", from, e))?;
        let src = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| RegistryError::io("inspect", &src, e))?;

        if file_type.is_dir() {
            copy_dir_all(&src, &dest)?;
        } else {
            std::fs::copy(&src, &dest).map_err(|e| RegistryError::io("copy", &src, e))?;
        }
    }
    Ok(())
}
