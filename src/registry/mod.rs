//! On-disk registry of user-imported separator icons.
//!
//! The registry owns a directory tree under the per-user data directory:
//!
//! ```text
//! <base>/customIcons/data.json          id -> { url, nickname, padding }
//! <base>/customIcons/images/<id>.<ext>  copied image assets
//! ```
//!
//! Every mutation loads the whole document, changes it in memory and writes
//! it back in one piece. Image files are created before their entry is
//! written and removed before their entry is deleted.

pub mod document;
pub mod migrate;

pub use document::{IconRecord, RegistryDocument};
pub use migrate::{MigrationOutcome, MigrationState};

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::icon::{IconImage, MENU_BAR_HEIGHT};

/// Directory name under the user's data directory.
pub const APP_DIR_NAME: &str = "Menu-Bar-Splitter";

const CUSTOM_ICONS_DIR: &str = "customIcons";
const DATA_FILE: &str = "data.json";
const IMAGES_DIR: &str = "images";

/// Ids drawn from the generator before `add` gives up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode registry document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no unused icon id after {attempts} attempts")]
    IdsExhausted { attempts: usize },
}

impl RegistryError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// StoreLayout
// ============================================================================

/// Paths of the registry files below a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    base: PathBuf,
}

impl StoreLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The per-user location, e.g. `~/Library/Application Support/Menu-Bar-Splitter`.
    pub fn default_location() -> Option<Self> {
        let dirs = directories::BaseDirs::new()?;
        Some(Self::new(dirs.data_dir().join(APP_DIR_NAME)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn custom_icons_dir(&self) -> PathBuf {
        self.base.join(CUSTOM_ICONS_DIR)
    }

    pub fn data_file(&self) -> PathBuf {
        self.custom_icons_dir().join(DATA_FILE)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.custom_icons_dir().join(IMAGES_DIR)
    }
}

// ============================================================================
// CustomIcon
// ============================================================================

/// A registry entry whose image loaded successfully.
#[derive(Debug, Clone)]
pub struct CustomIcon {
    pub id: String,
    pub record: IconRecord,
    pub image: IconImage,
}

impl CustomIcon {
    pub fn nickname(&self) -> &str {
        &self.record.nickname
    }
}

// ============================================================================
// IconRegistry
// ============================================================================

type IdGenerator = Box<dyn FnMut() -> String>;

/// CRUD access to the custom icon registry.
pub struct IconRegistry {
    layout: StoreLayout,
    next_id: IdGenerator,
    bar_height: f32,
}

impl IconRegistry {
    /// Creates a registry rooted at `layout`. Nothing is touched on disk
    /// until the first write.
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            next_id: Box::new(|| uuid::Uuid::new_v4().to_string().to_uppercase()),
            bar_height: MENU_BAR_HEIGHT,
        }
    }

    /// Replaces the id source. Ids must be unique; ids already present in
    /// the document are skipped.
    pub fn with_id_generator(mut self, next_id: impl FnMut() -> String + 'static) -> Self {
        self.next_id = Box::new(next_id);
        self
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Whether `data.json` exists yet.
    pub fn is_initialized(&self) -> bool {
        self.layout.data_file().is_file()
    }

    /// Loads the raw document.
    pub fn document(&self) -> RegistryDocument {
        RegistryDocument::load(&self.layout.data_file())
    }

    /// Lists every entry whose image can be loaded, in id order.
    pub fn list(&self) -> Vec<CustomIcon> {
        self.document()
            .entries
            .into_iter()
            .filter_map(|(id, record)| self.load_icon(id, record))
            .collect()
    }

    /// Looks up a single listed icon.
    pub fn get(&self, id: &str) -> Option<CustomIcon> {
        let record = self.document().remove(id)?;
        self.load_icon(id.to_string(), record)
    }

    fn load_icon(&self, id: String, record: IconRecord) -> Option<CustomIcon> {
        match decode_image(&record.source_path) {
            Ok(data) => {
                let image = IconImage::fitted_to_height(data, self.bar_height);
                Some(CustomIcon { id, record, image })
            }
            Err(e) => {
                tracing::debug!(id = %id, path = %record.source_path.display(), error = %e, "custom icon unavailable");
                None
            }
        }
    }

    /// Copies `source` into the registry and records it.
    ///
    /// The new icon is named `Icon N` where N is one more than the number of
    /// currently listed icons. Returns the new id.
    pub fn add(&mut self, source: &Path) -> Result<String, RegistryError> {
        let images_dir = self.layout.images_dir();
        std::fs::create_dir_all(&images_dir)
            .map_err(|e| RegistryError::io("create", &images_dir, e))?;

        let count = self.list().len();
        let mut doc = self.document();

        let ext = source.extension().map(|e| e.to_string_lossy().into_owned());
        let (id, dest) = (0..MAX_ID_ATTEMPTS)
            .map(|_| {
                let id = (self.next_id)();
                let file_name = match &ext {
                    Some(ext) => format!("{id}.{ext}"),
                    None => id.clone(),
                };
                let dest = images_dir.join(file_name);
                (id, dest)
            })
            .find(|(id, dest)| !doc.contains(id) && !dest.exists())
            .ok_or(RegistryError::IdsExhausted {
                attempts: MAX_ID_ATTEMPTS,
            })?;

        std::fs::copy(source, &dest).map_err(|e| RegistryError::io("copy", source, e))?;

        doc.insert(
            id.clone(),
            IconRecord {
                source_path: dest.clone(),
                nickname: format!("Icon {}", count + 1),
                padding: 0,
            },
        );

        if let Err(e) = doc.save(&self.layout.data_file()) {
            if let Err(cleanup) = std::fs::remove_file(&dest) {
                tracing::warn!(path = %dest.display(), error = %cleanup, "failed to remove copied icon");
            }
            return Err(e);
        }

        tracing::info!(id = %id, source = %source.display(), "added custom icon");
        Ok(id)
    }

    /// Like [`add`](Self::add), but logs failures and returns `None`.
    pub fn import(&mut self, source: &Path) -> Option<String> {
        match self.add(source) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(source = %source.display(), error = %e, "failed to import custom icon");
                None
            }
        }
    }

    /// Renames an icon. Returns false if `id` is unknown.
    pub fn rename(&self, id: &str, nickname: &str) -> Result<bool, RegistryError> {
        self.update(id, |record| record.nickname = nickname.to_string())
    }

    /// Sets an icon's padding. Returns false if `id` is unknown.
    pub fn set_padding(&self, id: &str, padding: u32) -> Result<bool, RegistryError> {
        self.update(id, |record| record.padding = padding)
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut IconRecord)) -> Result<bool, RegistryError> {
        let mut doc = self.document();
        let Some(record) = doc.get_mut(id) else {
            return Ok(false);
        };
        apply(record);
        doc.save(&self.layout.data_file())?;
        Ok(true)
    }

    /// Deletes an icon and its image. Returns false if `id` is unknown.
    ///
    /// The image is removed first; if that fails the document is left
    /// untouched. An image that is already gone does not block deletion.
    pub fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        let mut doc = self.document();
        let Some(record) = doc.remove(id) else {
            return Ok(false);
        };

        match std::fs::remove_file(&record.source_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(id = %id, "custom icon image already missing");
            }
            Err(e) => return Err(RegistryError::io("remove", &record.source_path, e)),
        }

        doc.save(&self.layout.data_file())?;
        tracing::info!(id = %id, "deleted custom icon");
        Ok(true)
    }
}

/// Decodes an image file, sniffing the format from its contents.
fn decode_image(path: &Path) -> image::ImageResult<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(img.to_rgba8())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    /// Writes a small PNG to `path`.
    pub(crate) fn write_png(path: &Path, color: [u8; 4]) {
        RgbaImage::from_pixel(8, 16, Rgba(color)).save(path).unwrap();
    }

    pub(crate) fn counter_ids() -> impl FnMut() -> String + 'static {
        let mut n = 0;
        move || {
            n += 1;
            format!("U{n}")
        }
    }

    fn setup() -> (tempfile::TempDir, IconRegistry) {
        let tmp = tempfile::tempdir().unwrap();
        let registry =
            IconRegistry::new(StoreLayout::new(tmp.path().join("store"))).with_id_generator(counter_ids());
        (tmp, registry)
    }

    #[test]
    fn layout_paths() {
        let layout = StoreLayout::new("/base");
        assert_eq!(layout.data_file(), PathBuf::from("/base/customIcons/data.json"));
        assert_eq!(layout.images_dir(), PathBuf::from("/base/customIcons/images"));
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_tmp, registry) = setup();
        assert!(!registry.is_initialized());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn add_copies_file_and_names_icon() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("photo.png");
        write_png(&src, [255, 0, 0, 255]);

        let id = registry.add(&src).unwrap();
        assert_eq!(id, "U1");
        assert!(registry.is_initialized());

        let icons = registry.list();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].nickname(), "Icon 1");
        assert_eq!(icons[0].record.padding, 0);
        assert_eq!(icons[0].record.source_path, registry.layout().images_dir().join("U1.png"));
        assert!(icons[0].record.source_path.exists());
        assert_eq!(icons[0].image.size.height, MENU_BAR_HEIGHT);

        let second = registry.add(&src).unwrap();
        assert_eq!(registry.get(&second).unwrap().nickname(), "Icon 2");
    }

    #[test]
    fn add_skips_ids_in_use() {
        let (tmp, registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);

        let mut ids = vec!["DUP".to_string(), "DUP".to_string(), "NEW".to_string()].into_iter();
        let mut registry = registry.with_id_generator(move || ids.next().unwrap_or_default());
        assert_eq!(registry.add(&src).unwrap(), "DUP");
        assert_eq!(registry.add(&src).unwrap(), "NEW");
    }

    #[test]
    fn add_gives_up_when_generator_repeats() {
        let (tmp, registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);

        let mut registry = registry.with_id_generator(|| "SAME".to_string());
        assert_eq!(registry.add(&src).unwrap(), "SAME");
        assert!(matches!(
            registry.add(&src),
            Err(RegistryError::IdsExhausted { attempts: MAX_ID_ATTEMPTS })
        ));
        assert_eq!(registry.document().len(), 1);
    }

    #[test]
    fn failed_document_write_removes_copied_image() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        // A directory in place of data.json makes the final rename fail
        std::fs::create_dir_all(registry.layout().data_file()).unwrap();

        assert!(registry.add(&src).is_err());
        let images = registry.layout().images_dir();
        assert_eq!(std::fs::read_dir(&images).unwrap().count(), 0);
        assert_eq!(registry.import(&src), None);
        assert_eq!(std::fs::read_dir(&images).unwrap().count(), 0);
    }

    #[test]
    fn add_without_extension_uses_bare_id() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("noext");
        write_png(&tmp.path().join("tmp.png"), [0, 0, 0, 255]);
        std::fs::rename(tmp.path().join("tmp.png"), &src).unwrap();

        let id = registry.add(&src).unwrap();
        assert!(registry.layout().images_dir().join(&id).exists());
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn add_missing_source_fails_cleanly() {
        let (tmp, mut registry) = setup();
        let missing = tmp.path().join("missing.png");
        assert!(matches!(registry.add(&missing), Err(RegistryError::Io { action: "copy", .. })));
        assert_eq!(registry.import(&missing), None);
        assert!(registry.document().is_empty());
    }

    #[test]
    fn unloadable_images_are_skipped() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("ok.png");
        write_png(&src, [0, 0, 0, 255]);
        let good = registry.add(&src).unwrap();

        let broken = tmp.path().join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();
        let bad = registry.add(&broken).unwrap();

        let ids: Vec<_> = registry.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![good]);
        assert!(registry.document().contains(&bad));
        assert!(registry.get(&bad).is_none());
    }

    #[test]
    fn rename_only_changes_nickname() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let id = registry.add(&src).unwrap();
        let before = registry.get(&id).unwrap().record;

        assert!(registry.rename(&id, "Foo").unwrap());
        let after = registry.get(&id).unwrap().record;
        assert_eq!(after.nickname, "Foo");
        assert_eq!(after.source_path, before.source_path);
        assert_eq!(after.padding, before.padding);

        assert!(!registry.rename("nope", "Bar").unwrap());
    }

    #[test]
    fn set_padding_updates_record() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let id = registry.add(&src).unwrap();

        assert!(registry.set_padding(&id, 12).unwrap());
        assert_eq!(registry.get(&id).unwrap().record.padding, 12);
        assert!(!registry.set_padding("nope", 1).unwrap());
    }

    #[test]
    fn delete_removes_entry_and_file() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let keep = registry.add(&src).unwrap();
        let id = registry.add(&src).unwrap();
        let path = registry.get(&id).unwrap().record.source_path;

        assert!(registry.delete(&id).unwrap());
        assert!(!path.exists());
        let ids: Vec<_> = registry.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![keep]);
    }

    #[test]
    fn delete_unknown_is_noop() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        registry.add(&src).unwrap();
        let before = registry.document();

        assert!(!registry.delete("ghost").unwrap());
        assert_eq!(registry.document(), before);
    }

    #[test]
    fn delete_with_missing_image_still_removes_entry() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let id = registry.add(&src).unwrap();
        std::fs::remove_file(registry.layout().images_dir().join(format!("{id}.png"))).unwrap();

        assert!(registry.delete(&id).unwrap());
        assert!(registry.document().is_empty());
    }

    #[test]
    fn delete_keeps_entry_when_file_removal_fails() {
        let (tmp, mut registry) = setup();
        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let id = registry.add(&src).unwrap();

        // A non-empty directory at the recorded path cannot be removed as a file
        let path = registry.get(&id).unwrap().record.source_path;
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner"), b"x").unwrap();

        assert!(registry.delete(&id).is_err());
        assert!(registry.document().contains(&id));
    }

    #[test]
    fn malformed_document_is_replaced_by_next_add() {
        let (tmp, mut registry) = setup();
        std::fs::create_dir_all(registry.layout().custom_icons_dir()).unwrap();
        std::fs::write(registry.layout().data_file(), "{{{{").unwrap();
        assert!(registry.list().is_empty());

        let src = tmp.path().join("a.png");
        write_png(&src, [0, 0, 0, 255]);
        let id = registry.add(&src).unwrap();

        let doc = registry.document();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get(&id).unwrap().nickname, "Icon 1");
    }
}
