//! End-to-end tests against a real store directory.

use std::path::Path;

use image::{Rgba, RgbaImage};
use splitter_icons::{
    BuiltinKind, IconColor, IconLibrary, IconRegistry, JsonFileBackend, Preferences,
    SettingsPanel, StoreLayout,
};

fn write_png(path: &Path) {
    RgbaImage::from_pixel(12, 24, Rgba([200, 40, 40, 255]))
        .save(path)
        .expect("Failed to write fixture image");
}

fn counter_ids() -> impl FnMut() -> String + 'static {
    let mut n = 0;
    move || {
        n += 1;
        format!("U{n}")
    }
}

fn open_library(base: &Path) -> IconLibrary {
    let registry = IconRegistry::new(StoreLayout::new(base.join("store")))
        .with_id_generator(counter_ids());
    let prefs = Preferences::new(JsonFileBackend::open(base.join("prefs.json")));
    IconLibrary::new(registry, prefs, || {})
}

#[test]
fn test_add_rename_delete_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    let photo = tmp.path().join("photo.png");
    write_png(&photo);
    let mut library = open_library(tmp.path());
    let layout = library.registry().layout().clone();

    // Empty store: only the built-ins
    assert_eq!(library.entries().len(), 2);
    assert!(!layout.data_file().exists());

    let id = library
        .add_icon(&mut |registry: &mut IconRegistry| registry.import(&photo))
        .expect("import should succeed");
    assert_eq!(id, "U1");

    let record = library.registry().get("U1").expect("U1 should be listed").record;
    assert_eq!(record.nickname, "Icon 1");
    assert_eq!(record.padding, 0);
    assert_eq!(record.source_path, layout.images_dir().join("U1.png"));
    assert!(record.source_path.exists());
    // The original file is copied, not moved
    assert!(photo.exists());

    assert!(library.rename("U1", "Star").unwrap());
    assert_eq!(library.entry("U1").unwrap().nickname, "Star");
    assert_eq!(library.registry().get("U1").unwrap().record.padding, 0);

    assert!(library.delete("U1").unwrap());
    assert_eq!(library.entries().len(), 2);
    assert!(library.registry().list().is_empty());
    assert!(!layout.images_dir().join("U1.png").exists());

    // Unknown ids are a no-op
    assert!(!library.delete("U1").unwrap());
}

#[test]
fn test_settings_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let mut library = open_library(tmp.path());
        library.select(Some(0));
        assert!(library.set_thickness(3.0));
        assert!(library.set_height(12.0));
        assert!(library.set_padding(6));

        library.select(Some(1));
        library.color_changed(IconColor::rgb(0, 128, 255));
        let deadline = library.next_deadline().unwrap();
        assert!(library.poll_at(deadline));
    }

    let mut library = open_library(tmp.path());
    assert_eq!(
        library.select(Some(0)),
        SettingsPanel::Line {
            padding: 6,
            thickness: 3.0,
            height: 12.0,
            color: None,
        }
    );
    assert_eq!(
        library.preferences().color(BuiltinKind::Dot),
        Some(IconColor::rgb(0, 128, 255))
    );

    let prefs = std::fs::read_to_string(tmp.path().join("prefs.json")).unwrap();
    assert!(prefs.contains("\"dotColor\": \"#0080FFFF\""));
    assert!(prefs.contains("\"lineThickness\": 3.0"));
}

#[test]
fn test_malformed_document_is_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let photo = tmp.path().join("photo.png");
    write_png(&photo);

    let layout = StoreLayout::new(tmp.path().join("store"));
    std::fs::create_dir_all(layout.custom_icons_dir()).unwrap();
    std::fs::write(layout.data_file(), "{ this is not json").unwrap();

    let mut library = open_library(tmp.path());
    assert_eq!(library.entries().len(), 2);

    let id = library
        .add_icon(&mut |registry: &mut IconRegistry| registry.import(&photo))
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(layout.data_file()).unwrap()).unwrap();
    let root = json.as_object().unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[&id]["nickname"], "Icon 1");
}
