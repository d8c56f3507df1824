//! splitter-icons: separator icon library for menu-bar splitters
//!
//! This crate holds the parts of a menu-bar splitter that do not depend on a
//! GUI toolkit: the on-disk registry of custom icons, the rasterizer for the
//! built-in line and dot separators, the typed preference service, and the
//! controller behind the "manage icons" window.
//!
//! # Example
//!
//! ```no_run
//! use splitter_icons::{IconLibrary, IconRegistry, Preferences, StoreLayout};
//!
//! let layout = StoreLayout::default_location().expect("no home directory");
//! let registry = IconRegistry::new(layout);
//! let mut library = IconLibrary::new(registry, Preferences::in_memory(), || {
//!     // push the new settings to the live menu bar
//! });
//!
//! // Select the built-in line and make it thicker
//! library.select(Some(0));
//! library.set_thickness(2.5);
//! ```
//!
//! # Colors
//!
//! Built-in colors are stored as `#RRGGBBAA` strings:
//!
//! ```
//! use splitter_icons::IconColor;
//!
//! let color: IconColor = "#FF8000".parse().unwrap();
//! assert_eq!(color.to_string(), "#FF8000FF");
//! ```

pub mod color;
pub mod debounce;
pub mod icon;
pub mod library;
pub mod prefs;
pub mod registry;
pub mod render;
pub mod template;

pub use color::{IconColor, ParseColorError};
pub use debounce::Debouncer;
pub use icon::{DEFAULT_SCALE, IconImage, MENU_BAR_HEIGHT, SizePt};
pub use library::{
    ControlVisibility, EntryKind, IconImporter, IconLibrary, LibraryEntry, ReapplyIcons,
    SettingsPanel, SliderRange,
};
pub use prefs::{
    BuiltinKind, JsonFileBackend, MemoryBackend, PreferenceBackend, PreferenceError, Preferences,
};
pub use registry::{
    CustomIcon, IconRecord, IconRegistry, MigrationOutcome, MigrationState, RegistryDocument,
    RegistryError, StoreLayout,
};
pub use render::{DotStyle, LineStyle, render_dot, render_line};
pub use template::is_template_like;
