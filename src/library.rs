//! The icon library: built-in and custom separators behind one selectable list.
//!
//! [`IconLibrary`] is the controller behind the "manage icons" window. It
//! keeps an in-memory list of entries (always `Line`, `Dot`, then custom icons
//! sorted by nickname), tracks the selection, exposes which settings controls
//! apply to it, and routes edits to the preference store or the registry.
//! After every edit that affects the live menu bar it calls the
//! [`ReapplyIcons`] collaborator.
//!
//! Color edits are debounced: the caller reports each color-picker event and
//! drives [`IconLibrary::poll`] from its event loop.

use std::time::{Duration, Instant};

use crate::color::IconColor;
use crate::debounce::Debouncer;
use crate::icon::{DEFAULT_SCALE, IconImage, MENU_BAR_HEIGHT};
use crate::prefs::{BuiltinKind, Preferences};
use crate::registry::{IconRegistry, RegistryError};
use crate::render::{DotStyle, LineStyle, render_dot, render_line};
use crate::template::is_template_like;

/// Delay before a color change is persisted.
pub const COLOR_DEBOUNCE: Duration = Duration::from_millis(100);

/// Height slider position shown while the line height is automatic.
pub const AUTO_LINE_HEIGHT_DISPLAY: f64 = 16.0;

// ============================================================================
// Collaborators
// ============================================================================

/// Pushes the current settings to the live menu bar.
pub trait ReapplyIcons {
    fn reapply_all(&mut self);
}

impl<F: FnMut()> ReapplyIcons for F {
    fn reapply_all(&mut self) {
        self()
    }
}

/// Lets the user pick an image and imports it into the registry.
pub trait IconImporter {
    /// Returns the new icon's id, or `None` if the user cancelled or the
    /// import failed.
    fn import(&mut self, registry: &mut IconRegistry) -> Option<String>;
}

impl<F: FnMut(&mut IconRegistry) -> Option<String>> IconImporter for F {
    fn import(&mut self, registry: &mut IconRegistry) -> Option<String> {
        self(registry)
    }
}

// ============================================================================
// Slider ranges
// ============================================================================

/// Inclusive bounds of a settings slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

pub const PADDING_RANGE: SliderRange = SliderRange::new(0.0, 50.0);
pub const LINE_THICKNESS_RANGE: SliderRange = SliderRange::new(0.5, 10.0);
pub const DOT_THICKNESS_RANGE: SliderRange = SliderRange::new(1.0, 20.0);
pub const LINE_HEIGHT_RANGE: SliderRange = SliderRange::new(4.0, 24.0);

fn thickness_range(kind: BuiltinKind) -> SliderRange {
    match kind {
        BuiltinKind::Line => LINE_THICKNESS_RANGE,
        BuiltinKind::Dot => DOT_THICKNESS_RANGE,
    }
}

// ============================================================================
// Entries and panel state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Builtin(BuiltinKind),
    Custom,
}

/// One cell of the icon grid.
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub id: String,
    pub nickname: String,
    pub kind: EntryKind,
    pub padding: u32,
    pub preview: IconImage,
    /// Whether the grid should tint the preview with the system color.
    pub tinted: bool,
}

impl LibraryEntry {
    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        match self.kind {
            EntryKind::Builtin(kind) => Some(kind),
            EntryKind::Custom => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin_kind().is_some()
    }
}

/// Settings shown for the current selection, with their current values.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsPanel {
    Hidden,
    Line {
        padding: u32,
        thickness: f64,
        height: f64,
        color: Option<IconColor>,
    },
    Dot {
        padding: u32,
        thickness: f64,
        color: Option<IconColor>,
    },
    Custom {
        padding: u32,
    },
}

/// Which controls are visible and enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlVisibility {
    pub padding: bool,
    pub thickness: bool,
    pub height: bool,
    pub color: bool,
    pub reset_color: bool,
}

impl SettingsPanel {
    pub fn controls(&self) -> ControlVisibility {
        match self {
            Self::Hidden => ControlVisibility::default(),
            Self::Line { .. } => ControlVisibility {
                padding: true,
                thickness: true,
                height: true,
                color: true,
                reset_color: true,
            },
            Self::Dot { .. } => ControlVisibility {
                padding: true,
                thickness: true,
                height: false,
                color: true,
                reset_color: true,
            },
            Self::Custom { .. } => ControlVisibility {
                padding: true,
                ..ControlVisibility::default()
            },
        }
    }

    /// Range of the thickness slider, if it is shown.
    pub fn thickness_range(&self) -> Option<SliderRange> {
        match self {
            Self::Line { .. } => Some(LINE_THICKNESS_RANGE),
            Self::Dot { .. } => Some(DOT_THICKNESS_RANGE),
            _ => None,
        }
    }

    /// Range of the height slider, if it is shown.
    pub fn height_range(&self) -> Option<SliderRange> {
        matches!(self, Self::Line { .. }).then_some(LINE_HEIGHT_RANGE)
    }
}

// ============================================================================
// IconLibrary
// ============================================================================

pub struct IconLibrary {
    registry: IconRegistry,
    prefs: Preferences,
    reapply: Box<dyn ReapplyIcons>,
    entries: Vec<LibraryEntry>,
    selected: Option<String>,
    pending_color: Debouncer<(BuiltinKind, IconColor)>,
    scale: f32,
}

impl IconLibrary {
    /// Creates the controller and builds the initial list.
    pub fn new(
        registry: IconRegistry,
        prefs: Preferences,
        reapply: impl ReapplyIcons + 'static,
    ) -> Self {
        let mut library = Self {
            registry,
            prefs,
            reapply: Box::new(reapply),
            entries: Vec::new(),
            selected: None,
            pending_color: Debouncer::new(COLOR_DEBOUNCE),
            scale: DEFAULT_SCALE,
        };
        library.refresh();
        library
    }

    /// Sets the pixel scale used for built-in previews.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self.refresh();
        self
    }

    pub fn registry(&self) -> &IconRegistry {
        &self.registry
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    // ---- List ----

    /// Rebuilds the list from preferences and the registry, keeping the
    /// selection if its entry still exists.
    pub fn refresh(&mut self) {
        let mut entries: Vec<LibraryEntry> = BuiltinKind::ALL
            .into_iter()
            .map(|kind| LibraryEntry {
                id: kind.id().to_string(),
                nickname: kind.display_name().to_string(),
                kind: EntryKind::Builtin(kind),
                padding: self.prefs.padding(kind),
                preview: self.render_builtin(kind),
                tinted: true,
            })
            .collect();

        let mut custom: Vec<LibraryEntry> = self
            .registry
            .list()
            .into_iter()
            .map(|icon| LibraryEntry {
                tinted: is_template_like(&icon.image.data),
                id: icon.id,
                nickname: icon.record.nickname,
                kind: EntryKind::Custom,
                padding: icon.record.padding,
                preview: icon.image,
            })
            .collect();
        custom.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        entries.extend(custom);

        self.entries = entries;
        let still_listed = |id: &String| self.entries.iter().any(|e| &e.id == id);
        if !self.selected.as_ref().is_none_or(still_listed) {
            self.selected = None;
        }
    }

    fn render_builtin(&self, kind: BuiltinKind) -> IconImage {
        match kind {
            BuiltinKind::Line => render_line(&self.line_style(), MENU_BAR_HEIGHT, self.scale),
            BuiltinKind::Dot => render_dot(&self.dot_style(), MENU_BAR_HEIGHT, self.scale),
        }
    }

    /// Current line style as stored in preferences.
    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            thickness: self.prefs.thickness(BuiltinKind::Line) as f32,
            height: self.prefs.line_height().map(|h| h as f32),
            color: self.prefs.color(BuiltinKind::Line),
        }
    }

    /// Current dot style as stored in preferences.
    pub fn dot_style(&self) -> DotStyle {
        DotStyle {
            diameter: self.prefs.thickness(BuiltinKind::Dot) as f32,
            color: self.prefs.color(BuiltinKind::Dot),
        }
    }

    fn refresh_preview(&mut self, kind: BuiltinKind) {
        let preview = self.render_builtin(kind);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.kind == EntryKind::Builtin(kind)) {
            entry.preview = preview;
        }
    }

    // ---- Selection ----

    /// Selects the entry at `index` in [`entries`](Self::entries), or clears
    /// the selection.
    pub fn select(&mut self, index: Option<usize>) -> SettingsPanel {
        self.selected = index
            .and_then(|i| self.entries.get(i))
            .map(|e| e.id.clone());
        self.panel()
    }

    pub fn select_id(&mut self, id: &str) -> SettingsPanel {
        self.selected = self.entry(id).map(|e| e.id.clone());
        self.panel()
    }

    pub fn selected(&self) -> Option<&LibraryEntry> {
        let id = self.selected.as_deref()?;
        self.entry(id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.entries.iter().position(|e| e.id == id)
    }

    fn selected_builtin(&self) -> Option<BuiltinKind> {
        self.selected().and_then(LibraryEntry::builtin_kind)
    }

    /// The settings panel for the current selection.
    pub fn panel(&self) -> SettingsPanel {
        let Some(entry) = self.selected() else {
            return SettingsPanel::Hidden;
        };
        match entry.kind {
            EntryKind::Builtin(BuiltinKind::Line) => SettingsPanel::Line {
                padding: entry.padding,
                thickness: self.prefs.thickness(BuiltinKind::Line),
                height: self.prefs.line_height().unwrap_or(AUTO_LINE_HEIGHT_DISPLAY),
                color: self.prefs.color(BuiltinKind::Line),
            },
            EntryKind::Builtin(BuiltinKind::Dot) => SettingsPanel::Dot {
                padding: entry.padding,
                thickness: self.prefs.thickness(BuiltinKind::Dot),
                color: self.prefs.color(BuiltinKind::Dot),
            },
            EntryKind::Custom => SettingsPanel::Custom {
                padding: entry.padding,
            },
        }
    }

    // ---- Edits ----

    /// Sets the padding of the selected icon. Returns true if it was stored.
    pub fn set_padding(&mut self, value: u32) -> bool {
        let Some(entry) = self.selected() else {
            return false;
        };
        let (id, kind) = (entry.id.clone(), entry.kind);
        let value = PADDING_RANGE.clamp(value as f64) as u32;

        let stored = match kind {
            EntryKind::Builtin(kind) => match self.prefs.set_padding(kind, value) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(kind = ?kind, error = %e, "failed to store padding");
                    false
                }
            },
            EntryKind::Custom => match self.registry.set_padding(&id, value) {
                Ok(found) => found,
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to store padding");
                    false
                }
            },
        };
        if !stored {
            return false;
        }

        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.padding = value;
        }
        self.reapply.reapply_all();
        true
    }

    /// Sets the thickness of the selected built-in, clamped to its range.
    pub fn set_thickness(&mut self, value: f64) -> bool {
        let Some(kind) = self.selected_builtin() else {
            return false;
        };
        let value = thickness_range(kind).clamp(value);
        if let Err(e) = self.prefs.set_thickness(kind, value) {
            tracing::warn!(kind = ?kind, error = %e, "failed to store thickness");
            return false;
        }
        self.reapply.reapply_all();
        self.refresh_preview(kind);
        true
    }

    /// Sets the explicit line height. Only applies while the line is selected.
    pub fn set_height(&mut self, value: f64) -> bool {
        if self.selected_builtin() != Some(BuiltinKind::Line) {
            return false;
        }
        let value = LINE_HEIGHT_RANGE.clamp(value);
        if let Err(e) = self.prefs.set_line_height(Some(value)) {
            tracing::warn!(error = %e, "failed to store line height");
            return false;
        }
        self.reapply.reapply_all();
        self.refresh_preview(BuiltinKind::Line);
        true
    }

    /// Reports a color-picker change for the selected built-in.
    pub fn color_changed(&mut self, color: IconColor) -> bool {
        self.color_changed_at(color, Instant::now())
    }

    /// Schedules `color` to be stored [`COLOR_DEBOUNCE`] after `now`,
    /// replacing any color still pending.
    pub fn color_changed_at(&mut self, color: IconColor, now: Instant) -> bool {
        let Some(kind) = self.selected_builtin() else {
            return false;
        };
        self.pending_color.schedule((kind, color), now);
        true
    }

    /// When the pending color change becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_color.deadline()
    }

    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Applies the pending color change if it is due. Returns true if a
    /// color was stored.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        let Some((kind, color)) = self.pending_color.take_due(now) else {
            return false;
        };
        if let Err(e) = self.prefs.set_color(kind, Some(color)) {
            tracing::warn!(kind = ?kind, error = %e, "failed to store color");
            return false;
        }
        self.reapply.reapply_all();
        self.refresh_preview(kind);
        true
    }

    /// Discards a pending color change without storing it.
    pub fn cancel(&mut self) -> bool {
        self.pending_color.cancel()
    }

    /// Reverts the selected built-in to the system template color.
    pub fn reset_color(&mut self) -> bool {
        let Some(kind) = self.selected_builtin() else {
            return false;
        };
        self.pending_color.cancel();
        if let Err(e) = self.prefs.set_color(kind, None) {
            tracing::warn!(kind = ?kind, error = %e, "failed to clear color");
            return false;
        }
        self.refresh_preview(kind);
        self.reapply.reapply_all();
        true
    }

    // ---- Registry actions ----

    /// Runs the importer and rebuilds the list if it produced an icon.
    pub fn add_icon(&mut self, importer: &mut dyn IconImporter) -> Option<String> {
        let id = importer.import(&mut self.registry)?;
        self.refresh();
        Some(id)
    }

    /// Renames a custom icon. Built-ins cannot be renamed.
    pub fn rename(&mut self, id: &str, nickname: &str) -> Result<bool, RegistryError> {
        if BuiltinKind::from_id(id).is_some() {
            return Ok(false);
        }
        let renamed = self.registry.rename(id, nickname)?;
        if renamed {
            self.refresh();
        }
        Ok(renamed)
    }

    /// Deletes a custom icon. Built-ins cannot be deleted.
    pub fn delete(&mut self, id: &str) -> Result<bool, RegistryError> {
        if BuiltinKind::from_id(id).is_some() {
            return Ok(false);
        }
        let deleted = self.registry.delete(id)?;
        if deleted {
            self.refresh();
            self.reapply.reapply_all();
        }
        Ok(deleted)
    }
}

impl Drop for IconLibrary {
    fn drop(&mut self) {
        if self.pending_color.cancel() {
            tracing::debug!("discarded pending color change");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
