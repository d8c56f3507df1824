//! splitter-icons - manage menu-bar separator icons from a terminal

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use splitter_icons::registry::migrate::{default_legacy_dir, migrate_if_needed};
use splitter_icons::{
    BuiltinKind, IconColor, IconLibrary, IconRegistry, JsonFileBackend, Preferences,
    RegistryError, StoreLayout,
};

const PREFERENCES_FILE: &str = "preferences.json";

/// splitter-icons - manage menu-bar separator icons
#[derive(Parser, Debug)]
#[command(name = "splitter-icons", version, about, long_about = None)]
struct Args {
    /// Base directory of the icon store (defaults to the per-user data directory)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Preferences file (defaults to preferences.json in the store directory)
    #[arg(long)]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List built-in and custom icons
    List,
    /// Import an image as a custom icon
    Add { path: PathBuf },
    /// Rename a custom icon
    Rename { id: String, nickname: String },
    /// Delete a custom icon and its image
    Delete { id: String },
    /// Set the padding of an icon (built-in or custom)
    Padding {
        id: String,
        #[arg(value_parser = clap::value_parser!(u32).range(0..=50))]
        points: u32,
    },
    /// Set the thickness of a built-in separator
    Thickness { kind: Kind, value: f64 },
    /// Set the line height in points
    Height { value: f64 },
    /// Set a built-in color (#RRGGBB or #RRGGBBAA)
    Color { kind: Kind, color: IconColor },
    /// Revert a built-in to the system template color
    ResetColor { kind: Kind },
    /// Copy icons from the legacy group container, once
    Migrate {
        /// Legacy customIcons directory (defaults to the group container)
        #[arg(long)]
        legacy_dir: Option<PathBuf>,
    },
    /// Render a built-in separator to a PNG file
    Render {
        kind: Kind,
        output: PathBuf,
        #[arg(long, default_value = "2.0")]
        scale: f32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Line,
    Dot,
}

impl From<Kind> for BuiltinKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Line => BuiltinKind::Line,
            Kind::Dot => BuiltinKind::Dot,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not determine the user data directory; pass --store")]
    NoDataDir,

    #[error("no icon with id {0:?}")]
    UnknownIcon(String),

    #[error("{0:?} is a built-in separator and cannot be changed this way")]
    Builtin(String),

    #[error("could not import {}", .0.display())]
    Import(PathBuf),

    #[error("failed to update preferences")]
    Preferences,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let layout = match args.store {
        Some(base) => StoreLayout::new(base),
        None => StoreLayout::default_location().ok_or(CliError::NoDataDir)?,
    };
    let prefs_path = args
        .prefs
        .unwrap_or_else(|| layout.base_dir().join(PREFERENCES_FILE));
    let mut prefs = Preferences::new(JsonFileBackend::open(prefs_path));

    match args.command {
        Command::Migrate { legacy_dir } => {
            let legacy_dir = legacy_dir.or_else(default_legacy_dir);
            let outcome = migrate_if_needed(&mut prefs, &layout, legacy_dir.as_deref());
            println!("{outcome:?}");
            Ok(())
        }
        command => {
            let library = IconLibrary::new(IconRegistry::new(layout), prefs, || {});
            edit(library, command)
        }
    }
}

fn edit(mut library: IconLibrary, command: Command) -> Result<(), CliError> {
    match command {
        Command::List => {
            for (index, entry) in library.entries().iter().enumerate() {
                let (w, h) = entry.preview.pixel_dimensions();
                println!(
                    "{index:>3}  {:<38} {:<20} padding={:<3} {w}x{h}{}",
                    entry.id,
                    entry.nickname,
                    entry.padding,
                    if entry.tinted { " template" } else { "" },
                );
            }
        }
        Command::Add { path } => {
            let mut failure = None;
            let added = library.add_icon(&mut |registry: &mut IconRegistry| {
                registry.add(&path).map_err(|e| failure = Some(e)).ok()
            });
            match (added, failure) {
                (Some(id), _) => println!("{id}"),
                (None, Some(e)) => return Err(e.into()),
                (None, None) => return Err(CliError::Import(path)),
            }
        }
        Command::Rename { id, nickname } => {
            refuse_builtin(&id)?;
            if !library.rename(&id, &nickname)? {
                return Err(CliError::UnknownIcon(id));
            }
        }
        Command::Delete { id } => {
            refuse_builtin(&id)?;
            if !library.delete(&id)? {
                return Err(CliError::UnknownIcon(id));
            }
        }
        Command::Padding { id, points } => {
            select(&mut library, &id)?;
            applied(library.set_padding(points))?;
        }
        Command::Thickness { kind, value } => {
            select(&mut library, BuiltinKind::from(kind).id())?;
            applied(library.set_thickness(value))?;
        }
        Command::Height { value } => {
            select(&mut library, BuiltinKind::Line.id())?;
            applied(library.set_height(value))?;
        }
        Command::Color { kind, color } => {
            select(&mut library, BuiltinKind::from(kind).id())?;
            library.color_changed_at(color, Instant::now());
            let Some(deadline) = library.next_deadline() else {
                return Err(CliError::Preferences);
            };
            applied(library.poll_at(deadline))?;
        }
        Command::ResetColor { kind } => {
            select(&mut library, BuiltinKind::from(kind).id())?;
            applied(library.reset_color())?;
        }
        Command::Render {
            kind,
            output,
            scale,
        } => {
            let library = library.with_scale(scale);
            let kind = BuiltinKind::from(kind);
            let Some(entry) = library.entry(kind.id()) else {
                return Err(CliError::UnknownIcon(kind.id().to_string()));
            };
            entry.preview.data.save(&output)?;
            tracing::info!(path = %output.display(), "rendered {}", kind.display_name());
        }
        Command::Migrate { .. } => {}
    }
    Ok(())
}

fn refuse_builtin(id: &str) -> Result<(), CliError> {
    match BuiltinKind::from_id(id) {
        Some(_) => Err(CliError::Builtin(id.to_string())),
        None => Ok(()),
    }
}

fn select(library: &mut IconLibrary, id: &str) -> Result<(), CliError> {
    library.select_id(id);
    match library.selected() {
        Some(_) => Ok(()),
        None => Err(CliError::UnknownIcon(id.to_string())),
    }
}

fn applied(stored: bool) -> Result<(), CliError> {
    if stored { Ok(()) } else { Err(CliError::Preferences) }
}
