#![doc = include_str!("../README.md")]

//! # bevy-resource-localizer
//!
//! Per-culture text resources for [Bevy](https://bevyengine.org/), stored as
//! one flat file per language:
//!
//! - **One file per culture**: `Language.json` for the default culture,
//!   `Language.fr.json`, `Language.de.json`, ... for the others
//! - **Lazy creation**: a culture's file is created empty the first time it
//!   is touched
//! - **Full read/write**: every mutation rewrites the whole file
//! - **Visible misses**: missing translations render as `~key~`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_resource_localizer::{ Culture, Localizer, LocalizerPlugin };
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(LocalizerPlugin::default())
//!         .add_systems(Startup, setup_ui)
//!         .run();
//! }
//!
//! fn setup_ui(mut commands: Commands, localizer: Res<Localizer>) {
//!     let fr = Culture::parse("fr").unwrap();
//!     localizer.store().upsert("welcome", "Bienvenue", &fr).unwrap();
//!
//!     commands.spawn((
//!         Text::new(localizer.localize("welcome", Some("fr-FR"))),
//!         Node::default(),
//!     ));
//! }
//! ```

use std::path::PathBuf;

use bevy::prelude::*;

mod culture;
mod document;
mod error;
mod localizer;
mod resolver;
mod store;

pub use culture::Culture;
pub use document::{ ResourceDocument, ResourceEntry };
pub use error::{ LocalizerError, Result };
pub use localizer::Localizer;
pub use resolver::CultureFileResolver;
pub use store::ResourceStore;

/// Configuration for the localizer plugin.
///
/// # Example
///
/// ```rust
/// use bevy_resource_localizer::LocalizerConfig;
///
/// let config = LocalizerConfig {
///     resources_folder: "wwwroot/ResourceFiles".to_string(),
///     default_culture: "tr".to_string(),
///     fallback_culture: "tr-TR".to_string(),
///     ..Default::default()
/// };
/// assert!(config.base_file().ends_with("Language.json"));
/// ```
#[derive(Debug, Clone, Resource)]
pub struct LocalizerConfig {
    /// Directory holding the resource files.
    /// Default: "resources"
    pub resources_folder: String,
    /// File stem shared by every culture's file.
    /// Default: "Language"
    pub base_name: String,
    /// File extension, without the dot.
    /// Default: "json"
    pub extension: String,
    /// Culture whose file carries no culture suffix.
    /// Default: "en"
    pub default_culture: String,
    /// Culture used when the host passes no culture token.
    /// Default: "en"
    pub fallback_culture: String,
    /// Cultures swept by `ResourceStore::remove_everywhere`.
    /// Default: ["tr-TR", "en-US"]
    pub known_cultures: Vec<String>,
    /// Look a missing key up in the fallback culture before using the placeholder.
    /// Default: false
    pub fallback_lookup: bool,
    /// Serialize read-modify-write cycles per file within the process.
    /// Default: false
    pub lock_files: bool,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            resources_folder: "resources".to_string(),
            base_name: "Language".to_string(),
            extension: "json".to_string(),
            default_culture: "en".to_string(),
            fallback_culture: "en".to_string(),
            known_cultures: vec!["tr-TR".to_string(), "en-US".to_string()],
            fallback_lookup: false,
            lock_files: false,
        }
    }
}

impl LocalizerConfig {
    /// Path of the default culture's resource file.
    pub fn base_file(&self) -> PathBuf {
        let file_name = if self.extension.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}.{}", self.base_name, self.extension)
        };
        PathBuf::from(&self.resources_folder).join(file_name)
    }
}

// ---------- Bevy Plugin ----------

/// Installs [`LocalizerConfig`] and a [`Localizer`] built from it.
///
/// # Example
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_resource_localizer::{ LocalizerConfig, LocalizerPlugin };
///
/// App::new().add_plugins(LocalizerPlugin::with_config(LocalizerConfig {
///     default_culture: "tr".to_string(),
///     ..Default::default()
/// }));
/// ```
#[derive(Default)]
pub struct LocalizerPlugin {
    pub config: LocalizerConfig,
}

impl LocalizerPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LocalizerConfig) -> Self {
        Self { config }
    }
}

impl Plugin for LocalizerPlugin {
    fn build(&self, app: &mut App) {
        info!("Serving text resources from '{}'", self.config.base_file().display());
        app.insert_resource(self.config.clone()).init_resource::<Localizer>();
    }
}

/// Extension trait for `App` to change the fallback culture after startup.
pub trait LocalizerAppExt {
    /// Sets the culture used when no culture token is supplied.
    ///
    /// Invalid tokens are reported and leave the current fallback in place.
    fn set_fallback_culture(&mut self, culture: &str);
}

impl LocalizerAppExt for App {
    fn set_fallback_culture(&mut self, culture: &str) {
        let culture = match Culture::parse(culture) {
            Ok(culture) => culture,
            Err(e) => {
                warn!("Fallback culture not changed: {}", e);
                return;
            }
        };

        if let Some(mut localizer) = self.world_mut().get_resource_mut::<Localizer>() {
            localizer.set_fallback_culture(culture.clone());
        }
        if let Some(mut config) = self.world_mut().get_resource_mut::<LocalizerConfig>() {
            config.fallback_culture = culture.tag().to_string();
        }
    }
}
