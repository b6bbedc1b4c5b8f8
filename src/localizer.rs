use bevy::prelude::*;

use crate::culture::Culture;
use crate::resolver::CultureFileResolver;
use crate::store::ResourceStore;
use crate::LocalizerConfig;

/// Render-time lookup of localized strings.
///
/// `localize` never fails: a missing key, an unknown culture or a broken
/// resource file all come back as the `~key~` placeholder, so untranslated
/// text stays visible instead of rendering blank. Storage errors are logged.
///
/// # Example
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_resource_localizer::Localizer;
///
/// fn title_system(localizer: Res<Localizer>) {
///     // The culture token comes from the host, e.g. a "lang" cookie.
///     let title = localizer.localize("Title", Some("fr-FR"));
///     info!("{}", title);
/// }
/// ```
#[derive(Resource, Debug, Clone)]
pub struct Localizer {
    store: ResourceStore,
    fallback_culture: Culture,
    fallback_lookup: bool,
}

impl Localizer {
    pub fn new(store: ResourceStore, fallback_culture: Culture) -> Self {
        Self { store, fallback_culture, fallback_lookup: false }
    }

    /// Builds the store described by `config`.
    ///
    /// Invalid culture tokens in the configuration are reported and replaced
    /// by the built-in default culture (known cultures are skipped instead).
    pub fn from_config(config: &LocalizerConfig) -> Self {
        let default_culture = configured_culture(&config.default_culture, "default culture");
        let fallback_culture = configured_culture(&config.fallback_culture, "fallback culture");
        let known_cultures = config.known_cultures
            .iter()
            .filter_map(|raw| {
                Culture::parse(raw)
                    .map_err(|e| warn!("Ignoring known culture: {}", e))
                    .ok()
            })
            .collect::<Vec<_>>();

        let resolver = CultureFileResolver::new(config.base_file(), default_culture);
        let store = ResourceStore::new(resolver)
            .with_known_cultures(known_cultures)
            .with_file_locks(config.lock_files);

        Self::new(store, fallback_culture).with_fallback_lookup(config.fallback_lookup)
    }

    /// Also try the fallback culture before giving up on a key.
    pub fn with_fallback_lookup(mut self, enabled: bool) -> Self {
        self.fallback_lookup = enabled;
        self
    }

    /// The store behind this localizer, for add/update/remove operations.
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn fallback_culture(&self) -> &Culture {
        &self.fallback_culture
    }

    pub fn set_fallback_culture(&mut self, culture: Culture) {
        self.fallback_culture = culture;
    }

    /// Resolves `key` for the culture named by `raw_culture`.
    ///
    /// A missing or blank culture token selects the fallback culture.
    pub fn localize(&self, key: &str, raw_culture: Option<&str>) -> String {
        let raw_culture = raw_culture.map(str::trim).filter(|raw| !raw.is_empty());
        let culture = match raw_culture {
            Some(raw) =>
                match Culture::parse(raw) {
                    Ok(culture) => culture,
                    Err(e) => {
                        warn!("Cannot localize '{}': {}", key, e);
                        return Self::placeholder(key);
                    }
                }
            None => self.fallback_culture.clone(),
        };

        self.lookup(key, &culture)
            .or_else(|| {
                if self.fallback_lookup && !culture.same_file_as(&self.fallback_culture) {
                    self.lookup(key, &self.fallback_culture)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| Self::placeholder(key))
    }

    /// The marker shown in place of a missing translation.
    pub fn placeholder(key: &str) -> String {
        format!("~{}~", key)
    }

    fn lookup(&self, key: &str, culture: &Culture) -> Option<String> {
        match self.store.get(key, culture) {
            Ok(value) => value,
            Err(e) => {
                warn!("Resource lookup of '{}' for culture '{}' failed: {}", key, culture, e);
                None
            }
        }
    }
}

impl FromWorld for Localizer {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource::<LocalizerConfig>().cloned().unwrap_or_default();
        Self::from_config(&config)
    }
}

fn configured_culture(raw: &str, role: &str) -> Culture {
    Culture::parse(raw).unwrap_or_else(|e| {
        let culture = Culture::default();
        warn!("Invalid {} in configuration ({}), using '{}'", role, e, culture);
        culture
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &std::path::Path) -> LocalizerConfig {
        LocalizerConfig {
            resources_folder: dir.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_culture_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let localizer = Localizer::from_config(&config(dir.path()));
        localizer.store().upsert("hello", "Hello", &Culture::parse("en").unwrap()).unwrap();

        assert_eq!(localizer.localize("hello", None), "Hello");
        assert_eq!(localizer.localize("hello", Some("  ")), "Hello");
    }

    #[test]
    fn invalid_culture_degrades_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let localizer = Localizer::from_config(&config(dir.path()));

        assert_eq!(localizer.localize("hello", Some("../../etc")), "~hello~");
        assert_eq!(localizer.localize("", Some("en")), "~~");
    }

    #[test]
    fn broken_file_degrades_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let localizer = Localizer::from_config(&config(dir.path()));
        std::fs::write(dir.path().join("Language.de.json"), "[").unwrap();

        assert_eq!(localizer.localize("hello", Some("de")), "~hello~");
    }

    #[test]
    fn fallback_lookup_is_opt_in() {
        let dir = TempDir::new().unwrap();
        let en = Culture::parse("en").unwrap();

        let strict = Localizer::from_config(&config(dir.path()));
        strict.store().upsert("hello", "Hello", &en).unwrap();
        assert_eq!(strict.localize("hello", Some("fr")), "~hello~");

        let lenient = Localizer::from_config(
            &(LocalizerConfig { fallback_lookup: true, ..config(dir.path()) })
        );
        assert_eq!(lenient.localize("hello", Some("fr")), "Hello");
    }

    #[test]
    fn invalid_configuration_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let localizer = Localizer::from_config(
            &(LocalizerConfig {
                fallback_culture: "???".to_string(),
                known_cultures: vec!["de".to_string(), "".to_string()],
                ..config(dir.path())
            })
        );

        assert_eq!(localizer.fallback_culture(), &Culture::default());
        assert_eq!(localizer.store().known_cultures(), &[Culture::parse("de").unwrap()]);
    }
}
