//! Read and write access to the per-culture resource files.
//!
//! Every operation resolves its file on its own, reads the whole document,
//! and for mutations writes the whole document back. Nothing is cached
//! between calls.
//!
//! Concurrent writers of the same file race by default: two interleaved
//! read-modify-write cycles can lose an update. With
//! [`ResourceStore::with_file_locks`] each cycle runs under a per-path lock
//! shared by every store in the process.

use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };

use bevy::log::debug;
use once_cell::sync::Lazy;

use crate::culture::Culture;
use crate::document::{ ResourceDocument, ResourceEntry };
use crate::error::{ LocalizerError, Result };
use crate::resolver::CultureFileResolver;

static FILE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = Lazy::new(||
    Mutex::new(HashMap::new())
);

fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// The per-culture key/value store.
///
/// # Example
///
/// ```rust,no_run
/// use bevy_resource_localizer::{ Culture, CultureFileResolver, ResourceStore };
///
/// let resolver = CultureFileResolver::new(
///     "resources/Language.json",
///     Culture::parse("en").unwrap(),
/// );
/// let store = ResourceStore::new(resolver);
/// let fr = Culture::parse("fr").unwrap();
///
/// store.upsert("title", "Bonjour", &fr).unwrap();
/// assert_eq!(store.get("title", &fr).unwrap().as_deref(), Some("Bonjour"));
/// ```
#[derive(Debug, Clone)]
pub struct ResourceStore {
    resolver: CultureFileResolver,
    known_cultures: Vec<Culture>,
    lock_files: bool,
}

impl ResourceStore {
    pub fn new(resolver: CultureFileResolver) -> Self {
        Self {
            resolver,
            known_cultures: Vec::new(),
            lock_files: false,
        }
    }

    /// Sets the cultures swept by [`remove_everywhere`](Self::remove_everywhere).
    pub fn with_known_cultures(mut self, cultures: impl IntoIterator<Item = Culture>) -> Self {
        self.known_cultures = cultures.into_iter().collect();
        self
    }

    /// Serializes read-modify-write cycles on the same file within this process.
    pub fn with_file_locks(mut self, enabled: bool) -> Self {
        self.lock_files = enabled;
        self
    }

    pub fn resolver(&self) -> &CultureFileResolver {
        &self.resolver
    }

    pub fn known_cultures(&self) -> &[Culture] {
        &self.known_cultures
    }

    /// Looks up `key` in the file of `culture`.
    ///
    /// Keys are compared exactly; an empty key is never present.
    pub fn get(&self, key: &str, culture: &Culture) -> Result<Option<String>> {
        let path = self.resolver.resolve(culture)?;
        if key.is_empty() {
            return Ok(None);
        }

        let document = ResourceDocument::load(&path)?;
        Ok(
            document.entries
                .into_iter()
                .find(|entry| entry.key == key)
                .map(|entry| entry.value)
        )
    }

    /// Returns every entry of the file of `culture`, in storage order.
    pub fn list(&self, culture: &Culture) -> Result<Vec<ResourceEntry>> {
        let path = self.resolver.resolve(culture)?;
        Ok(ResourceDocument::load(&path)?.entries)
    }

    /// Sets `key` to `value`, replacing an existing value in place or
    /// appending a new entry.
    pub fn upsert(&self, key: &str, value: &str, culture: &Culture) -> Result<()> {
        if key.is_empty() {
            return Err(LocalizerError::EmptyKey);
        }

        self.modify(culture, |entries| {
            match entries.iter_mut().find(|entry| entry.key == key) {
                Some(entry) => {
                    entry.value = value.to_string();
                }
                None => entries.push(ResourceEntry::new(key, value)),
            }
            true
        })?;
        Ok(())
    }

    /// Drops `key` from the file of `culture`.
    ///
    /// Returns `false` without rewriting the file when the key is absent.
    pub fn remove(&self, key: &str, culture: &Culture) -> Result<bool> {
        self.modify(culture, |entries| {
            match entries.iter().position(|entry| entry.key == key) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    /// Removes `key` from every configured known culture.
    ///
    /// Cultures outside the known set keep their entry; use
    /// [`remove_from_all`](Self::remove_from_all) to sweep every file on disk.
    pub fn remove_everywhere(&self, key: &str) -> Result<()> {
        self.remove_from(key, &self.known_cultures)?;
        Ok(())
    }

    /// Removes `key` from each of `cultures`, returning how many files changed.
    pub fn remove_from<'a>(
        &self,
        key: &str,
        cultures: impl IntoIterator<Item = &'a Culture>
    ) -> Result<usize> {
        let mut removed = 0;
        for culture in cultures {
            if self.remove(key, culture)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes `key` from every resource file currently on disk.
    pub fn remove_from_all(&self, key: &str) -> Result<usize> {
        let cultures = self.resolver.cultures_on_disk()?;
        self.remove_from(key, &cultures)
    }

    /// Cultures that currently have a resource file.
    pub fn cultures(&self) -> Result<Vec<Culture>> {
        self.resolver.cultures_on_disk()
    }

    // Load, apply `change`, and rewrite the file when `change` reports a modification.
    fn modify<F>(&self, culture: &Culture, change: F) -> Result<bool>
        where F: FnOnce(&mut Vec<ResourceEntry>) -> bool
    {
        let path = self.resolver.resolve(culture)?;

        let lock = self.lock_files.then(|| file_lock(&path));
        let _guard: Option<MutexGuard<'_, ()>> = lock
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner));

        let mut document = ResourceDocument::load(&path)?;
        if !change(&mut document.entries) {
            return Ok(false);
        }

        debug!("Rewriting resources of culture '{}' at '{}'", culture, path.display());
        document.save(&path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn culture(raw: &str) -> Culture {
        Culture::parse(raw).unwrap()
    }

    fn store(dir: &Path) -> ResourceStore {
        let resolver = CultureFileResolver::new(dir.join("Language.json"), culture("en"));
        ResourceStore::new(resolver)
    }

    #[test]
    fn upsert_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        let fr = culture("fr");

        store.upsert("a", "1", &fr).unwrap();
        store.upsert("b", "2", &fr).unwrap();
        store.upsert("a", "3", &fr).unwrap();

        assert_eq!(
            store.list(&fr).unwrap(),
            vec![ResourceEntry::new("a", "3"), ResourceEntry::new("b", "2")]
        );
    }

    #[test]
    fn keys_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        let en = culture("en");

        store.upsert("Title", "Upper", &en).unwrap();
        store.upsert("title", "lower", &en).unwrap();

        assert_eq!(store.get("Title", &en).unwrap().as_deref(), Some("Upper"));
        assert_eq!(store.get("title", &en).unwrap().as_deref(), Some("lower"));
        assert_eq!(store.get("TITLE", &en).unwrap(), None);
    }

    #[test]
    fn empty_key_is_rejected_on_write_and_absent_on_read() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        let en = culture("en");

        assert!(matches!(store.upsert("", "x", &en), Err(LocalizerError::EmptyKey)));
        assert_eq!(store.get("", &en).unwrap(), None);
        assert!(store.list(&en).unwrap().is_empty());
    }

    #[test]
    fn empty_values_are_kept() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        let en = culture("en");

        store.upsert("blank", "", &en).unwrap();
        assert_eq!(store.get("blank", &en).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn removing_a_missing_key_does_not_rewrite() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        let de = culture("de");
        store.upsert("kept", "ja", &de).unwrap();

        let path = store.resolver().path_for(&de);
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(!store.remove("missing", &de).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(store.remove("kept", &de).unwrap());
        assert!(store.list(&de).unwrap().is_empty());
    }

    #[test]
    fn remove_everywhere_only_sweeps_known_cultures() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path()).with_known_cultures(vec![culture("tr-TR"), culture("en-US")]);

        for raw in ["tr", "en", "fr"] {
            store.upsert("title", raw, &culture(raw)).unwrap();
        }
        store.remove_everywhere("title").unwrap();

        assert_eq!(store.get("title", &culture("tr")).unwrap(), None);
        assert_eq!(store.get("title", &culture("en")).unwrap(), None);
        assert_eq!(store.get("title", &culture("fr")).unwrap().as_deref(), Some("fr"));
    }

    #[test]
    fn remove_from_all_sweeps_every_file() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());

        for raw in ["en", "fr", "ja"] {
            store.upsert("title", raw, &culture(raw)).unwrap();
        }
        store.upsert("other", "x", &culture("de")).unwrap();

        assert_eq!(store.remove_from_all("title").unwrap(), 3);
        for raw in ["en", "fr", "ja"] {
            assert_eq!(store.get("title", &culture(raw)).unwrap(), None);
        }
        assert_eq!(store.get("other", &culture("de")).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn locked_writers_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path()).with_file_locks(true);
        let it = culture("it");

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let store = &store;
                let it = &it;
                scope.spawn(move || {
                    for i in 0..10 {
                        store.upsert(&format!("key-{worker}-{i}"), "v", it).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.list(&it).unwrap().len(), 40);
    }

    #[test]
    fn storage_errors_propagate() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        std::fs::write(dir.path().join("Language.json"), "not json").unwrap();

        assert!(matches!(store.get("x", &culture("en")), Err(LocalizerError::Malformed { .. })));
        assert!(store.upsert("x", "y", &culture("en")).is_err());
    }
}
