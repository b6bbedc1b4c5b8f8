use std::fs;
use std::path::{ Path, PathBuf };

use crate::culture::Culture;
use crate::document::ResourceDocument;
use crate::error::{ LocalizerError, Result };

/// Maps cultures to resource file paths.
///
/// The default culture owns the base file (`Language.json`); every other
/// culture gets its token inserted before the extension
/// (`Language.fr.json`). Files are created empty on first resolution.
#[derive(Debug, Clone)]
pub struct CultureFileResolver {
    base_file: PathBuf,
    default_culture: Culture,
}

impl CultureFileResolver {
    pub fn new(base_file: impl Into<PathBuf>, default_culture: Culture) -> Self {
        Self { base_file: base_file.into(), default_culture }
    }

    pub fn base_file(&self) -> &Path {
        &self.base_file
    }

    pub fn default_culture(&self) -> &Culture {
        &self.default_culture
    }

    /// Computes the file path for `culture` without touching storage.
    pub fn path_for(&self, culture: &Culture) -> PathBuf {
        if culture.same_file_as(&self.default_culture) {
            return self.base_file.clone();
        }

        match self.base_file.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                self.base_file.with_extension(format!("{}.{}", culture.token(), ext))
            }
            None => self.base_file.with_extension(culture.token()),
        }
    }

    /// Returns the file path for `culture`, creating an empty resource file
    /// there first if it does not exist yet.
    pub fn resolve(&self, culture: &Culture) -> Result<PathBuf> {
        let path = self.path_for(culture);
        if !path.exists() {
            ResourceDocument::create_empty(&path)?;
        }
        Ok(path)
    }

    /// Lists the cultures that currently have a resource file, default
    /// culture first, the rest sorted by token.
    pub fn cultures_on_disk(&self) -> Result<Vec<Culture>> {
        let mut cultures = Vec::new();
        if self.base_file.is_file() {
            cultures.push(self.default_culture.clone());
        }

        let dir = match self.base_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Ok(cultures);
        }

        let (stem, ext) = self.stem_and_extension();
        let prefix = format!("{}.", stem);
        let suffix = ext.map(|ext| format!(".{}", ext)).unwrap_or_default();

        let mut others = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| LocalizerError::io(&dir, e))? {
            let entry = entry.map_err(|e| LocalizerError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            let token = name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str()));
            let Some(token) = token else {
                continue;
            };
            // "Language.en-US.json" or temporary files never come from resolve()
            let Ok(culture) = Culture::parse(token) else {
                continue;
            };
            if culture.token() != token || culture.same_file_as(&self.default_culture) {
                continue;
            }
            if entry.path().is_file() {
                others.push(culture);
            }
        }

        others.sort_by(|a, b| a.token().cmp(b.token()));
        cultures.extend(others);
        Ok(cultures)
    }

    fn stem_and_extension(&self) -> (String, Option<String>) {
        let stem = self.base_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self.base_file.extension().map(|e| e.to_string_lossy().into_owned());
        (stem, ext)
    }
}
