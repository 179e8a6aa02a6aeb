//! Loaded module content

use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::application::errors::LoaderError;

/// Key whose value replaces the whole document when present
const DEFAULT_EXPORT: &str = "default";

/// One module file, parsed but not yet validated
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    /// File base name without extension
    pub name: String,
    pub path: PathBuf,
    pub value: Value,
}

impl LoadedModule {
    /// Parse module source, unwrapping a `default` export
    pub fn parse(path: impl AsRef<Path>, source: &str) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let value: Value = serde_yaml::from_str(source).map_err(|e| LoaderError::Load {
            path: path.to_path_buf(),
            reason: format!("Failed to parse module: {}", e),
        })?;

        let value = match value.get(DEFAULT_EXPORT).cloned() {
            Some(inner) => inner,
            None => value,
        };

        if value.is_null() {
            return Err(LoaderError::Load {
                path: path.to_path_buf(),
                reason: "module has no content".to_string(),
            });
        }

        Ok(Self {
            name: logical_name(path),
            path: path.to_path_buf(),
            value,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }
}

/// File base name with its last extension removed
pub fn logical_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Modules keyed by logical name, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: Vec<LoadedModule>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module; a module with the same logical name is replaced and returned
    pub fn insert(&mut self, module: LoadedModule) -> Option<LoadedModule> {
        let replaced = self
            .modules
            .iter()
            .position(|m| m.name == module.name)
            .map(|i| self.modules.remove(i));
        self.modules.push(module);
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&LoadedModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedModule> {
        self.modules.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl IntoIterator for ModuleSet {
    type Item = LoadedModule;
    type IntoIter = std::vec::IntoIter<LoadedModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_iter()
    }
}
