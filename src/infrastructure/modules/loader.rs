//! Module loader - Turns a directory of module files into loaded modules

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};

use super::module::{LoadedModule, ModuleSet};
use crate::application::errors::{ConfigError, LoaderError};

/// Extensions recognised when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Declaration-only files carry schema, no handler
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"\.d\.(ya?ml|json)$";

static DEFAULT_EXCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_EXCLUDE_PATTERN).expect("default exclude pattern is valid"));

/// Which files a scan picks up
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Extensions without the leading dot
    pub extensions: Vec<String>,
    pub recursive: bool,
    /// Matched against the file name
    pub exclude: Regex,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: false,
            exclude: DEFAULT_EXCLUDE.clone(),
        }
    }
}

impl LoadOptions {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn with_exclude_pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.exclude = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidValue(format!("exclude pattern {:?}: {}", pattern, e)))?;
        Ok(self)
    }

    /// A file qualifies if its extension is recognised and its name is not excluded
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|e| e == ext) && !self.exclude.is_match(file_name)
    }
}

/// Module loader
pub struct ModuleLoader {
    directory: PathBuf,
    options: LoadOptions,
}

impl ModuleLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// List qualifying files depth-first, each directory in lexicographic order
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoaderError> {
        let mut files = Vec::new();
        collect_files(&self.directory, &self.options, &mut files)?;
        Ok(files)
    }

    /// `discover` on the blocking pool, off the async workers
    pub async fn scan(&self) -> Result<Vec<PathBuf>, LoaderError> {
        let directory = self.directory.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>, LoaderError> {
            let mut files = Vec::new();
            collect_files(&directory, &options, &mut files)?;
            Ok(files)
        })
        .await
        .map_err(|e| LoaderError::DirectoryRead {
            path: self.directory.clone(),
            source: std::io::Error::other(e),
        })?
    }

    /// Load every qualifying file; failures are logged and skipped
    ///
    /// When two files share a logical name the later one in scan order wins
    /// and a warning names both.
    pub async fn load_all(&self) -> ModuleSet {
        let mut modules = ModuleSet::new();

        let files = match self.scan().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Error loading files from {}: {}", self.directory.display(), e);
                return modules;
            }
        };

        for path in files {
            match load_module(&path).await {
                Ok(module) => {
                    tracing::info!("Loaded file: {} from {}", module.name, path.display());
                    let name = module.name.clone();
                    if let Some(previous) = modules.insert(module) {
                        tracing::warn!(
                            "Duplicate module name '{}': {} replaces {}",
                            name,
                            path.display(),
                            previous.path.display()
                        );
                    }
                }
                Err(e) => tracing::error!("{}", e),
            }
        }

        tracing::info!(
            outcome = "success",
            "Successfully loaded {} files from {}",
            modules.len(),
            self.directory.display()
        );
        modules
    }

    /// Re-read one file from disk
    pub async fn reload_one(path: impl AsRef<Path>) -> Option<LoadedModule> {
        let path = path.as_ref();
        tracing::info!("Reloading file: {}", path.display());
        match load_module(path).await {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::error!("Failed to reload file: {}", e);
                None
            }
        }
    }
}

/// Every load reads the file fresh; nothing is cached between calls
async fn load_module(path: &Path) -> Result<LoadedModule, LoaderError> {
    let source = tokio::fs::read_to_string(path).await.map_err(|e| LoaderError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    LoadedModule::parse(path, &source)
}

fn collect_files(directory: &Path, options: &LoadOptions, files: &mut Vec<PathBuf>) -> Result<(), LoaderError> {
    let read_dir = std::fs::read_dir(directory).map_err(|e| LoaderError::DirectoryRead {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut entries: Vec<PathBuf> = read_dir
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                tracing::warn!("Failed to read directory entry: {}", e);
                None
            }
        })
        .collect();
    entries.sort();

    for path in entries {
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Failed to stat {}: {}", path.display(), e);
                continue;
            }
        };

        if metadata.is_dir() {
            if options.recursive {
                // a bad subdirectory is skipped, the rest of the scan continues
                if let Err(e) = collect_files(&path, options, files) {
                    tracing::error!("{}", e);
                }
            }
        } else if metadata.is_file() && options.accepts(&path) {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_accepts_extensions_and_exclude() {
        let options = LoadOptions::default();
        assert!(options.accepts(Path::new("add.yaml")));
        assert!(options.accepts(Path::new("add.json")));
        assert!(!options.accepts(Path::new("add.toml")));
        assert!(!options.accepts(Path::new("types.d.yaml")));
        assert!(!options.accepts(Path::new("README")));

        let options = options.with_extensions([".toml"]);
        assert!(options.accepts(Path::new("add.toml")));
    }

    #[test]
    fn test_bad_exclude_pattern_is_rejected() {
        assert!(LoadOptions::default().with_exclude_pattern("(").is_err());
    }

    #[test]
    fn test_discover_order_and_recursion() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.yaml", "x: 1");
        write(dir.path(), "a.yaml", "x: 1");
        write(dir.path(), "sub/c.yml", "x: 1");
        write(dir.path(), "sub/skip.d.yaml", "x: 1");
        write(dir.path(), "notes.txt", "x");

        let flat = ModuleLoader::new(dir.path()).discover().unwrap();
        assert_eq!(flat, vec![dir.path().join("a.yaml"), dir.path().join("b.yaml")]);

        let deep = ModuleLoader::new(dir.path())
            .with_options(LoadOptions::default().recursive(true))
            .discover()
            .unwrap();
        assert_eq!(
            deep,
            vec![
                dir.path().join("a.yaml"),
                dir.path().join("b.yaml"),
                dir.path().join("sub/c.yml"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ModuleLoader::new(dir.path().join("missing"));
        assert!(matches!(loader.discover(), Err(LoaderError::DirectoryRead { .. })));
        assert!(matches!(loader.scan().await, Err(LoaderError::DirectoryRead { .. })));
        assert!(loader.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_matches_discover() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "z.json", "{}");
        write(dir.path(), "m/a.yaml", "x: 1");
        write(dir.path(), "m/types.d.json", "{}");

        let loader = ModuleLoader::new(dir.path()).with_options(LoadOptions::default().recursive(true));
        let scanned = loader.scan().await.unwrap();
        assert_eq!(scanned, vec![dir.path().join("m/a.yaml"), dir.path().join("z.json")]);
        assert_eq!(scanned, loader.discover().unwrap());
    }

    #[tokio::test]
    async fn test_bad_file_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.yaml", "name: good");
        write(dir.path(), "bad.yaml", "name: [oops");
        write(dir.path(), "empty.yaml", "");

        let modules = ModuleLoader::new(dir.path()).load_all().await;
        assert_eq!(modules.names(), vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_names_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/info.yaml", "version: 1");
        write(dir.path(), "b/info.yaml", "version: 2");

        let modules = ModuleLoader::new(dir.path())
            .with_options(LoadOptions::default().recursive(true))
            .load_all()
            .await;

        assert_eq!(modules.len(), 1);
        let info = modules.get("info").unwrap();
        assert_eq!(info.path, dir.path().join("b/info.yaml"));
        assert_eq!(info.get("version").and_then(|v| v.as_u64()), Some(2));
    }

    #[tokio::test]
    async fn test_reload_one_reads_fresh_content() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ping.yaml", "reply: one");
        let path = dir.path().join("ping.yaml");

        let first = ModuleLoader::reload_one(&path).await.unwrap();
        write(dir.path(), "ping.yaml", "reply: two");
        let second = ModuleLoader::reload_one(&path).await.unwrap();

        assert_eq!(first.get("reply").and_then(|v| v.as_str()), Some("one"));
        assert_eq!(second.get("reply").and_then(|v| v.as_str()), Some("two"));
        assert!(ModuleLoader::reload_one(dir.path().join("gone.yaml")).await.is_none());
    }
}
