//! Directory configuration
//!
//! Any directory may hold a `.autorename.ini` file that sets the naming
//! granularity for itself and everything below it:
//!
//! ```ini
//! [autorename]
//! prefix_timestamp = minute
//! ```
//!
//! The nearest file wins. A directory with its own file ignores its
//! ancestors; a directory without one inherits from the closest ancestor
//! that has one; with no file anywhere up to the root the granularity is
//! [`Granularity::Day`].
//!
//! A file that exists but cannot be understood is an error for every file it
//! governs. Falling back to the default there could rename a whole tree to
//! the wrong shape.
//!
//! Lookups go through the [`ConfigSource`] trait so a fake directory tree can
//! stand in for the filesystem:
//!
//! ```rust
//! use autorename::config::ConfigResolver;
//! use autorename::error::ConfigError;
//! use autorename::types::Granularity;
//! use std::path::Path;
//!
//! let mut resolver = ConfigResolver::new(|dir: &Path| -> Result<_, ConfigError> {
//!     Ok((dir == Path::new("/photos")).then_some(Granularity::Minute))
//! });
//! assert_eq!(resolver.resolve(Path::new("/photos/2020/trip")).unwrap(), Granularity::Minute);
//! assert_eq!(resolver.resolve(Path::new("/documents")).unwrap(), Granularity::Day);
//! ```

use crate::error::ConfigError;
use crate::types::Granularity;
use ::config::{Config, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Name of the per-directory configuration file
pub const CONFIG_FILE_NAME: &str = ".autorename.ini";

/// INI section holding autorename options
pub const CONFIG_SECTION: &str = "autorename";

/// Option selecting the granularity
pub const PREFIX_TIMESTAMP_OPTION: &str = "prefix_timestamp";

/// Reads the configuration defined directly in one directory
pub trait ConfigSource {
    /// Granularity configured in `dir` itself, `None` if `dir` has no
    /// configuration of its own. Ancestors are the resolver's business.
    fn load(&self, dir: &Path) -> Result<Option<Granularity>, ConfigError>;
}

impl<F> ConfigSource for F
where
    F: Fn(&Path) -> Result<Option<Granularity>, ConfigError>,
{
    fn load(&self, dir: &Path) -> Result<Option<Granularity>, ConfigError> {
        self(dir)
    }
}

/// Configuration stored in INI files on disk
#[derive(Debug, Clone)]
pub struct IniConfigSource {
    file_name: String,
}

impl IniConfigSource {
    /// Source reading [`CONFIG_FILE_NAME`]
    pub fn new() -> Self {
        Self::with_file_name(CONFIG_FILE_NAME)
    }

    /// Source reading a differently named file
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Name of the file looked for in each directory
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Default for IniConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for IniConfigSource {
    fn load(&self, dir: &Path) -> Result<Option<Granularity>, ConfigError> {
        let path = dir.join(&self.file_name);
        if !path.is_file() {
            return Ok(None);
        }
        parse_config_file(&path).map(Some)
    }
}

/// Parse one configuration file
///
/// # Errors
///
/// - [`ConfigError::Unreadable`] if the file is not valid INI
/// - [`ConfigError::MissingSection`] without an `[autorename]` section
/// - [`ConfigError::MissingOption`] without `prefix_timestamp`
/// - [`ConfigError::InvalidValue`] for anything but `day` or `minute`
pub fn parse_config_file(path: &Path) -> Result<Granularity, ConfigError> {
    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Ini).required(true))
        .build()
        .map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let section = match settings.get_table(CONFIG_SECTION) {
        Ok(section) => section,
        Err(::config::ConfigError::NotFound(_)) => {
            return Err(ConfigError::MissingSection {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    let value = section
        .get(PREFIX_TIMESTAMP_OPTION)
        .ok_or_else(|| ConfigError::MissingOption {
            path: path.to_path_buf(),
        })?
        .clone()
        .into_string()
        .map_err(|e| ConfigError::InvalidValue {
            path: path.to_path_buf(),
            value: e.to_string(),
        })?;

    parse_prefix_timestamp(path, &value)
}

/// Interpret a `prefix_timestamp` value read from `path`
pub fn parse_prefix_timestamp(path: &Path, value: &str) -> Result<Granularity, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        path: path.to_path_buf(),
        value: value.to_string(),
    })
}

/// Resolves the effective granularity of a directory
///
/// Every directory visited during a walk is cached with the walk's result,
/// failures included, so a tree is read at most once per run.
#[derive(Debug)]
pub struct ConfigResolver<S> {
    source: S,
    cache: HashMap<PathBuf, Result<Granularity, ConfigError>>,
}

impl<S: ConfigSource> ConfigResolver<S> {
    /// Create a resolver with an empty cache
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Effective granularity for files directly inside `dir`
    pub fn resolve(&mut self, dir: &Path) -> Result<Granularity, ConfigError> {
        if let Some(cached) = self.cache.get(dir) {
            return cached.clone();
        }

        let mut visited = Vec::new();
        let mut resolved = None;
        for ancestor in dir.ancestors() {
            if let Some(cached) = self.cache.get(ancestor) {
                resolved = Some(cached.clone());
                break;
            }
            visited.push(ancestor.to_path_buf());
            match self.source.load(ancestor) {
                Ok(Some(granularity)) => {
                    debug!("Configuration in {:?}: prefix_timestamp = {}", ancestor, granularity);
                    resolved = Some(Ok(granularity));
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    resolved = Some(Err(e));
                    break;
                }
            }
        }

        let resolved = resolved.unwrap_or(Ok(Granularity::default()));
        trace!("Resolved {:?} for {} directories", resolved, visited.len());
        for dir in visited {
            self.cache.insert(dir, resolved.clone());
        }
        resolved
    }

    /// Number of directories with a cached result
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }
}
