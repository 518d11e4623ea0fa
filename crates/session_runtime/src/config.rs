//! Immutable configuration passed into every session transition.

use std::{collections::BTreeSet, fs, path::Path};

use serde::{Deserialize, Serialize};
use session_contract::TabId;
use thiserror::Error;

/// Tab data buckets merged one level deeper by default.
pub const DEFAULT_DEEP_FIELDS: [&str; 5] = ["users", "games", "collections", "web", "toast"];
/// Scheme used when a collection resource is rewritten into a location.
pub const DEFAULT_INTERNAL_SCHEME: &str = "itch";
/// Resource prefix that triggers the internal-location rewrite.
pub const DEFAULT_COLLECTION_PREFIX: &str = "collections/";
/// Tab created for every newly opened window.
pub const DEFAULT_BOOTSTRAP_TAB: &str = "initial-tab";

/// Names of the tab data buckets that merge key by key instead of being replaced whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeepFieldSet(BTreeSet<String>);

impl DeepFieldSet {
    /// Builds a set from bucket names. Duplicates collapse.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// An empty set; every merge then behaves shallowly.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DeepFieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_DEEP_FIELDS)
    }
}

#[derive(Debug, Error)]
/// Failures while loading a [`SessionConfig`].
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The config body is not valid TOML for this schema.
    #[error("failed to parse session config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The config parsed but holds an unusable value.
    #[error("invalid session config: {0}")]
    Invalid(String),
}

/// Session-wide settings. Loaded once and shared read-only by all reducers.
///
/// Missing keys in a config file fall back to [`SessionConfig::default`], which matches the
/// built-in constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Buckets merged one level deeper on non-shallow merges.
    pub deep_fields: DeepFieldSet,
    /// Scheme for rewritten collection locations.
    pub internal_scheme: String,
    /// Resource prefix that forces an internal location.
    pub collection_prefix: String,
    /// Tab id given to the tab every new window starts with.
    pub bootstrap_tab: TabId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            deep_fields: DeepFieldSet::default(),
            internal_scheme: DEFAULT_INTERNAL_SCHEME.to_string(),
            collection_prefix: DEFAULT_COLLECTION_PREFIX.to_string(),
            bootstrap_tab: TabId::new(DEFAULT_BOOTSTRAP_TAB),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML config body.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] when a
    /// value fails [`SessionConfig::validate`].
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise the errors of
    /// [`SessionConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&body)
    }

    /// Rejects values that would make transitions ill-defined.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_scheme.trim().is_empty() {
            return Err(ConfigError::Invalid("internal_scheme must not be empty".into()));
        }
        if self.internal_scheme.contains(':') || self.internal_scheme.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "internal_scheme `{}` must be a bare scheme name",
                self.internal_scheme
            )));
        }
        if self.collection_prefix.is_empty() {
            return Err(ConfigError::Invalid("collection_prefix must not be empty".into()));
        }
        if self.bootstrap_tab.is_empty() {
            return Err(ConfigError::Invalid("bootstrap_tab must not be empty".into()));
        }
        Ok(())
    }

    /// Whether `resource` names a collection and must be shown at its internal location.
    pub fn is_collection_resource(&self, resource: &str) -> bool {
        resource.starts_with(&self.collection_prefix)
    }

    /// Internal location for a resource, such as `itch://collections/4`.
    pub fn internal_url(&self, resource: &str) -> String {
        format!("{}://{resource}", self.internal_scheme)
    }
}
