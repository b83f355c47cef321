//! Configuration loading for Campus.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.campus/config.toml` in the working directory)
//! 3. User config (`<campus_home>/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CampusError, Result};
use crate::util::read_to_string_limited;

/// Main configuration struct for Campus.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the JSON tables and their backups live.
    pub storage: StorageConfig,
    /// Audit log locations.
    pub audit: AuditConfig,
    /// Course catalog limits.
    pub catalog: CatalogConfig,
    /// Admin account.
    pub admin: AdminConfig,
}

/// Table storage locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `usuario.json`, `cursos.json`, and so on.
    /// Defaults to `<campus_home>/data`.
    pub data_dir: Option<PathBuf>,
    /// Directory receiving table backups. Defaults to `<data_dir>/backups`.
    pub backup_dir: Option<PathBuf>,
}

/// Audit log locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory for audit files. Defaults to `<campus_home>/logs`.
    pub log_dir: Option<PathBuf>,
    /// File name of the user activity log.
    pub user_log: String,
    /// File name of the admin activity log.
    pub admin_log: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            user_log: "logger_user.log".to_string(),
            admin_log: "log_admin.log".to_string(),
        }
    }
}

/// Course catalog limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum number of courses per level.
    pub max_courses_per_level: usize,
    /// Maximum number of characters of course content; longer content is cut.
    pub max_content_chars: usize,
}

/// Default cap of courses per level.
pub const DEFAULT_MAX_COURSES_PER_LEVEL: usize = 7;

/// Default course content limit in characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 5000;

impl CatalogConfig {
    /// A cap of zero would make every level permanently full.
    pub fn is_valid_max_courses(value: usize) -> bool {
        value >= 1
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_courses_per_level: DEFAULT_MAX_COURSES_PER_LEVEL,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

/// Admin account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin login name.
    pub username: String,
    /// Argon2 PHC string of the admin password. Admin commands are refused
    /// while this is unset.
    pub password_hash: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_hash: None,
        }
    }
}

impl Config {
    /// Load configuration with the full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    fn load_user_config() -> Option<Config> {
        let path = campus_home()?.join("config.toml");
        Self::load_optional(&path)
    }

    fn load_project_config(cwd: &Path) -> Option<Config> {
        let path = cwd.join(".campus").join("config.toml");
        Self::load_optional(&path)
    }

    /// A missing file is silent; a broken one is reported and skipped.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| CampusError::config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("CAMPUS_DATA_DIR") {
            if val.is_empty() {
                tracing::warn!("CAMPUS_DATA_DIR is empty, ignoring");
            } else {
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("CAMPUS_LOG_DIR") {
            if val.is_empty() {
                tracing::warn!("CAMPUS_LOG_DIR is empty, ignoring");
            } else {
                self.audit.log_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("CAMPUS_MAX_COURSES_PER_LEVEL") {
            match val.parse::<usize>() {
                Ok(n) if CatalogConfig::is_valid_max_courses(n) => {
                    self.catalog.max_courses_per_level = n;
                }
                _ => tracing::warn!(
                    "Invalid CAMPUS_MAX_COURSES_PER_LEVEL value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val,
                    self.catalog.max_courses_per_level
                ),
            }
        }

        if let Ok(val) = env::var("CAMPUS_MAX_CONTENT_CHARS") {
            match val.parse::<usize>() {
                Ok(n) => self.catalog.max_content_chars = n,
                Err(_) => tracing::warn!(
                    "Invalid CAMPUS_MAX_CONTENT_CHARS value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val,
                    self.catalog.max_content_chars
                ),
            }
        }

        if let Ok(val) = env::var("CAMPUS_ADMIN_USER") {
            if val.trim().is_empty() {
                tracing::warn!("CAMPUS_ADMIN_USER is empty, ignoring");
            } else {
                self.admin.username = val;
            }
        }

        if let Ok(val) = env::var("CAMPUS_ADMIN_PASSWORD_HASH") {
            if val.is_empty() {
                tracing::warn!("CAMPUS_ADMIN_PASSWORD_HASH is empty, ignoring");
            } else {
                self.admin.password_hash = Some(val);
            }
        }
    }

    /// Merge another config into this one; `other` takes precedence.
    ///
    /// Optional fields override when set. Plain fields override when they
    /// differ from the default, so a layer cannot reset a lower layer's
    /// customization back to the default value.
    fn merge(mut self, other: Config) -> Self {
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.storage.backup_dir.is_some() {
            self.storage.backup_dir = other.storage.backup_dir;
        }

        let default_audit = AuditConfig::default();
        if other.audit.log_dir.is_some() {
            self.audit.log_dir = other.audit.log_dir;
        }
        if other.audit.user_log != default_audit.user_log {
            self.audit.user_log = other.audit.user_log;
        }
        if other.audit.admin_log != default_audit.admin_log {
            self.audit.admin_log = other.audit.admin_log;
        }

        let default_catalog = CatalogConfig::default();
        if other.catalog.max_courses_per_level != default_catalog.max_courses_per_level {
            if CatalogConfig::is_valid_max_courses(other.catalog.max_courses_per_level) {
                self.catalog.max_courses_per_level = other.catalog.max_courses_per_level;
            } else {
                tracing::warn!("catalog.max_courses_per_level must be >= 1, ignoring");
            }
        }
        if other.catalog.max_content_chars != default_catalog.max_content_chars {
            self.catalog.max_content_chars = other.catalog.max_content_chars;
        }

        if other.admin.username != AdminConfig::default().username {
            self.admin.username = other.admin.username;
        }
        if other.admin.password_hash.is_some() {
            self.admin.password_hash = other.admin.password_hash;
        }

        self
    }

    /// Resolved table directory.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| home_or_cwd().join("data"))
    }

    /// Resolved backup directory.
    pub fn backup_dir(&self) -> PathBuf {
        self.storage
            .backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("backups"))
    }

    /// Resolved audit log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.audit
            .log_dir
            .clone()
            .unwrap_or_else(|| home_or_cwd().join("logs"))
    }

    /// Path of the user activity log.
    pub fn user_log_path(&self) -> PathBuf {
        self.log_dir().join(&self.audit.user_log)
    }

    /// Path of the admin activity log.
    pub fn admin_log_path(&self) -> PathBuf {
        self.log_dir().join(&self.audit.admin_log)
    }
}

/// Get the Campus home directory.
///
/// `CAMPUS_HOME` wins when set and non-empty; otherwise `~/.campus`.
pub fn campus_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("CAMPUS_HOME") {
        if home.is_empty() {
            tracing::warn!("CAMPUS_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("CAMPUS_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".campus"))
}

fn home_or_cwd() -> PathBuf {
    campus_home().unwrap_or_else(|| {
        tracing::warn!("no home directory, keeping data under ./.campus");
        PathBuf::from(".campus")
    })
}
