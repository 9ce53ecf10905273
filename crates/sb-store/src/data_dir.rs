use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Result, StoreError};
use crate::identity::LocalIdentity;
use crate::settings::Settings;
use crate::store::Store;

pub const DEFAULT_PROFILE: &str = "default";

/// Default base directory for all skillbook storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".skillbook")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Sanitize a profile name for use as a filename.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn resolve_profile(name: Option<&str>) -> String {
    name.map(sanitize_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

/// One profile's store plus the shared settings file.
///
/// Layout:
/// ```text
/// ~/.skillbook/
/// ├── config.toml
/// └── profiles/
///     ├── default.db
///     └── ...
/// ```
pub struct DataDir {
    base: PathBuf,
    profile: String,
    store: Store,
}

impl DataDir {
    /// Open a profile, creating directories as needed.
    /// `base_dir` overrides `~/.skillbook`.
    pub fn open(profile: Option<&str>, base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        let profiles_dir = base.join("profiles");

        fs::create_dir_all(&profiles_dir).map_err(|e| StoreError::io(&profiles_dir, e))?;

        let profile = resolve_profile(profile);
        let store = Store::open(&profiles_dir.join(format!("{profile}.db")))?;
        tracing::debug!(profile = %profile, base = %base.display(), "opened profile");

        Ok(Self {
            base,
            profile,
            store,
        })
    }

    /// In-memory store; settings still resolve under `base`.
    pub fn open_in_memory(base: &Path) -> Result<Self> {
        Ok(Self {
            base: base.to_path_buf(),
            profile: DEFAULT_PROFILE.to_string(),
            store: Store::open_in_memory()?,
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn identity(&self) -> LocalIdentity<'_> {
        LocalIdentity::new(&self.store)
    }

    pub fn config_path(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.config_path())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.config_path())
    }

    /// Profile names that have a database under this base directory.
    pub fn profiles(&self) -> Result<Vec<String>> {
        let dir = self.base.join("profiles");
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                (path.extension()? == "db")
                    .then(|| path.file_stem()?.to_str().map(str::to_string))
                    .flatten()
            })
            .collect();
        names.sort();
        Ok(names)
    }
}
