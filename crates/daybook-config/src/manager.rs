use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const FILE_NAME: &str = "config.json";
const BACKUP_PREFIX: &str = "config_";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// Loads, saves and snapshots the [`Config`] file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// `<base>/config/config.json` with backups under `<base>/config/backups`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let dir = base.join("config");
        let manager = Self::new(dir.join(FILE_NAME), dir.join("backups"));
        fs::create_dir_all(&manager.backups_dir)?;
        Ok(manager)
    }

    /// Manager rooted at the default data directory (honours `DAYBOOK_HOME`).
    pub fn default_location() -> Result<Self, ConfigError> {
        Self::with_base_dir(Config::default().resolve_data_root())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Stored configuration, or the defaults when nothing was saved yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.is_file() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let config = read(&self.config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates, then replaces the config file through a temporary sibling.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let staging = self.config_path.with_extension("json.tmp");
        write(&staging, config)?;
        fs::rename(&staging, &self.config_path)?;
        Ok(())
    }

    /// Writes `config` to a timestamped backup and returns its file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let stamp = Utc::now().format(STAMP_FORMAT);
        let name = match note.map(slug).filter(|label| !label.is_empty()) {
            Some(label) => format!("{BACKUP_PREFIX}{stamp}_{label}.json"),
            None => format!("{BACKUP_PREFIX}{stamp}.json"),
        };
        write(&self.backups_dir.join(&name), config)?;
        tracing::info!(backup = %name, "configuration backed up");
        Ok(name)
    }

    /// Reinstates a backup as the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.is_file() {
            return Err(ConfigError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("configuration backup `{backup_name}` not found"),
            )));
        }
        let config = read(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.backups_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(BACKUP_PREFIX) && name.ends_with(".json"))
            .collect();
        names.sort_by(|a, b| (backup_stamp(b), b).cmp(&(backup_stamp(a), a)));
        Ok(names)
    }
}

fn read(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn write(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json =
        serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

/// Lowercase ASCII words joined by dashes.
fn slug(note: &str) -> String {
    note.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn backup_stamp(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(BACKUP_PREFIX)?.get(..STAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}
