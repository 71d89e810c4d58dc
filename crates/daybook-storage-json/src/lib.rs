use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use daybook_core::{
    storage::{snapshot_warnings, SnapshotBackupInfo, SnapshotStorage},
    CoreError,
};
use daybook_domain::{DaybookSnapshot, CURRENT_SCHEMA_VERSION};

const SNAPSHOT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAGING_EXTENSION: &str = "json.tmp";
const FALLBACK_NAME: &str = "daybook";
const DEFAULT_RETENTION: usize = 5;

/// Filesystem-backed JSON persistence for day-book snapshots and their backups.
#[derive(Clone)]
pub struct JsonSnapshotStorage {
    daybooks_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonSnapshotStorage {
    pub fn new(daybooks_dir: PathBuf, backups_dir: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(daybooks_dir, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        daybooks_dir: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, CoreError> {
        fs::create_dir_all(&daybooks_dir)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            daybooks_dir,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.daybooks_dir
            .join(format!("{}.{}", canonical_name(name), SNAPSHOT_EXTENSION))
    }

    pub fn list_snapshot_metadata(&self) -> Result<Vec<SnapshotMetadata>, CoreError> {
        let mut entries = Vec::new();
        for slug in self.list_snapshots()? {
            let snapshot = self.load_snapshot(&slug)?;
            entries.push(SnapshotMetadata {
                path: self.snapshot_path(&slug),
                slug,
                name: snapshot.name.clone(),
                created_at: snapshot.created_at,
                updated_at: snapshot.updated_at,
                customer_count: snapshot.customers.len(),
                record_count: snapshot.record_count(),
                has_mpp_customer: snapshot.mpp_customer().is_some(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn list_backup_metadata(&self, name: &str) -> Result<Vec<BackupMetadata>, CoreError> {
        let mut rows = Vec::new();
        for entry in self.list_backups(name)? {
            let size_bytes = fs::metadata(&entry.path)
                .map(|meta| meta.len())
                .unwrap_or(0);
            rows.push(BackupMetadata {
                created_at: parse_backup_timestamp(&entry.id),
                name: entry.id,
                size_bytes,
                path: entry.path,
            });
        }
        rows.sort_by_key(|meta| Reverse(meta.created_at));
        Ok(rows)
    }

    pub fn delete_backup(&self, name: &str, backup_id: &str) -> Result<(), CoreError> {
        let path = self.backup_dir(name).join(backup_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    /// `<slug>_<stamp>[_<note>].json` inside the day-book's backup folder.
    fn next_backup_path(&self, name: &str, note: Option<&str>) -> Result<PathBuf, CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let stamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let file_name = match sanitize_backup_note(note) {
            Some(label) => format!("{}_{stamp}_{label}.{SNAPSHOT_EXTENSION}", canonical_name(name)),
            None => format!("{}_{stamp}.{SNAPSHOT_EXTENSION}", canonical_name(name)),
        };
        Ok(dir.join(file_name))
    }

    /// Keeps the newest `retention` backups of `name`.
    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        for stale in self.list_backups(name)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                tracing::warn!(path = %stale.path.display(), %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl SnapshotStorage for JsonSnapshotStorage {
    fn save_snapshot(&self, name: &str, snapshot: &DaybookSnapshot) -> Result<(), CoreError> {
        let path = self.snapshot_path(name);
        if path.is_file() {
            fs::copy(&path, self.next_backup_path(name, None)?)?;
            self.prune_backups(name)?;
        }
        save_snapshot_to_path(snapshot, &path)
    }

    fn load_snapshot(&self, name: &str) -> Result<DaybookSnapshot, CoreError> {
        load_snapshot_from_path(&self.snapshot_path(name))
    }

    fn list_snapshots(&self) -> Result<Vec<String>, CoreError> {
        if !self.daybooks_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.daybooks_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_snapshot(&self, name: &str) -> Result<(), CoreError> {
        let path = self.snapshot_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn load_snapshot_from_path(&self, path: &Path) -> Result<DaybookSnapshot, CoreError> {
        load_snapshot_from_path(path)
    }

    fn backup_snapshot(
        &self,
        name: &str,
        snapshot: &DaybookSnapshot,
        note: Option<&str>,
    ) -> Result<SnapshotBackupInfo, CoreError> {
        let path = self.next_backup_path(name, note)?;
        write_file(&path, &serialize_snapshot(snapshot)?)?;
        self.prune_backups(name)?;
        let id = path
            .file_name()
            .and_then(|file| file.to_str())
            .unwrap_or_default()
            .to_string();
        tracing::info!(daybook = name, backup = %id, "backup written");
        Ok(SnapshotBackupInfo {
            daybook: canonical_name(name),
            created_at: parse_backup_timestamp(&id)
                .map(|stamp| stamp.to_rfc3339())
                .unwrap_or_else(|| id.clone()),
            id,
            path,
        })
    }

    fn list_backups(&self, name: &str) -> Result<Vec<SnapshotBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = canonical_name(name);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(SnapshotBackupInfo {
                    daybook: slug.clone(),
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name)
                        .map(|stamp| stamp.to_rfc3339())
                        .unwrap_or_else(|| file_name.to_string()),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(&b.id)
                .cmp(&parse_backup_timestamp(&a.id))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn restore_backup(&self, backup: &SnapshotBackupInfo) -> Result<DaybookSnapshot, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let target = self.snapshot_path(&backup.daybook);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&backup.path, &target)?;
        tracing::info!(daybook = %backup.daybook, backup = %backup.id, "backup restored");
        load_snapshot_from_path(&target)
    }
}

/// Saves a snapshot to an arbitrary path, writing a temporary file first.
pub fn save_snapshot_to_path(snapshot: &DaybookSnapshot, path: &Path) -> Result<(), CoreError> {
    let staging = path.with_extension(STAGING_EXTENSION);
    write_file(&staging, &serialize_snapshot(snapshot)?)?;
    fs::rename(&staging, path)?;
    Ok(())
}

/// Loads a snapshot from disk and logs any consistency warnings it carries.
pub fn load_snapshot_from_path(path: &Path) -> Result<DaybookSnapshot, CoreError> {
    let data = fs::read_to_string(path)?;
    let snapshot: DaybookSnapshot =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "snapshot schema {} is newer than supported {}",
            snapshot.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    for warning in snapshot_warnings(&snapshot) {
        tracing::warn!(path = %path.display(), "{warning}");
    }
    Ok(snapshot)
}

#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_count: usize,
    pub record_count: usize,
    pub has_mpp_customer: bool,
}

#[derive(Debug, Clone)]
pub struct BackupMetadata {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Lowercase slug used for file and folder names; symbols become `_`.
fn canonical_name(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '_' })
        .collect();
    if slug.chars().all(|ch| ch == '_') {
        FALLBACK_NAME.to_string()
    } else {
        slug
    }
}

/// Dash-joined lowercase words of a backup note.
fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let words: Vec<String> = note?
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

/// Finds the last `YYYYMMDD_HHMMSS` pair in a backup file name.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{SNAPSHOT_EXTENSION}"))?;
    let parts: Vec<&str> = stem.split('_').collect();
    parts.windows(2).rev().find_map(|pair| {
        let joined = format!("{}_{}", pair[0], pair[1]);
        if joined.len() != 15 {
            return None;
        }
        NaiveDateTime::parse_from_str(&joined, BACKUP_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn serialize_snapshot(snapshot: &DaybookSnapshot) -> Result<String, CoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_replaces_symbols() {
        assert_eq!(canonical_name("Main Outlet #2"), "main_outlet__2");
        assert_eq!(canonical_name(" !! "), "daybook");
    }

    #[test]
    fn backup_timestamp_is_found_after_slug_and_before_note() {
        let stamp = parse_backup_timestamp("main_outlet_20240105_081530_before-import.json")
            .expect("timestamp");
        assert_eq!(stamp.to_rfc3339(), "2024-01-05T08:15:30+00:00");
        assert!(parse_backup_timestamp("main.json").is_none());
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Before GST change. ")).as_deref(),
            Some("before-gst-change")
        );
        assert_eq!(sanitize_backup_note(Some("!!!")), None);
    }
}
