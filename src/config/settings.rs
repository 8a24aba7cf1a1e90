//! Backup settings for dumback
//!
//! Holds the configuration snapshot (destination, schedule, retention and the
//! directories to back up) and its JSON persistence.

use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::error::{DumbackError, DumbackResult};

/// Immutable configuration snapshot
///
/// Values are validated on construction, so a `BackupConfig` in hand always
/// has non-negative day counts and absolute, normalized paths. Updates build a
/// new snapshot and replace the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawBackupConfig")]
pub struct BackupConfig {
    last_backup: Option<NaiveDate>,
    dest_path: Option<PathBuf>,
    /// Zero disables automatic backups
    freq_days: u32,
    /// Zero keeps archives forever
    keep_days: u32,
    dirs_to_backup: Vec<PathBuf>,
}

/// Unvalidated on-disk representation
#[derive(Deserialize)]
struct RawBackupConfig {
    #[serde(default)]
    last_backup: Option<NaiveDate>,
    #[serde(default)]
    dest_path: Option<PathBuf>,
    #[serde(default)]
    freq_days: i64,
    #[serde(default)]
    keep_days: i64,
    #[serde(default)]
    dirs_to_backup: Vec<PathBuf>,
}

impl TryFrom<RawBackupConfig> for BackupConfig {
    type Error = DumbackError;

    fn try_from(raw: RawBackupConfig) -> Result<Self, Self::Error> {
        BackupConfig::new(
            raw.last_backup,
            raw.dest_path,
            raw.freq_days,
            raw.keep_days,
            raw.dirs_to_backup,
        )
    }
}

impl BackupConfig {
    /// Build a validated configuration snapshot
    ///
    /// # Errors
    ///
    /// Returns `DumbackError::Validation` if `freq_days` or `keep_days` is
    /// negative or does not fit the supported range.
    pub fn new(
        last_backup: Option<NaiveDate>,
        dest_path: Option<PathBuf>,
        freq_days: i64,
        keep_days: i64,
        dirs_to_backup: Vec<PathBuf>,
    ) -> DumbackResult<Self> {
        let freq_days = validate_days("freq_days", freq_days)?;
        let keep_days = validate_days("keep_days", keep_days)?;

        let dest_path = dest_path.map(|p| absolute_normalized(&p)).transpose()?;
        let dirs_to_backup = dirs_to_backup
            .iter()
            .map(|p| absolute_normalized(p))
            .collect::<DumbackResult<Vec<_>>>()?;

        Ok(Self {
            last_backup,
            dest_path,
            freq_days,
            keep_days,
            dirs_to_backup,
        })
    }

    pub fn last_backup(&self) -> Option<NaiveDate> {
        self.last_backup
    }

    pub fn dest_path(&self) -> Option<&Path> {
        self.dest_path.as_deref()
    }

    pub fn freq_days(&self) -> u32 {
        self.freq_days
    }

    pub fn keep_days(&self) -> u32 {
        self.keep_days
    }

    pub fn dirs_to_backup(&self) -> &[PathBuf] {
        &self.dirs_to_backup
    }

    /// Whether automatic backups are enabled
    pub fn auto_backup_enabled(&self) -> bool {
        self.freq_days > 0
    }

    /// Copy of this snapshot with `last_backup` replaced
    pub fn with_last_backup(&self, date: NaiveDate) -> Self {
        Self {
            last_backup: Some(date),
            ..self.clone()
        }
    }
}

fn validate_days(field: &str, value: i64) -> DumbackResult<u32> {
    if value < 0 {
        return Err(DumbackError::Validation(format!(
            "'{}' must be greater or equal to zero",
            field
        )));
    }
    u32::try_from(value)
        .map_err(|_| DumbackError::Validation(format!("'{}' is too large: {}", field, value)))
}

/// Make `path` absolute and fold `.` and `..` components without touching the
/// filesystem.
fn absolute_normalized(path: &Path) -> DumbackResult<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| DumbackError::at_path(path, e))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Persistence seam for the configuration snapshot
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration
    fn load(&self) -> DumbackResult<BackupConfig>;

    /// Persist `config`, replacing whatever was stored before
    fn save(&self, config: &BackupConfig) -> DumbackResult<()>;
}

/// Stores the configuration as pretty-printed JSON in the app directory
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    paths: AppPaths,
}

impl JsonConfigStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }
}

impl ConfigStore for JsonConfigStore {
    /// Load settings from disk, or defaults if the file doesn't exist
    fn load(&self) -> DumbackResult<BackupConfig> {
        let settings_path = self.paths.config_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(BackupConfig::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| DumbackError::at_path(&settings_path, e))?;

        serde_json::from_str(&contents).map_err(|e| {
            DumbackError::Config(format!(
                "Failed to parse settings file '{}': {}",
                settings_path.display(),
                e
            ))
        })
    }

    fn save(&self, config: &BackupConfig) -> DumbackResult<()> {
        self.paths.ensure_directories()?;

        let settings_path = self.paths.config_file();
        let contents = serde_json::to_string_pretty(config).map_err(|e| {
            DumbackError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| DumbackError::at_path(&settings_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let config = BackupConfig::default();
        assert!(config.last_backup().is_none());
        assert!(config.dest_path().is_none());
        assert_eq!(config.freq_days(), 0);
        assert_eq!(config.keep_days(), 0);
        assert!(!config.auto_backup_enabled());
    }

    #[test]
    fn test_non_negative_days_accepted() {
        for (freq, keep) in [(0, 0), (1, 0), (0, 30), (7, 365)] {
            let config = BackupConfig::new(None, None, freq, keep, Vec::new()).unwrap();
            assert_eq!(config.freq_days() as i64, freq);
            assert_eq!(config.keep_days() as i64, keep);
        }
    }

    #[test]
    fn test_negative_days_rejected() {
        let err = BackupConfig::new(None, None, -1, 0, Vec::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("freq_days"));

        let err = BackupConfig::new(None, None, 0, -5, Vec::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("keep_days"));
    }

    #[test]
    fn test_paths_are_normalized() {
        let config = BackupConfig::new(
            None,
            Some(PathBuf::from("/backups/./daily/../weekly")),
            0,
            0,
            vec![PathBuf::from("/home/me/docs/"), PathBuf::from("/home/me/docs")],
        )
        .unwrap();

        assert_eq!(config.dest_path(), Some(Path::new("/backups/weekly")));
        // Duplicates are kept in order
        assert_eq!(
            config.dirs_to_backup(),
            &[PathBuf::from("/home/me/docs"), PathBuf::from("/home/me/docs")]
        );
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let config =
            BackupConfig::new(None, Some(PathBuf::from("backups")), 0, 0, Vec::new()).unwrap();
        assert!(config.dest_path().unwrap().is_absolute());
    }

    #[test]
    fn test_with_last_backup() {
        let config = BackupConfig::new(None, None, 3, 10, Vec::new()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 11, 27).unwrap();
        let updated = config.with_last_backup(date);

        assert_eq!(updated.last_backup(), Some(date));
        assert_eq!(updated.freq_days(), 3);
        assert!(config.last_backup().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(AppPaths::with_base_dir(temp_dir.path().to_path_buf()));

        let config = BackupConfig::new(
            NaiveDate::from_ymd_opt(2025, 1, 31),
            Some(temp_dir.path().join("dest")),
            2,
            30,
            vec![temp_dir.path().join("a"), temp_dir.path().join("b")],
        )
        .unwrap();

        store.save(&config).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(AppPaths::with_base_dir(temp_dir.path().to_path_buf()));

        assert_eq!(store.load().unwrap(), BackupConfig::default());
    }

    #[test]
    fn test_load_rejects_negative_values() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.config_file(), r#"{"freq_days": -3}"#).unwrap();

        let err = JsonConfigStore::new(paths).load().unwrap_err();
        assert!(matches!(err, DumbackError::Config(_)));
        assert!(err.to_string().contains("freq_days"));
    }
}
