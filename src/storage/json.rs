use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::{
    models::store::{CURRENT_VERSION, Store},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version},
    },
};

/// Backups kept next to the store file
const MAX_BACKUPS: usize = 5;

/// Pretty JSON on disk, replaced atomically on every save.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir_all(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        self.create_backup_dir()?;
        let backup_path = self.get_backup_path();
        let bytes = fs::copy(&self.path, &backup_path).map_err(|e| StorageError::BackupFailed {
            path: backup_path.clone(),
            source: e,
        })?;

        tracing::debug!(backup = %backup_path.display(), bytes, "backed up store");

        Ok(bytes)
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        file_entries.sort();

        let excess = file_entries.len().saturating_sub(MAX_BACKUPS);
        for file_path in &file_entries[..excess] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("store");
        // Zero-padded so lexical order is age order
        let millis = jiff::Timestamp::now().as_millisecond();

        self.get_backup_dir().join(format!("{stem}-{millis:015}.json"))
    }

    fn parse_failed(&self, source: serde_json::Error) -> StorageError {
        StorageError::ParseFailed {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store yet, starting empty");
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let file_version = detect_version(&content, &self.path)?;
        if file_version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(file_version));
        }

        let mut data: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| self.parse_failed(e))?;

        if file_version < CURRENT_VERSION {
            data = apply_migrations(data, file_version, CURRENT_VERSION)?;
        }

        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
        }

        serde_json::from_value(data).map_err(|e| self.parse_failed(e))
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let json =
            to_string_pretty(store).map_err(|e| StorageError::SerializeFailed { source: e })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::SaveFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::services::{
        ledger::{CreateProjectParameters, create_project},
        time_accounting::ManualEntryParameters,
        tracking::record_manual_entry,
    };

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("truerate_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir("save_and_load");
        let mut store = Store::default();
        let project = create_project(
            &mut store,
            CreateProjectParameters {
                name: "Miller Wedding".into(),
                description: Some("Full day".into()),
                total_budget: 3000.0,
                expenses: 250.0,
                estimated_time: 25.0,
                due_date: date(2024, 9, 1),
                tags: vec!["Wedding".into()],
            },
        )
        .unwrap();
        record_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id: project.id,
                start_time: "2024-08-01T10:00:00Z".parse().unwrap(),
                end_time: "2024-08-01T12:00:00Z".parse().unwrap(),
                notes: Some("Engagement shoot".into()),
            },
        )
        .unwrap();

        let storage = JsonFileStorage::new(dir.join("store.json"));
        storage.save(&store).expect("Should correctly save the store");
        let loaded = storage.load().expect("Should correctly load the saved store");

        assert_eq!(loaded, store);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty_store() {
        let dir = temp_dir("missing");
        let storage = JsonFileStorage::new(dir.join("store.json"));

        let store = storage.load().unwrap();

        assert_eq!(store, Store::default());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = temp_dir("invalid");
        let path = dir.join("store.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let result = JsonFileStorage::new(path).load();

        assert!(matches!(result, Err(StorageError::ParseFailed { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_without_version_field() {
        let dir = temp_dir("unversioned");
        let path = dir.join("store.json");
        fs::write(&path, r#"{ "projects": [], "time_entries": [] }"#).unwrap();

        let store = JsonFileStorage::new(path).load().unwrap();

        assert_eq!(store.version, CURRENT_VERSION);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_future_version() {
        let dir = temp_dir("future");
        let path = dir.join("store.json");
        fs::write(&path, r#"{ "version": 999, "projects": [] }"#).unwrap();

        let result = JsonFileStorage::new(path).load();

        assert!(matches!(result, Err(StorageError::FutureVersion(999))));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backup_creation_and_cleanup() {
        let dir = temp_dir("backups");
        let storage = JsonFileStorage::new(dir.join("store.json"));

        for i in 1..=7 {
            let store = Store {
                current_project_id: Some(Uuid::from_u128(i)),
                ..Store::default()
            };
            storage.save(&store).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let backup_count = fs::read_dir(dir.join("backups"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count();
        assert_eq!(backup_count, MAX_BACKUPS, "Should keep exactly 5 backups");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_first_save_makes_no_backup() {
        let dir = temp_dir("first_save");
        let storage = JsonFileStorage::new(dir.join("store.json"));
        let backups_dir = dir.join("backups");

        storage.save(&Store::default()).unwrap();
        assert!(!backups_dir.exists(), "Nothing to back up on first save");

        storage.save(&Store::default()).unwrap();
        assert!(backups_dir.is_dir(), "Backups dir created on second save");

        fs::remove_dir_all(&dir).unwrap();
    }
}
