use std::path::Path;

use serde_json::Value;

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

/// Index `n` upgrades version `n + 1` to `n + 2`. Empty while the schema is
/// still at its first version.
fn get_migrations() -> Vec<MigrationFn> {
    vec![]
}

/// Returns 1 if version field is missing (assumes v1, our first versioned schema)
pub fn detect_version(content: &str, path: &Path) -> Result<u32, StorageError> {
    let value: Value = serde_json::from_str(content).map_err(|e| StorageError::ParseFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    match value.get("version") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::MalformedVersion(v.clone())),
        None => Ok(1),
    }
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let migration = version
            .checked_sub(1)
            .and_then(|idx| migrations.get(idx as usize))
            .ok_or(StorageError::UnsupportedVersion(version))?;

        data = migration(data)?;
        tracing::info!(from = version, to = version + 1, "migrated store");
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_version_with_version_field() {
        let json = r#"{"version": 1, "projects": [], "time_entries": []}"#;
        assert_eq!(detect_version(json, Path::new("store.json")).unwrap(), 1);
    }

    #[test]
    fn test_detect_version_without_version_field() {
        let json = r#"{"projects": [], "time_entries": []}"#;
        assert_eq!(detect_version(json, Path::new("store.json")).unwrap(), 1);
    }

    #[test]
    fn test_detect_version_malformed() {
        let json = r#"{"version": "two"}"#;
        assert!(matches!(
            detect_version(json, Path::new("store.json")),
            Err(StorageError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_apply_migrations_same_version() {
        let data = json!({"version": 1});
        let result = apply_migrations(data.clone(), 1, 1).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_apply_migrations_future_version() {
        let data = json!({"version": 5});
        let result = apply_migrations(data, 5, 1);
        assert!(matches!(result, Err(StorageError::FutureVersion(5))));
    }

    #[test]
    fn test_apply_migrations_past_known_chain() {
        let result = apply_migrations(json!({}), 1, 2);
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(1))));
    }

    #[test]
    fn test_apply_migrations_version_zero_is_unsupported() {
        let result = apply_migrations(json!({}), 0, 1);
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(0))));
    }
}
