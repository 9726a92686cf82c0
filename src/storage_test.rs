use super::*;

fn temp_path(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir()
        .join(format!("meetroom-storage-{}-{nanos}", std::process::id()))
        .join(name)
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_storage_starts_empty() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[test]
fn memory_storage_set_and_remove() {
    let storage = MemoryStorage::new();
    storage.set_items(&[(TOKEN_KEY, "abc"), (USER_KEY, "{}")]).unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(storage.get_item(USER_KEY).unwrap().as_deref(), Some("{}"));

    storage.remove_items(&[TOKEN_KEY, USER_KEY]).unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
}

#[test]
fn memory_storage_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    storage.remove_item("nope").unwrap();
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_missing_file_is_empty() {
    let storage = FileStorage::open(temp_path("missing.json")).unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_storage_survives_reopen() {
    let path = temp_path("session.json");
    {
        let storage = FileStorage::open(&path).unwrap();
        storage.set_items(&[(TOKEN_KEY, "tok-1"), (USER_KEY, r#"{"id":1}"#)]).unwrap();
    }

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
    assert_eq!(reopened.get_item(USER_KEY).unwrap().as_deref(), Some(r#"{"id":1}"#));

    reopened.remove_items(&[TOKEN_KEY, USER_KEY]).unwrap();
    let cleared = FileStorage::open(&path).unwrap();
    assert_eq!(cleared.get_item(TOKEN_KEY).unwrap(), None);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_storage_rejects_garbage() {
    let path = temp_path("garbage.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Codec { .. }));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[cfg(unix)]
#[test]
fn file_storage_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let path = temp_path("private.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{}").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let storage = FileStorage::open(&path).unwrap();
    storage.set_item(TOKEN_KEY, "secret").unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
