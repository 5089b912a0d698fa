mod auth_support;

use std::fs;
use std::sync::Arc;

use sheaf::auth::{FileStorage, FileStorageConfig, TokenStore, TOKEN_KEY};
use tempfile::TempDir;

use auth_support::{bundle, expired_bundle, fresh_bundle, profile_body};

fn file_store(dir: &TempDir) -> TokenStore {
    TokenStore::new(Arc::new(FileStorage::new(FileStorageConfig::new(
        dir.path().to_path_buf(),
    ))))
}

#[test]
fn bundle_round_trips_across_store_instances() {
    let dir = TempDir::new().unwrap();

    let writer = file_store(&dir);
    writer.save_bundle(&fresh_bundle()).unwrap();
    let user: sheaf::auth::UserProfile = serde_json::from_value(profile_body()).unwrap();
    writer.save_user(&user).unwrap();

    let reader = file_store(&dir);
    let stored = reader.valid_bundle().unwrap().expect("bundle on disk");
    assert_eq!(stored.access_token, "access-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(reader.load_user().unwrap().expect("user on disk"), user);
}

#[test]
fn records_are_versioned_toml_envelopes() {
    let dir = TempDir::new().unwrap();
    file_store(&dir).save_bundle(&fresh_bundle()).unwrap();

    let raw = fs::read_to_string(dir.path().join("sheaf_auth_tokens.toml")).unwrap();
    let record: toml::Value = toml::from_str(&raw).unwrap();
    assert_eq!(record["version"].as_integer(), Some(1));
    assert_eq!(record["key"].as_str(), Some(TOKEN_KEY));
    assert!(record["value"].as_str().unwrap().contains("access-1"));
    assert!(record.get("saved_at").is_some());
}

#[test]
fn expired_record_is_swept_on_read() {
    let dir = TempDir::new().unwrap();
    file_store(&dir).save_bundle(&expired_bundle()).unwrap();

    let reader = file_store(&dir);
    assert!(reader.valid_bundle().unwrap().is_none());
    assert!(!dir.path().join("sheaf_auth_tokens.toml").exists());
}

#[test]
fn corrupt_record_reads_as_absent_and_can_be_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sheaf_auth_tokens.toml");
    fs::write(&path, "version = [not toml").unwrap();

    let store = file_store(&dir);
    assert!(store.valid_bundle().unwrap().is_none());

    store.save_bundle(&bundle("access-new", None, 3600)).unwrap();
    let stored = store.valid_bundle().unwrap().expect("fresh bundle");
    assert_eq!(stored.access_token, "access-new");
}

#[test]
fn clear_removes_token_and_user_records() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    store.save_bundle(&fresh_bundle()).unwrap();
    let user: sheaf::auth::UserProfile = serde_json::from_value(profile_body()).unwrap();
    store.save_user(&user).unwrap();

    store.clear().unwrap();

    assert!(store.peek_bundle().unwrap().is_none());
    assert!(store.load_user().unwrap().is_none());
    assert!(!dir.path().join("sheaf_auth_tokens.toml").exists());
    assert!(!dir.path().join("sheaf_auth_user.toml").exists());
}

#[cfg(unix)]
#[test]
fn record_files_are_mode_0600() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    file_store(&dir).save_bundle(&fresh_bundle()).unwrap();

    let mode = fs::metadata(dir.path().join("sheaf_auth_tokens.toml"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}
