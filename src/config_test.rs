use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_meetroom_env() {
    unsafe {
        std::env::remove_var("MEETROOM_API_BASE_URL");
        std::env::remove_var("MEETROOM_STATE_FILE");
        std::env::remove_var("MEETROOM_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("MEETROOM_CONNECT_TIMEOUT_SECS");
    }
}

// =============================================================================
// from_env
// =============================================================================

#[test]
fn from_env_uses_defaults() {
    unsafe {
        clear_meetroom_env();
        std::env::set_var("MEETROOM_STATE_FILE", "/tmp/meetroom-test.json");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.state_file, PathBuf::from("/tmp/meetroom-test.json"));
    assert_eq!(cfg.timeouts, Timeouts::default());

    unsafe { clear_meetroom_env() };
}

#[test]
fn from_env_parses_overrides() {
    unsafe {
        clear_meetroom_env();
        std::env::set_var("MEETROOM_API_BASE_URL", "https://rooms.example.test/api/");
        std::env::set_var("MEETROOM_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("MEETROOM_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://rooms.example.test/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });

    unsafe { clear_meetroom_env() };
}

#[test]
fn from_env_bad_timeout_falls_back() {
    unsafe {
        clear_meetroom_env();
        std::env::set_var("MEETROOM_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_meetroom_env() };
}

// =============================================================================
// new
// =============================================================================

#[test]
fn new_rejects_non_http_url() {
    let err = ClientConfig::new("ftp://rooms", "/tmp/x.json").unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn new_trims_trailing_slashes() {
    let cfg = ClientConfig::new("http://localhost:8080/api//", "/tmp/x.json").unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost:8080/api");
}
