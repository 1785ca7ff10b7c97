//! Loading and hot-reloading parameter files.

use hs_config::{names, ClientParameters, ConfigError, ParameterSource};
use std::io::Write;
use std::sync::Arc;

fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

#[test]
fn loads_json_overrides() {
    let file = write_file(
        ".json",
        r#"{ "SelectRandomizedTLSProfileProbability": 0.5, "LimitTLSProfiles": ["Chrome-72"] }"#,
    );
    let params = ClientParameters::from_file(file.path()).unwrap().get();

    assert_eq!(
        params.float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY),
        Some(0.5)
    );
    assert_eq!(
        params.strings(names::LIMIT_TLS_PROFILES),
        Some(vec!["Chrome-72".to_string()])
    );
}

#[test]
fn loads_yaml_overrides() {
    let file = write_file(
        ".yaml",
        "SelectRandomizedTLSProfileProbability: 0.75\nTLSHandshakeTimeout: 5\n",
    );
    let params = ClientParameters::from_file(file.path()).unwrap().get();

    assert_eq!(
        params.float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY),
        Some(0.75)
    );
    assert_eq!(params.float(names::TLS_HANDSHAKE_TIMEOUT), Some(5.0));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let file = write_file(".json", "{ not json");
    assert!(matches!(
        ClientParameters::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn reload_is_visible_to_new_readers_only() {
    let file = write_file(".json", r#"{ "SelectRandomizedTLSProfileProbability": 0.1 }"#);
    let holder = ClientParameters::from_file(file.path()).unwrap();
    let old: Arc<_> = holder.get();

    std::fs::write(file.path(), r#"{ "SelectRandomizedTLSProfileProbability": 0.6 }"#).unwrap();
    holder.reload_from_file(file.path()).unwrap();

    assert_eq!(
        old.float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY),
        Some(0.1)
    );
    assert_eq!(
        holder
            .get()
            .float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY),
        Some(0.6)
    );
}

#[test]
fn concurrent_readers_see_whole_snapshots() {
    let holder = Arc::new(ClientParameters::default());
    let writer = {
        let holder = Arc::clone(&holder);
        std::thread::spawn(move || {
            for i in 0..200 {
                let p = if i % 2 == 0 { 0.2 } else { 0.8 };
                holder
                    .set(Some(&serde_json::json!({
                        "SelectRandomizedTLSProfileProbability": p,
                        "TLSHandshakeTimeout": p * 10.0,
                    })))
                    .unwrap();
            }
        })
    };

    for _ in 0..2000 {
        let snap = holder.get();
        let p = snap
            .float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY)
            .unwrap();
        let t = snap.float(names::TLS_HANDSHAKE_TIMEOUT).unwrap();
        // defaults, or one of the two written pairs
        assert!(
            (p == 0.25 && t == 20.0) || (p - t / 10.0).abs() < 1e-9,
            "torn snapshot: p={p} t={t}"
        );
    }
    writer.join().unwrap();
}
