use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_hds_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("HDS__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = HdsNodeConfig::default();

    assert_eq!(config.server.listen_address.port(), 5682);
    assert_eq!(config.server.stream_buffer_size, 16);
    assert!(config.hds.enabled);
    assert_eq!(config.hds.interval_in_ms, 10_000);
    assert_eq!(config.hds.check.timeout_in_ms, 2_000);
    assert_eq!(config.authn.verifier_for(crate::ProxyKind::Dataplane), VerifierKind::None);
    assert!(!config.tls.enable_tls);
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_hds_env_vars();
    with_vars(
        vec![
            ("HDS__HDS__INTERVAL_IN_MS", Some("2500")),
            ("HDS__SERVER__STREAM_BUFFER_SIZE", Some("64")),
        ],
        || {
            let config = HdsNodeConfig::new().unwrap();

            assert_eq!(config.hds.interval_in_ms, 2500);
            assert_eq!(config.server.stream_buffer_size, 64);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_hds_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    std::fs::write(
        &config_path,
        r#"
        log_dir = "/tmp/hds/logs"

        [hds.check]
        healthy_threshold = 4
        unhealthy_threshold = 5

        [authn.verifiers]
        dataplane = "static_token"

        [[authn.tokens]]
        token = "secret"
        mesh = "default"
        name = "*"
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = HdsNodeConfig::new().expect("success");
        let config = base_config
            .with_override_config(config_path.to_str().unwrap())
            .unwrap()
            .validate()
            .unwrap();

        assert_eq!(config.log_dir.as_os_str().to_str(), Some("/tmp/hds/logs"));
        assert_eq!(config.hds.check.healthy_threshold, 4);
        assert_eq!(config.hds.check.unhealthy_threshold, 5);
        // untouched fields keep their defaults
        assert_eq!(config.hds.check.interval_in_ms, 1_000);
        assert_eq!(
            config.authn.verifier_for(crate::ProxyKind::Dataplane),
            VerifierKind::StaticToken
        );
        assert_eq!(
            config.authn.verifier_for(crate::ProxyKind::ZoneIngress),
            VerifierKind::None
        );
        assert_eq!(config.authn.tokens.len(), 1);
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_hds_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [hds]
        report_interval_in_ms = 7000
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("HDS__HDS__REPORT_INTERVAL_IN_MS", Some("3000")),
        ],
        || {
            let config = HdsNodeConfig::new().unwrap();

            assert_eq!(config.hds.report_interval_in_ms, 3000);
        },
    );
}

#[test]
#[serial]
fn missing_config_file_should_fail() {
    cleanup_all_hds_env_vars();
    with_vars(vec![("CONFIG_PATH", Some("/definitely/not/here.toml"))], || {
        assert!(HdsNodeConfig::new().is_err());
    });
}

#[test]
fn validation_should_reject_static_token_without_tokens() {
    let mut config = HdsNodeConfig::default();
    config.authn.verifiers.zone_egress = VerifierKind::StaticToken;

    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn validation_should_reject_token_entry_with_empty_field() {
    let mut config = HdsNodeConfig::default();
    config.authn.tokens.push(StaticTokenEntry {
        token: String::new(),
        mesh: "default".into(),
        name: "*".into(),
    });

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_zero_buffer_size() {
    let mut config = HdsNodeConfig::default();
    config.server.stream_buffer_size = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_detect_missing_tls_material() {
    let mut config = HdsNodeConfig::default();
    config.tls.enable_tls = true;
    config.tls.server_certificate_path = "/definitely/not/here.pem".into();

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_accept_existing_tls_material() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cert = temp_dir.path().join("server.pem");
    let key = temp_dir.path().join("server.key");
    std::fs::write(&cert, "cert").unwrap();
    std::fs::write(&key, "key").unwrap();

    let mut config = HdsNodeConfig::default();
    config.tls.enable_tls = true;
    config.tls.server_certificate_path = cert.to_string_lossy().into_owned();
    config.tls.server_private_key_path = key.to_string_lossy().into_owned();

    assert!(config.validate().is_ok());
}

#[test]
fn validation_should_reject_privileged_prometheus_port() {
    let mut config = HdsNodeConfig::default();
    config.monitoring.prometheus_enabled = true;
    config.monitoring.prometheus_port = 80;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_inverted_backoff() {
    let mut config = HdsNodeConfig::default();
    config.retry.authentication.base_delay_ms = 5_000;
    config.retry.authentication.max_delay_ms = 100;

    assert!(config.validate().is_err());
}
