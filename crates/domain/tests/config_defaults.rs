use ssv_domain::config::{Config, ConfigSeverity};

#[test]
fn defaults_are_dev_friendly() {
    let config = Config::default();
    assert_eq!(config.database.host, "127.0.0.1");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.api.port, 8443);
    assert_eq!(config.auth.token_expiry_minutes, 60);
    assert_eq!(config.session.idle_timeout_minutes, 30);
    assert_eq!(config.kubernetes.namespace, "ssvirt-system");
    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.format, "text");
}

#[test]
fn partial_file_parses_over_defaults() {
    let toml_str = r#"
[database]
host = "db.internal"
max_connections = 32

[auth]
jwt_secret = "s3cret"

[log]
format = "json"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.max_connections, 32);
    assert_eq!(config.database.database, "ssvirt");
    assert_eq!(config.auth.jwt_secret, "s3cret");
    assert_eq!(config.log.format, "json");
}

#[test]
fn unknown_keys_are_rejected() {
    let toml_str = r#"
[database]
hostt = "typo"
"#;
    assert!(toml::from_str::<Config>(toml_str).is_err());
}

#[test]
fn missing_jwt_secret_is_fatal_in_production() {
    let config = Config::default();
    let issues = config.validate(true);
    assert!(issues
        .iter()
        .any(|i| i.field == "auth.jwt_secret" && i.severity == ConfigSeverity::Error));

    let issues = config.validate(false);
    assert!(issues
        .iter()
        .any(|i| i.field == "auth.jwt_secret" && i.severity == ConfigSeverity::Warning));
}

#[test]
fn half_configured_tls_is_an_error() {
    let toml_str = r#"
[api]
tls_cert = "/etc/ssvirt/tls.crt"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate(false);
    assert!(issues
        .iter()
        .any(|i| i.field.starts_with("api.tls") && i.severity == ConfigSeverity::Error));
}

#[test]
fn bad_log_format_is_an_error() {
    let toml_str = r#"
[log]
format = "xml"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate(false);
    assert!(issues
        .iter()
        .any(|i| i.field == "log.format" && i.severity == ConfigSeverity::Error));
}
