//! logalyzer.toml 통합 설정 테스트
//!
//! - logalyzer.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logalyzer_core::config::LogalyzerConfig;
use logalyzer_core::error::{ConfigError, LogalyzerError};
use serial_test::serial;

const EXAMPLE: &str = include_str!("../../../logalyzer.toml.example");

// =============================================================================
// logalyzer.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.collector.poll_interval_secs, 60);
    assert_eq!(config.collector.log_filter, "access");
}

#[test]
fn example_config_passes_validation() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_uses_default_line_format() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("should parse");
    assert_eq!(
        config.collector.line_format,
        logalyzer_core::config::DEFAULT_LINE_FORMAT
    );
    assert_eq!(config.collector.local_networks.len(), 2);
}

#[test]
fn example_config_lists_enrichers_in_order() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("should parse");
    let classes: Vec<&str> = config
        .enrichers
        .plugins
        .iter()
        .map(|p| p.class.as_str())
        .collect();
    assert_eq!(classes, vec!["url_query", "url_prefix"]);

    let rules = config.enrichers.plugins[1].config["rules"]
        .as_array()
        .expect("rules array");
    assert_eq!(rules.len(), 2);
}

#[test]
fn example_config_dashboards_keep_file_order() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("should parse");
    let ids: Vec<&str> = config.dashboards.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids[0], "requests");
    assert_eq!(ids[1], "codes");
    assert!(ids.contains(&"ctxt_logs"));

    let requests = config.dashboard("requests").expect("requests dashboard");
    assert_eq!(requests.time_group.as_deref(), Some("1h"));
    let graph = requests.graph_config.as_ref().expect("graph config");
    assert_eq!(graph["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(graph["data"][1]["yaxis"], "y2");
}

#[test]
fn example_config_contextual_dashboards_have_filters() {
    let config = LogalyzerConfig::parse(EXAMPLE).expect("should parse");
    for db in config.dashboards.iter().filter(|d| d.contextual) {
        assert!(db.filter.is_some(), "{} has no filter", db.id);
    }
}

// =============================================================================
// 부분 설정 / 에러 테스트
// =============================================================================

#[test]
fn partial_config_only_server_section() {
    let config = LogalyzerConfig::parse("[server]\nport = 8080\n").expect("should parse");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.collector.poll_interval_secs, 60);
}

#[test]
fn empty_file_uses_defaults() {
    let config = LogalyzerConfig::parse("").expect("empty should parse");
    config.validate().expect("defaults should validate");
}

#[test]
fn wrong_type_is_parse_error() {
    let err = LogalyzerConfig::parse("[server]\nport = \"high\"\n").unwrap_err();
    assert!(matches!(
        err,
        LogalyzerError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
#[serial]
async fn load_applies_env_over_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logalyzer.toml");
    std::fs::write(&path, "[collector]\nlog_path = \"/from/file\"\n").expect("write");

    // SAFETY: #[serial]로 환경변수를 건드리는 테스트끼리 직렬 실행됩니다.
    unsafe { std::env::set_var("LOGALYZER_COLLECTOR_LOG_PATH", "/from/env") };
    let result = LogalyzerConfig::load(&path).await;
    unsafe { std::env::remove_var("LOGALYZER_COLLECTOR_LOG_PATH") };

    let config = result.expect("should load");
    assert_eq!(config.collector.log_path, "/from/env");
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_env_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logalyzer.toml");
    std::fs::write(&path, "").expect("write");

    // SAFETY: #[serial]로 환경변수를 건드리는 테스트끼리 직렬 실행됩니다.
    unsafe { std::env::set_var("LOGALYZER_GENERAL_LOG_LEVEL", "loud") };
    let result = LogalyzerConfig::load(&path).await;
    unsafe { std::env::remove_var("LOGALYZER_GENERAL_LOG_LEVEL") };

    let err = result.unwrap_err();
    assert!(err.to_string().contains("log_level"));
}
