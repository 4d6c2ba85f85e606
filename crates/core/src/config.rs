//! 설정 관리 -- logalyzer.toml 파싱 및 런타임 설정
//!
//! [`LogalyzerConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGALYZER_COLLECTOR_LOG_PATH=/var/log/nginx` 형식)
//! 3. 설정 파일 (`logalyzer.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logalyzer_core::error::LogalyzerError> {
//! use logalyzer_core::config::LogalyzerConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogalyzerConfig::load("logalyzer.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogalyzerConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogalyzerError};

/// 기본 액세스 로그 템플릿 (nginx `main` 형식 + host, request_time)
pub const DEFAULT_LINE_FORMAT: &str = concat!(
    "{remote_ip} - {} [{datetime}] \"{request}\" {status} {bytes_sent}",
    " \"{referer}\" {hostname} \"{user_agent}\" \"{request_time}\" \"{}\"",
);

/// 기본 요청 시각 형식
pub const DEFAULT_DATETIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Logalyzer 통합 설정
///
/// `logalyzer.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogalyzerConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 수집기 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 보강 플러그인 설정
    #[serde(default)]
    pub enrichers: EnrichersConfig,
    /// 대시보드 HTTP 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 대시보드 목록 (설정 순서 유지)
    #[serde(default)]
    pub dashboards: Vec<DashboardConfig>,
}

impl LogalyzerConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogalyzerError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogalyzerError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogalyzerError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogalyzerError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogalyzerError> {
        toml::from_str(toml_str).map_err(|e| {
            LogalyzerError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGALYZER_{SECTION}_{FIELD}`
    /// 예: `LOGALYZER_SERVER_PORT=8080`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGALYZER_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "LOGALYZER_GENERAL_LOG_FORMAT",
        );

        // Collector
        override_u64(
            &mut self.collector.poll_interval_secs,
            "LOGALYZER_COLLECTOR_POLL_INTERVAL_SECS",
        );
        override_string(&mut self.collector.log_path, "LOGALYZER_COLLECTOR_LOG_PATH");
        override_string(
            &mut self.collector.log_filter,
            "LOGALYZER_COLLECTOR_LOG_FILTER",
        );
        override_string(
            &mut self.collector.line_format,
            "LOGALYZER_COLLECTOR_LINE_FORMAT",
        );
        override_string(
            &mut self.collector.datetime_format,
            "LOGALYZER_COLLECTOR_DATETIME_FORMAT",
        );
        override_csv(
            &mut self.collector.local_networks,
            "LOGALYZER_COLLECTOR_LOCAL_NETWORKS",
        );
        override_csv(
            &mut self.collector.exclude_remote_ips,
            "LOGALYZER_COLLECTOR_EXCLUDE_REMOTE_IPS",
        );
        override_csv(
            &mut self.collector.exclude_requests,
            "LOGALYZER_COLLECTOR_EXCLUDE_REQUESTS",
        );
        override_string(
            &mut self.collector.geoip_city_db,
            "LOGALYZER_COLLECTOR_GEOIP_CITY_DB",
        );
        override_string(
            &mut self.collector.geoip_asn_db,
            "LOGALYZER_COLLECTOR_GEOIP_ASN_DB",
        );
        override_u64(
            &mut self.collector.snapshot_lock_timeout_secs,
            "LOGALYZER_COLLECTOR_SNAPSHOT_LOCK_TIMEOUT_SECS",
        );

        // Enrichers
        override_string(&mut self.enrichers.root, "LOGALYZER_ENRICHERS_ROOT");

        // Server
        override_string(&mut self.server.host, "LOGALYZER_SERVER_HOST");
        override_u16(&mut self.server.port, "LOGALYZER_SERVER_PORT");
        override_string(
            &mut self.server.range_time_format,
            "LOGALYZER_SERVER_RANGE_TIME_FORMAT",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGALYZER_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "LOGALYZER_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "LOGALYZER_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogalyzerError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.collector.poll_interval_secs == 0 {
            return Err(invalid(
                "collector.poll_interval_secs",
                "must be greater than 0",
            ));
        }

        if self.collector.log_path.is_empty() {
            return Err(invalid("collector.log_path", "must not be empty"));
        }

        if self.collector.line_format.is_empty() {
            return Err(invalid("collector.line_format", "must not be empty"));
        }

        if self.collector.snapshot_lock_timeout_secs == 0 {
            return Err(invalid(
                "collector.snapshot_lock_timeout_secs",
                "must be greater than 0",
            ));
        }

        parse_networks(&self.collector.local_networks)
            .map_err(|e| invalid("collector.local_networks", e))?;
        parse_ip_filters(&self.collector.exclude_remote_ips)
            .map_err(|e| invalid("collector.exclude_remote_ips", e))?;

        if self.server.port == 0 {
            return Err(invalid("server.port", "must be greater than 0"));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        for (idx, plugin) in self.enrichers.plugins.iter().enumerate() {
            if plugin.class.is_empty() {
                return Err(invalid(
                    &format!("enrichers.plugins[{idx}].class"),
                    "must not be empty",
                ));
            }
        }

        self.validate_dashboards()
    }

    fn validate_dashboards(&self) -> Result<(), LogalyzerError> {
        let mut ids = HashSet::new();
        for db in &self.dashboards {
            if db.id.is_empty() {
                return Err(invalid("dashboards.id", "must not be empty"));
            }
            if !ids.insert(db.id.as_str()) {
                return Err(invalid(
                    "dashboards.id",
                    format!("duplicate dashboard id '{}'", db.id),
                ));
            }
            if db.contextual && db.filter.as_deref().unwrap_or_default().is_empty() {
                return Err(invalid(
                    &format!("dashboards.{}.filter", db.id),
                    "contextual dashboards require a filter column",
                ));
            }
        }

        for db in &self.dashboards {
            let Some(target) = db.on_click.as_deref() else {
                continue;
            };
            match self.dashboard(target) {
                Some(t) if t.contextual => {}
                Some(_) => {
                    return Err(invalid(
                        &format!("dashboards.{}.on_click", db.id),
                        format!("'{target}' is not a contextual dashboard"),
                    ));
                }
                None => {
                    return Err(invalid(
                        &format!("dashboards.{}.on_click", db.id),
                        format!("unknown dashboard '{target}'"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// id로 대시보드 설정을 찾습니다.
    pub fn dashboard(&self, id: &str) -> Option<&DashboardConfig> {
        self.dashboards.iter().find(|db| db.id == id)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LogalyzerError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 로그 수집기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 수집 주기 (초)
    pub poll_interval_secs: u64,
    /// 액세스 로그 파일 또는 디렉토리 경로
    pub log_path: String,
    /// 디렉토리일 때 파일 이름에 포함되어야 하는 문자열 (빈 값이면 전체)
    pub log_filter: String,
    /// 라인 템플릿 (`{name}` 캡처, `{}` 무시)
    pub line_format: String,
    /// `datetime` 필드의 strftime 형식
    pub datetime_format: String,
    /// 지리 정보 조회에서 제외할 로컬 네트워크 (CIDR)
    pub local_networks: Vec<String>,
    /// 수집에서 제외할 클라이언트 IP 또는 네트워크
    pub exclude_remote_ips: Vec<String>,
    /// URL에 포함되면 수집에서 제외할 문자열
    pub exclude_requests: Vec<String>,
    /// MaxMind City DB 경로 (빈 값이면 비활성화)
    pub geoip_city_db: String,
    /// MaxMind ASN DB 경로 (빈 값이면 비활성화)
    pub geoip_asn_db: String,
    /// 스냅샷 잠금 대기 한도 (초)
    pub snapshot_lock_timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            log_path: "/var/log/nginx/access.log".to_owned(),
            log_filter: String::new(),
            line_format: DEFAULT_LINE_FORMAT.to_owned(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_owned(),
            local_networks: Vec::new(),
            exclude_remote_ips: Vec::new(),
            exclude_requests: vec!["/metrics".to_owned()],
            geoip_city_db: String::new(),
            geoip_asn_db: String::new(),
            snapshot_lock_timeout_secs: 60,
        }
    }
}

/// 보강 플러그인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichersConfig {
    /// 플러그인 리소스 루트 디렉토리
    pub root: String,
    /// 활성화할 플러그인 (실행 순서)
    pub plugins: Vec<EnricherEntry>,
}

impl Default for EnrichersConfig {
    fn default() -> Self {
        Self {
            root: ".".to_owned(),
            plugins: Vec::new(),
        }
    }
}

/// 플러그인 항목 하나
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherEntry {
    /// 플러그인 식별 경로 (루트 기준)
    #[serde(default)]
    pub path: String,
    /// 등록된 팩토리 클래스 식별자
    pub class: String,
    /// 플러그인별 설정
    #[serde(default)]
    pub config: toml::Table,
}

/// 대시보드 HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인드 주소
    pub host: String,
    /// 포트
    pub port: u16,
    /// 데이터 범위(start_date, end_date) 표시 형식
    pub range_time_format: String,
    /// 화면에서 선택 가능한 새로고침 주기 (초)
    pub refresh_times: Vec<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 9200,
            range_time_format: "%Y/%m/%d %H:%M:%S".to_owned(),
            refresh_times: vec![30, 60, 300, 600],
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스너 주소
    pub listen_addr: String,
    /// 리스너 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

/// 대시보드 하나의 설정
///
/// 컬럼 이름에는 코어 필드와 `aux_` 보조 필드를 모두 사용할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 고유 id
    pub id: String,
    /// 표 제목 (컨텍스트 대시보드는 `{}`가 클릭한 값으로 치환됨)
    #[serde(default)]
    pub table_title: String,
    /// 표시할 컬럼 (비어 있으면 전체)
    #[serde(default)]
    pub display_cols: Vec<String>,
    /// 그룹 기준 컬럼 (비어 있으면 그룹화 없음)
    #[serde(default)]
    pub group_by_cols: Vec<String>,
    /// 그룹별 건수 컬럼 이름
    #[serde(default = "default_count_title")]
    pub count_title: String,
    /// 시간 구간 폭 (`1h`, `30min` 등)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_group: Option<String>,
    /// 구간별 건수 컬럼 이름
    #[serde(default = "default_time_title")]
    pub time_title: String,
    /// 행 클릭 시에만 표시되는 컨텍스트 대시보드 여부
    #[serde(default)]
    pub contextual: bool,
    /// 컨텍스트 대시보드의 필터 컬럼
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// 행 클릭 시 열 컨텍스트 대시보드 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,
    /// 배지 제목 (있으면 행 수를 배지로 표시)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_title: Option<String>,
    /// 배지 색상 (black, gray, info, success, warning, failure)
    #[serde(default = "default_badge_type")]
    pub badge_type: String,
    /// 전체 폭 사용 여부
    #[serde(default)]
    pub large: bool,
    /// 표 정렬 (DataTables `order` 값 그대로 전달)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_order: Option<serde_json::Value>,
    /// 숨길 컬럼 인덱스
    #[serde(default)]
    pub table_hide: Vec<usize>,
    /// 그래프 설정 (plotly.js 형식, 컬럼 이름으로 축 지정)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_config: Option<serde_json::Value>,
}

fn default_count_title() -> String {
    "count".to_owned()
}

fn default_time_title() -> String {
    "tcount".to_owned()
}

fn default_badge_type() -> String {
    "gray".to_owned()
}

impl DashboardConfig {
    /// 기본값으로 채운 대시보드 설정을 만듭니다.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table_title: String::new(),
            display_cols: Vec::new(),
            group_by_cols: Vec::new(),
            count_title: default_count_title(),
            time_group: None,
            time_title: default_time_title(),
            contextual: false,
            filter: None,
            on_click: None,
            badge_title: None,
            badge_type: default_badge_type(),
            large: false,
            table_order: None,
            table_hide: Vec::new(),
            graph_config: None,
        }
    }
}

// --- 네트워크 목록 파싱 ---

/// CIDR 목록을 파싱합니다.
pub fn parse_networks(entries: &[String]) -> Result<Vec<IpNet>, String> {
    entries
        .iter()
        .map(|s| {
            s.parse::<IpNet>()
                .map_err(|e| format!("'{s}' is not a network: {e}"))
        })
        .collect()
}

/// IP 제외 목록 항목
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFilter {
    /// 단일 주소
    Addr(IpAddr),
    /// 네트워크
    Net(IpNet),
}

impl IpFilter {
    /// 주소가 이 항목에 해당하는지 확인합니다.
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            Self::Addr(addr) => addr == ip,
            Self::Net(net) => net.contains(ip),
        }
    }
}

/// 주소 또는 CIDR 목록을 파싱합니다.
pub fn parse_ip_filters(entries: &[String]) -> Result<Vec<IpFilter>, String> {
    entries
        .iter()
        .map(|s| {
            if let Ok(addr) = s.parse::<IpAddr>() {
                Ok(IpFilter::Addr(addr))
            } else {
                s.parse::<IpNet>()
                    .map(IpFilter::Net)
                    .map_err(|_| format!("'{s}' is neither an address nor a network"))
            }
        })
        .collect()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = LogalyzerConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.collector.poll_interval_secs, 60);
        assert_eq!(config.collector.datetime_format, "%d/%b/%Y:%H:%M:%S %z");
        assert_eq!(config.collector.exclude_requests, vec!["/metrics"]);
        assert_eq!(config.server.port, 9200);
        assert!(!config.metrics.enabled);
        assert!(config.dashboards.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        let config = LogalyzerConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = LogalyzerConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.collector.line_format, DEFAULT_LINE_FORMAT);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[collector]
log_path = "/srv/logs"
log_filter = "access"
"#;
        let config = LogalyzerConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.collector.log_path, "/srv/logs");
        assert_eq!(config.collector.log_filter, "access");
        assert_eq!(config.collector.poll_interval_secs, 60);
    }

    #[test]
    fn dashboards_keep_configured_order_and_defaults() {
        let toml = r#"
[[dashboards]]
id = "urls"
table_title = "Unique URLs"
display_cols = ["http_url"]
group_by_cols = ["http_url"]
count_title = "URLs count"
on_click = "ctxt_urls"
graph_config = { data = [{ type = "bar", x = "http_url", y = "URLs count" }], layout = {} }

[[dashboards]]
id = "ctxt_urls"
contextual = true
table_title = "Requests for {}"
filter = "http_url"
"#;
        let config = LogalyzerConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.dashboards[0].id, "urls");
        assert_eq!(config.dashboards[1].id, "ctxt_urls");
        assert_eq!(config.dashboards[1].count_title, "count");
        assert_eq!(config.dashboards[1].time_title, "tcount");
        assert_eq!(config.dashboards[0].badge_type, "gray");
        let graph = config.dashboards[0].graph_config.as_ref().unwrap();
        assert_eq!(graph["data"][0]["x"], "http_url");
    }

    #[test]
    fn enricher_entries_carry_free_form_config() {
        let toml = r#"
[enrichers]
root = "/etc/logalyzer/enrichers"

[[enrichers.plugins]]
path = "labels.toml"
class = "ip_label"
config = { field = "owner" }
"#;
        let config = LogalyzerConfig::parse(toml).unwrap();
        assert_eq!(config.enrichers.root, "/etc/logalyzer/enrichers");
        let plugin = &config.enrichers.plugins[0];
        assert_eq!(plugin.class, "ip_label");
        assert_eq!(plugin.config["field"].as_str(), Some("owner"));
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = LogalyzerConfig::parse("invalid = [[[toml");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            LogalyzerError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LogalyzerConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LogalyzerConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = LogalyzerConfig::default();
        config.collector.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn validate_rejects_bad_local_network() {
        let mut config = LogalyzerConfig::default();
        config.collector.local_networks = vec!["192.168.0.0/33".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("local_networks"));
    }

    #[test]
    fn validate_rejects_bad_exclude_ip() {
        let mut config = LogalyzerConfig::default();
        config.collector.exclude_remote_ips = vec!["not-an-ip".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exclude_remote_ips"));
    }

    #[test]
    fn validate_rejects_duplicate_dashboard_ids() {
        let mut config = LogalyzerConfig::default();
        config.dashboards = vec![DashboardConfig::new("a"), DashboardConfig::new("a")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_contextual_without_filter() {
        let mut config = LogalyzerConfig::default();
        let mut ctxt = DashboardConfig::new("ctxt");
        ctxt.contextual = true;
        config.dashboards = vec![ctxt];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filter"));
    }

    #[test]
    fn validate_rejects_on_click_to_unknown_or_plain_dashboard() {
        let mut config = LogalyzerConfig::default();
        let mut main = DashboardConfig::new("main");
        main.on_click = Some("missing".to_owned());
        config.dashboards = vec![main.clone()];
        assert!(config.validate().unwrap_err().to_string().contains("unknown"));

        main.on_click = Some("other".to_owned());
        config.dashboards = vec![main, DashboardConfig::new("other")];
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("not a contextual")
        );
    }

    #[test]
    fn ip_filters_accept_addresses_and_networks() {
        let filters =
            parse_ip_filters(&["10.0.0.1".to_owned(), "192.168.0.0/16".to_owned()]).unwrap();
        let inside: IpAddr = "192.168.4.2".parse().unwrap();
        let exact: IpAddr = "10.0.0.1".parse().unwrap();
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(filters.iter().any(|f| f.matches(&inside)));
        assert!(filters.iter().any(|f| f.matches(&exact)));
        assert!(!filters.iter().any(|f| f.matches(&other)));
    }

    #[test]
    #[serial]
    fn env_override_applies_to_sections() {
        // SAFETY: #[serial]로 환경변수를 건드리는 테스트끼리 직렬 실행됩니다.
        unsafe {
            std::env::set_var("LOGALYZER_SERVER_PORT", "8088");
            std::env::set_var("LOGALYZER_COLLECTOR_LOCAL_NETWORKS", "10.0.0.0/8, 192.168.0.0/16");
        }
        let mut config = LogalyzerConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOGALYZER_SERVER_PORT");
            std::env::remove_var("LOGALYZER_COLLECTOR_LOCAL_NETWORKS");
        }
        assert_eq!(config.server.port, 8088);
        assert_eq!(
            config.collector.local_networks,
            vec!["10.0.0.0/8", "192.168.0.0/16"]
        );
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        let mut val = 9200_u16;
        // SAFETY: #[serial]로 환경변수를 건드리는 테스트끼리 직렬 실행됩니다.
        unsafe { std::env::set_var("TEST_LOGALYZER_PORT_BAD", "not-a-port") };
        override_u16(&mut val, "TEST_LOGALYZER_PORT_BAD");
        unsafe { std::env::remove_var("TEST_LOGALYZER_PORT_BAD") };
        assert_eq!(val, 9200);
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: #[serial]로 환경변수를 건드리는 테스트끼리 직렬 실행됩니다.
        unsafe { std::env::set_var("TEST_LOGALYZER_CSV", "x, ,y") };
        override_csv(&mut val, "TEST_LOGALYZER_CSV");
        unsafe { std::env::remove_var("TEST_LOGALYZER_CSV") };
        assert_eq!(val, vec!["x", "y"]);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOGALYZER_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = LogalyzerConfig::default();
        let mut db = DashboardConfig::new("requests");
        db.time_group = Some("1h".to_owned());
        config.dashboards.push(db);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LogalyzerConfig::parse(&toml_str).unwrap();
        assert_eq!(config.collector.line_format, parsed.collector.line_format);
        assert_eq!(parsed.dashboards[0].time_group.as_deref(), Some("1h"));
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = LogalyzerConfig::from_file("/nonexistent/path/logalyzer.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            LogalyzerError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
