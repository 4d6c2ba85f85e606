//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`CollectorConfig`]를 기반으로
//! 문자열 설정을 파이프라인이 바로 쓸 수 있는 타입(경로, 네트워크, 기간)으로 변환합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logalyzer_core::config::LogalyzerConfig;
//! use logalyzer_log_pipeline::config::PipelineConfig;
//!
//! let core_config = LogalyzerConfig::default();
//! let config = PipelineConfig::from_core(&core_config.collector)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;
use logalyzer_core::config::{
    CollectorConfig, DEFAULT_DATETIME_FORMAT, DEFAULT_LINE_FORMAT, IpFilter, parse_ip_filters,
    parse_networks,
};

use crate::error::LogPipelineError;

/// 로그 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 수집 대상 파일 또는 디렉토리
    pub log_path: PathBuf,
    /// 디렉토리 모드에서 파일명 부분 문자열 필터
    pub log_filter: Option<String>,
    /// 라인 템플릿
    pub line_format: String,
    /// datetime 필드의 strftime 형식
    pub datetime_format: String,
    /// 수집 주기
    pub poll_interval: Duration,
    /// 지리 조회에서 제외할 로컬 네트워크
    pub local_networks: Vec<IpNet>,
    /// 수집에서 제외할 원격 주소 또는 네트워크
    pub exclude_remote_ips: Vec<IpFilter>,
    /// URL에 포함되면 제외할 부분 문자열
    pub exclude_requests: Vec<String>,
    /// MaxMind City DB 경로
    pub geoip_city_db: Option<PathBuf>,
    /// MaxMind ASN DB 경로
    pub geoip_asn_db: Option<PathBuf>,
    /// 스냅샷 락 대기 한도
    pub snapshot_lock_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/var/log/nginx/access.log"),
            log_filter: None,
            line_format: DEFAULT_LINE_FORMAT.to_owned(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_owned(),
            poll_interval: Duration::from_secs(60),
            local_networks: Vec::new(),
            exclude_remote_ips: Vec::new(),
            exclude_requests: vec!["/metrics".to_owned()],
            geoip_city_db: None,
            geoip_asn_db: None,
            snapshot_lock_timeout: Duration::from_secs(60),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

impl PipelineConfig {
    /// core의 `CollectorConfig`에서 파이프라인 설정을 생성합니다.
    ///
    /// 빈 문자열 필드(필터, DB 경로)는 `None`으로 취급합니다.
    pub fn from_core(core: &CollectorConfig) -> Result<Self, LogPipelineError> {
        let local_networks =
            parse_networks(&core.local_networks).map_err(|reason| LogPipelineError::Config {
                field: "local_networks".to_owned(),
                reason,
            })?;
        let exclude_remote_ips = parse_ip_filters(&core.exclude_remote_ips).map_err(|reason| {
            LogPipelineError::Config {
                field: "exclude_remote_ips".to_owned(),
                reason,
            }
        })?;

        let config = Self {
            log_path: PathBuf::from(&core.log_path),
            log_filter: non_empty(&core.log_filter),
            line_format: core.line_format.clone(),
            datetime_format: core.datetime_format.clone(),
            poll_interval: Duration::from_secs(core.poll_interval_secs),
            local_networks,
            exclude_remote_ips,
            exclude_requests: core.exclude_requests.clone(),
            geoip_city_db: non_empty(&core.geoip_city_db).map(PathBuf::from),
            geoip_asn_db: non_empty(&core.geoip_asn_db).map(PathBuf::from),
            snapshot_lock_timeout: Duration::from_secs(core.snapshot_lock_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.log_path.as_os_str().is_empty() {
            return Err(LogPipelineError::Config {
                field: "log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(LogPipelineError::Config {
                field: "poll_interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.snapshot_lock_timeout.is_zero() {
            return Err(LogPipelineError::Config {
                field: "snapshot_lock_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.datetime_format.is_empty() {
            return Err(LogPipelineError::Config {
                field: "datetime_format".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.exclude_requests.iter().any(String::is_empty) {
            return Err(LogPipelineError::Config {
                field: "exclude_requests".to_owned(),
                reason: "empty pattern would exclude every request".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 파일명 필터를 설정합니다.
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = Some(filter.into());
        self
    }

    /// 라인 템플릿을 설정합니다.
    pub fn line_format(mut self, format: impl Into<String>) -> Self {
        self.config.line_format = format.into();
        self
    }

    /// datetime 형식을 설정합니다.
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.config.datetime_format = format.into();
        self
    }

    /// 수집 주기를 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// 로컬 네트워크를 설정합니다.
    pub fn local_networks(mut self, networks: Vec<IpNet>) -> Self {
        self.config.local_networks = networks;
        self
    }

    /// 제외 주소 목록을 설정합니다.
    pub fn exclude_remote_ips(mut self, filters: Vec<IpFilter>) -> Self {
        self.config.exclude_remote_ips = filters;
        self
    }

    /// 제외 URL 패턴을 설정합니다.
    pub fn exclude_requests(mut self, patterns: Vec<String>) -> Self {
        self.config.exclude_requests = patterns;
        self
    }

    /// 스냅샷 락 대기 한도를 설정합니다.
    pub fn snapshot_lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.snapshot_lock_timeout = timeout;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
