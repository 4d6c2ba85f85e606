//! 파이프라인 -- 라인 하나를 파싱, 제외 판정, 보강하여 데이터셋에 추가합니다.
//!
//! # 처리 순서
//! ```text
//! line -> AccessLogParser -> 제외 판정 -> RecordBuilder (geo/UA) -> EnricherRegistry -> Dataset
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use logalyzer_core::config::IpFilter;
use logalyzer_core::metrics as m;
use logalyzer_core::pipeline::{GeoResolver, UaResolver};
use logalyzer_core::plugin::EnricherRegistry;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::enrich::{GeoLookup, MaxMindResolver, RecordBuilder, WootheeResolver};
use crate::error::LogPipelineError;
use crate::parser::{AccessLogParser, ParsedLine};

/// 라인 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 데이터셋에 추가됨
    Appended,
    /// 파싱 실패로 버려짐
    ParseError,
    /// 제외 규칙에 걸림
    Excluded,
    /// 데이터셋 스키마 불일치로 거부됨
    Rejected,
}

/// 라인 처리 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use logalyzer_log_pipeline::{Dataset, LogPipelineBuilder};
///
/// let dataset = Arc::new(Dataset::default());
/// let mut pipeline = LogPipelineBuilder::new()
///     .config(config)
///     .dataset(Arc::clone(&dataset))
///     .build()?;
///
/// pipeline.process_line(line);
/// ```
pub struct LogPipeline {
    parser: AccessLogParser,
    builder: RecordBuilder,
    registry: EnricherRegistry,
    exclude_requests: Vec<String>,
    exclude_remote_ips: Vec<IpFilter>,
    dataset: Arc<Dataset>,
}

impl LogPipeline {
    /// 라인 하나를 처리합니다.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let parsed = match self.parser.parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, line, "discarding unparsable log line");
                metrics::counter!(m::LOG_PIPELINE_PARSE_ERRORS_TOTAL).increment(1);
                return LineOutcome::ParseError;
            }
        };

        if self.is_excluded(&parsed) {
            debug!(url = %parsed.http_url, remote_ip = %parsed.remote_ip, "log line excluded");
            metrics::counter!(m::LOG_PIPELINE_RECORDS_EXCLUDED_TOTAL).increment(1);
            return LineOutcome::Excluded;
        }

        let mut record = self.builder.build(parsed);
        self.registry.enrich(&mut record);

        if self.dataset.append_or_warn(record) {
            LineOutcome::Appended
        } else {
            LineOutcome::Rejected
        }
    }

    /// URL 부분 문자열 또는 원격 주소로 제외 여부를 판정합니다.
    pub fn is_excluded(&self, parsed: &ParsedLine) -> bool {
        if self
            .exclude_requests
            .iter()
            .any(|pattern| parsed.http_url.contains(pattern.as_str()))
        {
            return true;
        }
        if self.exclude_remote_ips.is_empty() {
            return false;
        }
        parsed
            .remote_ip
            .trim()
            .parse::<IpAddr>()
            .is_ok_and(|ip| self.exclude_remote_ips.iter().any(|f| f.matches(&ip)))
    }

    /// 대상 데이터셋
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// 활성 보강 플러그인 레지스트리
    pub fn registry(&self) -> &EnricherRegistry {
        &self.registry
    }
}

/// 로그 파이프라인 빌더
///
/// 리졸버를 지정하지 않으면 설정의 GeoIP DB로 [`MaxMindResolver`]를,
/// User-Agent에는 [`WootheeResolver`]를 사용합니다.
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    dataset: Option<Arc<Dataset>>,
    geo_resolver: Option<Box<dyn GeoResolver>>,
    ua_resolver: Option<Box<dyn UaResolver>>,
    registry: Option<EnricherRegistry>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            dataset: None,
            geo_resolver: None,
            ua_resolver: None,
            registry: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 레코드를 추가할 데이터셋을 지정합니다.
    pub fn dataset(mut self, dataset: Arc<Dataset>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// 지리 정보 리졸버를 지정합니다.
    pub fn geo_resolver(mut self, resolver: Box<dyn GeoResolver>) -> Self {
        self.geo_resolver = Some(resolver);
        self
    }

    /// User-Agent 리졸버를 지정합니다.
    pub fn ua_resolver(mut self, resolver: Box<dyn UaResolver>) -> Self {
        self.ua_resolver = Some(resolver);
        self
    }

    /// 로드가 끝난 보강 플러그인 레지스트리를 지정합니다.
    pub fn registry(mut self, registry: EnricherRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// 라인 템플릿 컴파일 실패는 설정 에러입니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        self.config.validate()?;

        let parser = AccessLogParser::new(&self.config.line_format, &self.config.datetime_format)?;

        let geo_resolver = self.geo_resolver.unwrap_or_else(|| {
            Box::new(MaxMindResolver::open(
                self.config.geoip_city_db.as_deref(),
                self.config.geoip_asn_db.as_deref(),
            ))
        });
        let ua_resolver = self
            .ua_resolver
            .unwrap_or_else(|| Box::new(WootheeResolver::new()));
        let geo = GeoLookup::new(geo_resolver, self.config.local_networks.clone());

        let dataset = self
            .dataset
            .unwrap_or_else(|| Arc::new(Dataset::new(self.config.snapshot_lock_timeout)));

        Ok(LogPipeline {
            parser,
            builder: RecordBuilder::new(geo, ua_resolver),
            registry: self.registry.unwrap_or_default(),
            exclude_requests: self.config.exclude_requests,
            exclude_remote_ips: self.config.exclude_remote_ips,
            dataset,
        })
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
