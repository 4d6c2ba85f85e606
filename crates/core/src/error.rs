//! 에러 타입 -- 도메인별 에러 정의

use std::time::Duration;

/// Logalyzer 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogalyzerError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 라인 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 보강(enrichment) 플러그인 에러
    #[error("enrich error: {0}")]
    Enrich(#[from] EnrichError),

    /// 데이터셋 에러
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// 수집 파이프라인 에러
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 라인 파싱 에러
///
/// 컬렉터는 이 에러를 받으면 해당 라인만 버리고 계속 진행합니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 라인이 템플릿과 일치하지 않음
    #[error("line does not match the configured template")]
    NoMatch,

    /// 필수 필드 누락
    #[error("missing field: {0}")]
    MissingField(String),

    /// 요청 필드가 `method url protocol` 3요소가 아님
    #[error("invalid request '{request}': expected 3 parts, got {parts}")]
    InvalidRequest { request: String, parts: usize },

    /// 시각 파싱 실패
    #[error("invalid datetime '{value}': {reason}")]
    InvalidDatetime { value: String, reason: String },

    /// 숫자 필드 파싱 실패
    #[error("invalid number for '{field}': {value}")]
    InvalidNumber { field: String, value: String },
}

/// 보강 플러그인 에러
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// 등록되지 않은 플러그인 클래스
    #[error("unknown enricher class: {0}")]
    UnknownClass(String),

    /// 플러그인 생성 실패
    #[error("failed to construct enricher '{class}': {reason}")]
    Construction { class: String, reason: String },

    /// 선언된 보조 필드가 유효하지 않음 (코어 필드와 충돌, 중복 등)
    #[error("enricher '{plugin}' declares invalid fields: {reason}")]
    InvalidFields { plugin: String, reason: String },

    /// 레코드 처리 중 실패
    #[error("enricher '{plugin}' failed: {reason}")]
    Runtime { plugin: String, reason: String },
}

/// 데이터셋 에러
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// 첫 레코드로 고정된 스키마와 필드 구성이 다름
    #[error("schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// 지리 정보 조회 에러
///
/// 이 에러는 보강 단계 밖으로 전파되지 않습니다.
/// 모든 경우 `"unknown"` 값으로 대체됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// 요청 제한 -- `retry_after` 후 한 번 재시도
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// 리졸버 사용 불가 (DB 미로드 등)
    #[error("resolver unavailable: {0}")]
    Unavailable(String),

    /// 조회 실패
    #[error("lookup failed: {0}")]
    Lookup(String),
}
