//! 대시보드 에러 타입

use logalyzer_core::error::{ConfigError, LogalyzerError};

/// 쿼리 실행 에러
///
/// HTTP 레이어는 이 에러를 빈 테이블과 경고 로그로 바꿉니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// 테이블에 없는 컬럼
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// 시간 버킷 수가 한도를 넘음
    #[error("time grouping would produce {count} buckets (max {max})")]
    TooManyBuckets { count: u64, max: u64 },
}

/// 시간 폭 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time width '{input}': {reason}")]
pub struct WidthError {
    pub input: String,
    pub reason: String,
}

/// 대시보드 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// 대시보드 설정 에러
    #[error("dashboard '{id}': {reason}")]
    Config { id: String, reason: String },

    /// 쿼리 에러
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// 그래프 텍스트 템플릿 정규식 에러
    #[error("template error: {0}")]
    Template(#[from] regex::Error),

    /// HTTP 서버 에러
    #[error("server error: {0}")]
    Server(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DashboardError> for LogalyzerError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Config { id, reason } => ConfigError::InvalidValue {
                field: format!("dashboards.{id}"),
                reason,
            }
            .into(),
            DashboardError::Io(e) => LogalyzerError::Io(e),
            other => LogalyzerError::Pipeline(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_invalid_value() {
        let err = DashboardError::Config {
            id: "requests".to_owned(),
            reason: "bad time_group".to_owned(),
        };
        let top: LogalyzerError = err.into();
        let msg = top.to_string();
        assert!(msg.contains("dashboards.requests"));
        assert!(msg.contains("bad time_group"));
    }

    #[test]
    fn query_error_display() {
        let err = QueryError::UnknownColumn("aux_missing".to_owned());
        assert_eq!(err.to_string(), "unknown column: aux_missing");
    }

    #[test]
    fn width_error_display() {
        let err = WidthError {
            input: "3x".to_owned(),
            reason: "unknown unit 'x'".to_owned(),
        };
        assert!(err.to_string().contains("3x"));
    }
}
