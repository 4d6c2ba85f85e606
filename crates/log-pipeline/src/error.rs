//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 수집 파이프라인 내부에서 발생하는 에러를 표현합니다.
//! `From<LogPipelineError> for LogalyzerError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logalyzer_core::error::{ConfigError, LogalyzerError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 라인 템플릿 컴파일 실패
    #[error("invalid line template: {reason}")]
    Template {
        /// 실패 사유
        reason: String,
    },

    /// 로그 파일 접근 실패 (열기, 읽기, 압축 해제)
    #[error("file access error: {path}: {reason}")]
    FileAccess {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 수집 대상 경로가 파일도 디렉토리도 아님
    #[error("log path not found: {0}")]
    LogPathNotFound(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 수집 스레드 에러
    #[error("collector thread error: {0}")]
    Thread(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogPipelineError> for LogalyzerError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Template { reason } => ConfigError::InvalidValue {
                field: "collector.line_format".to_owned(),
                reason,
            }
            .into(),
            LogPipelineError::LogPathNotFound(path) => ConfigError::InvalidValue {
                field: "collector.log_path".to_owned(),
                reason: format!("'{path}' is neither a file nor a directory"),
            }
            .into(),
            LogPipelineError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            LogPipelineError::Io(e) => LogalyzerError::Io(e),
            other => LogalyzerError::Pipeline(other.to_string()),
        }
    }
}
