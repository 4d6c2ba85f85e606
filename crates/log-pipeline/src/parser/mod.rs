//! 로그 파싱 모듈 -- 템플릿 기반 액세스 로그 파서
//!
//! # 구성
//! - [`LineTemplate`]: `{name}` / `{}` 자리표시자 템플릿을 정규식으로 컴파일
//! - [`AccessLogParser`]: 추출한 필드를 타입 있는 [`ParsedLine`]으로 변환
//!
//! # 사용 예시
//! ```ignore
//! use logalyzer_core::config::{DEFAULT_DATETIME_FORMAT, DEFAULT_LINE_FORMAT};
//! use logalyzer_log_pipeline::parser::AccessLogParser;
//!
//! let parser = AccessLogParser::new(DEFAULT_LINE_FORMAT, DEFAULT_DATETIME_FORMAT)?;
//! let parsed = parser.parse(line)?;
//! ```

pub mod access;
pub mod template;

pub use access::{AccessLogParser, ParsedLine, parse_datetime};
pub use template::{FieldMap, LineTemplate, REQUIRED_PLACEHOLDERS};
