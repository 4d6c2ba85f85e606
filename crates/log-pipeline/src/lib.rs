#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: `{name}` 자리표시자 템플릿 기반 액세스 로그 파서
//! - [`enrich`]: 지리 정보/User-Agent 기본 보강과 내장 보강 플러그인
//! - [`pipeline`]: 라인 단위 처리 (파싱 → 제외 → 보강 → 데이터셋)
//! - [`collector`]: 파일 오프셋 추적, gzip 지원, 전용 스레드 수집 루프
//! - [`dataset`]: 추가 전용 레코드 저장소와 시간순 스냅샷
//! - [`config`]: 파이프라인 설정 (core 설정에서 변환)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! collector thread:  files -> AccessLogParser -> RecordBuilder -> EnricherRegistry -> Dataset
//!                                                  |                                   |
//!                                           MaxMind / woothee               snapshot() <- HTTP readers
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;

pub mod collector;
pub mod enrich;
pub mod parser;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LineOutcome, LogPipeline, LogPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{AccessLogParser, LineTemplate, ParsedLine};

// 보강
pub use enrich::{GeoLookup, MaxMindResolver, RecordBuilder, WootheeResolver, builtin_registry};

// 수집기
pub use collector::{Collector, CollectorHandle, FileCursor, TickReport, spawn_collector};

// 데이터셋
pub use dataset::{Dataset, Snapshot};
