#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod plugin;
pub mod table;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, DatasetError, EnrichError, LogalyzerError, ParseError, ResolveError};

// 설정
pub use config::{DashboardConfig, LogalyzerConfig};

// 리졸버 trait
pub use pipeline::{GeoInfo, GeoResolver, UaInfo, UaResolver};

// 보강 플러그인
pub use plugin::{Enricher, EnricherContext, EnricherFactory, EnricherRegistry};

// 도메인 타입
pub use table::Table;
pub use types::{CoreFields, FieldValue, LogRecord};
