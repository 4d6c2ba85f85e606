//! 레코드 보강 모듈
//!
//! - [`RecordBuilder`]: 파싱 결과 + 지리 정보 + User-Agent → 코어 필드
//! - [`GeoLookup`]: 조회 대상 판별과 주소별 캐시
//! - [`MaxMindResolver`], [`WootheeResolver`]: 리졸버 trait의 기본 구현
//! - [`builtin`]: 컴파일 시점에 등록되는 보강 플러그인

pub mod base;
pub mod builtin;
pub mod geo;
pub mod maxmind;
pub mod ua;

pub use base::RecordBuilder;
pub use builtin::{builtin_registry, register_builtin};
pub use geo::GeoLookup;
pub use maxmind::MaxMindResolver;
pub use ua::WootheeResolver;
