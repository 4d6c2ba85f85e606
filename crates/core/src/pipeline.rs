//! 보강 리졸버 trait -- 지리 정보와 User-Agent 해석의 확장 포인트
//!
//! 기본 보강 단계는 이 trait들을 통해서만 외부 데이터에 접근합니다.
//! 실제 구현(MaxMind, woothee)은 `logalyzer-log-pipeline`에 있으며,
//! 테스트에서는 가짜 구현을 주입합니다.

use std::net::IpAddr;

use crate::error::ResolveError;

/// 지리 정보 조회 결과
///
/// 리졸버가 모르는 항목은 `None`으로 두고, 기본 보강 단계가
/// `"unknown"` / `0.0`으로 채웁니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// 도시명
    pub city: Option<String>,
    /// 국가명
    pub country: Option<String>,
    /// 위도
    pub lat: Option<f64>,
    /// 경도
    pub long: Option<f64>,
    /// 자율 시스템 조직명
    pub asn: Option<String>,
}

/// IP 주소의 지리 정보를 조회하는 trait
pub trait GeoResolver: Send {
    /// 리졸버 이름 (로그용)
    fn name(&self) -> &str;

    /// 주소를 조회합니다.
    ///
    /// 데이터가 없으면 `Ok(None)`을 반환합니다.
    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoInfo>, ResolveError>;
}

/// User-Agent 해석 결과
#[derive(Debug, Clone, PartialEq)]
pub struct UaInfo {
    /// 브라우저 이름
    pub browser: String,
    /// 운영체제
    pub os: String,
    /// 기기 분류
    pub device: String,
}

impl Default for UaInfo {
    fn default() -> Self {
        Self {
            browser: UA_OTHER.to_owned(),
            os: UA_OTHER.to_owned(),
            device: UA_OTHER.to_owned(),
        }
    }
}

/// 인식하지 못한 User-Agent 항목의 값
pub const UA_OTHER: &str = "Other";

/// User-Agent 문자열을 해석하는 trait
///
/// 실패하지 않습니다. 인식하지 못한 항목은 [`UA_OTHER`]가 됩니다.
pub trait UaResolver: Send {
    /// User-Agent를 해석합니다.
    fn parse(&self, user_agent: &str) -> UaInfo;
}
