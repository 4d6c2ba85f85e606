//! 기본 보강 -- 파싱 결과에 지리 정보와 User-Agent 정보를 붙여 레코드를 만듭니다.

use logalyzer_core::pipeline::UaResolver;
use logalyzer_core::types::{CoreFields, LogRecord, UNKNOWN};

use super::geo::GeoLookup;
use crate::parser::ParsedLine;

/// 파싱된 라인을 코어 필드가 모두 채워진 [`LogRecord`]로 변환합니다.
pub struct RecordBuilder {
    geo: GeoLookup,
    ua: Box<dyn UaResolver>,
}

impl RecordBuilder {
    pub fn new(geo: GeoLookup, ua: Box<dyn UaResolver>) -> Self {
        Self { geo, ua }
    }

    /// 레코드를 생성합니다. 지리 정보가 없으면 `"unknown"` / `0.0`을 씁니다.
    pub fn build(&mut self, parsed: ParsedLine) -> LogRecord {
        let geo = self.geo.resolve(&parsed.remote_ip).unwrap_or_default();
        let ua = self.ua.parse(&parsed.user_agent);
        let unknown = || UNKNOWN.to_owned();

        LogRecord::new(CoreFields {
            remote_ip: parsed.remote_ip,
            http_referer: parsed.referer,
            hostname: parsed.hostname,
            timestamp: parsed.timestamp,
            bytes_sent: parsed.bytes_sent,
            request_time: parsed.request_time,
            request_status: parsed.status,
            city: geo.city.unwrap_or_else(unknown),
            country: geo.country.unwrap_or_else(unknown),
            lat: geo.lat.unwrap_or(0.0),
            long: geo.long.unwrap_or(0.0),
            asn: geo.asn.unwrap_or_else(unknown),
            http_operation: parsed.http_operation,
            http_url: parsed.http_url,
            protocol: parsed.protocol,
            browser: ua.browser,
            os: ua.os,
            device: ua.device,
        })
    }

    /// 지리 정보 조회기
    pub fn geo(&self) -> &GeoLookup {
        &self.geo
    }
}
