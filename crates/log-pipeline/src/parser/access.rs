//! 액세스 로그 라인 파서
//!
//! [`LineTemplate`]로 추출한 원문 필드를 타입이 있는 [`ParsedLine`]으로 변환합니다.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use logalyzer_core::error::ParseError;

use super::template::{FieldMap, LineTemplate};
use crate::error::LogPipelineError;

/// 타입 변환까지 끝난 액세스 로그 한 줄
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub remote_ip: String,
    pub timestamp: DateTime<FixedOffset>,
    pub http_operation: String,
    pub http_url: String,
    pub protocol: String,
    pub status: i64,
    pub bytes_sent: i64,
    pub referer: String,
    pub hostname: String,
    pub user_agent: String,
    pub request_time: f64,
}

/// 템플릿 기반 액세스 로그 파서
#[derive(Debug, Clone)]
pub struct AccessLogParser {
    template: LineTemplate,
    datetime_format: String,
}

impl AccessLogParser {
    /// 라인 템플릿과 datetime 형식으로 파서를 생성합니다.
    pub fn new(line_format: &str, datetime_format: &str) -> Result<Self, LogPipelineError> {
        Ok(Self {
            template: LineTemplate::compile(line_format)?,
            datetime_format: datetime_format.to_owned(),
        })
    }

    /// 컴파일된 템플릿
    pub fn template(&self) -> &LineTemplate {
        &self.template
    }

    /// 라인 하나를 파싱합니다.
    pub fn parse(&self, line: &str) -> Result<ParsedLine, ParseError> {
        let fields = self.template.captures(line).ok_or(ParseError::NoMatch)?;

        let request = field(&fields, "request")?;
        let parts: Vec<&str> = request.split_whitespace().collect();
        let [method, url, protocol] = parts.as_slice() else {
            return Err(ParseError::InvalidRequest {
                request: request.to_owned(),
                parts: parts.len(),
            });
        };

        Ok(ParsedLine {
            remote_ip: field(&fields, "remote_ip")?.to_owned(),
            timestamp: parse_datetime(field(&fields, "datetime")?, &self.datetime_format)?,
            http_operation: (*method).to_owned(),
            http_url: (*url).to_owned(),
            protocol: (*protocol).to_owned(),
            status: parse_int(&fields, "status")?,
            bytes_sent: parse_bytes_sent(&fields)?,
            referer: field(&fields, "referer")?.to_owned(),
            hostname: field(&fields, "hostname")?.to_owned(),
            user_agent: field(&fields, "user_agent")?.to_owned(),
            request_time: parse_float(&fields, "request_time")?,
        })
    }
}

fn field<'a>(fields: &'a FieldMap, name: &str) -> Result<&'a str, ParseError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ParseError::MissingField(name.to_owned()))
}

fn parse_int(fields: &FieldMap, name: &str) -> Result<i64, ParseError> {
    let raw = field(fields, name)?;
    raw.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field: name.to_owned(),
        value: raw.to_owned(),
    })
}

// Apache `%b`는 0바이트를 "-"로 기록
fn parse_bytes_sent(fields: &FieldMap) -> Result<i64, ParseError> {
    if field(fields, "bytes_sent")? == "-" {
        return Ok(0);
    }
    parse_int(fields, "bytes_sent")
}

fn parse_float(fields: &FieldMap, name: &str) -> Result<f64, ParseError> {
    let raw = field(fields, name)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field: name.to_owned(),
            value: raw.to_owned(),
        })
}

/// datetime 필드를 파싱합니다. 형식에 오프셋이 없으면 UTC로 해석합니다.
pub fn parse_datetime(value: &str, format: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    match DateTime::parse_from_str(value, format) {
        Ok(dt) => Ok(dt),
        Err(with_offset) => NaiveDateTime::parse_from_str(value, format)
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| ParseError::InvalidDatetime {
                value: value.to_owned(),
                reason: with_offset.to_string(),
            }),
    }
}
