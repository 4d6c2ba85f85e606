//! 도메인 타입 -- 레코드와 필드 값
//!
//! 액세스 로그 한 줄은 파싱과 보강을 거쳐 [`LogRecord`] 하나가 됩니다.
//! 레코드는 고정된 코어 필드([`CORE_FIELDS`])와, 보강 플러그인이 추가하는
//! `aux_` 접두어의 보조 필드로 구성됩니다.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 보조 필드 이름 접두어
pub const AUX_PREFIX: &str = "aux_";

/// 타임스탬프 내보내기 형식 (JSON 응답, 필터 비교에 사용)
pub const TIMESTAMP_EXPORT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// 지리 정보를 알 수 없을 때의 값
pub const UNKNOWN: &str = "unknown";

/// 코어 필드 이름 (레코드 컬럼 순서)
pub const CORE_FIELDS: [&str; 18] = [
    "remote_ip",
    "http_referer",
    "hostname",
    "timestamp",
    "bytes_sent",
    "request_time",
    "request_status",
    "city",
    "country",
    "lat",
    "long",
    "asn",
    "http_operation",
    "http_url",
    "protocol",
    "browser",
    "os",
    "device",
];

/// 이름이 코어 필드인지 확인합니다.
pub fn is_core_field(name: &str) -> bool {
    CORE_FIELDS.contains(&name)
}

/// 보조 필드 이름에 접두어를 붙입니다.
pub fn aux_field_name(name: &str) -> String {
    format!("{AUX_PREFIX}{name}")
}

/// 셀 하나의 값
///
/// 데이터셋, 쿼리 테이블, JSON 응답이 모두 이 타입을 공유합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 값 없음 (보조 필드 백필 등)
    Null,
    /// 문자열
    Str(String),
    /// 정수
    Int(i64),
    /// 실수
    Float(f64),
    /// 시각
    Time(DateTime<FixedOffset>),
}

impl FieldValue {
    /// `Null` 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 정수 또는 실수인지 확인합니다.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// 숫자 값을 `f64`로 변환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// 문자열 값을 빌려옵니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// 시각 값을 반환합니다.
    pub fn as_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Time(t) => write!(f, "{}", t.format(TIMESTAMP_EXPORT_FORMAT)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Time(t) => serializer.collect_str(&t.format(TIMESTAMP_EXPORT_FORMAT)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Time(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// 코어 필드 묶음
///
/// 필드 선언 순서는 [`CORE_FIELDS`]와 같습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreFields {
    /// 클라이언트 IP
    pub remote_ip: String,
    /// Referer 헤더
    pub http_referer: String,
    /// 요청 호스트명
    pub hostname: String,
    /// 요청 시각
    pub timestamp: DateTime<FixedOffset>,
    /// 응답 바이트 수
    pub bytes_sent: i64,
    /// 요청 처리 시간 (초)
    pub request_time: f64,
    /// HTTP 상태 코드
    pub request_status: i64,
    /// 도시
    pub city: String,
    /// 국가
    pub country: String,
    /// 위도
    pub lat: f64,
    /// 경도
    pub long: f64,
    /// 자율 시스템(ASN) 조직명
    pub asn: String,
    /// HTTP 메서드
    pub http_operation: String,
    /// 요청 URL
    pub http_url: String,
    /// HTTP 프로토콜 버전
    pub protocol: String,
    /// 브라우저
    pub browser: String,
    /// 운영체제
    pub os: String,
    /// 기기 분류
    pub device: String,
}

impl Default for CoreFields {
    fn default() -> Self {
        Self {
            remote_ip: String::new(),
            http_referer: String::new(),
            hostname: String::new(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
            bytes_sent: 0,
            request_time: 0.0,
            request_status: 0,
            city: UNKNOWN.to_owned(),
            country: UNKNOWN.to_owned(),
            lat: 0.0,
            long: 0.0,
            asn: UNKNOWN.to_owned(),
            http_operation: String::new(),
            http_url: String::new(),
            protocol: String::new(),
            browser: String::new(),
            os: String::new(),
            device: String::new(),
        }
    }
}

impl CoreFields {
    /// 이름으로 코어 필드 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "remote_ip" => self.remote_ip.as_str().into(),
            "http_referer" => self.http_referer.as_str().into(),
            "hostname" => self.hostname.as_str().into(),
            "timestamp" => self.timestamp.into(),
            "bytes_sent" => self.bytes_sent.into(),
            "request_time" => self.request_time.into(),
            "request_status" => self.request_status.into(),
            "city" => self.city.as_str().into(),
            "country" => self.country.as_str().into(),
            "lat" => self.lat.into(),
            "long" => self.long.into(),
            "asn" => self.asn.as_str().into(),
            "http_operation" => self.http_operation.as_str().into(),
            "http_url" => self.http_url.as_str().into(),
            "protocol" => self.protocol.as_str().into(),
            "browser" => self.browser.as_str().into(),
            "os" => self.os.as_str().into(),
            "device" => self.device.as_str().into(),
            _ => return None,
        };
        Some(value)
    }
}

/// 파싱 및 보강이 끝난 액세스 로그 레코드
///
/// 데이터셋에 추가된 뒤에는 `Arc`로 공유되며 변경되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    /// 코어 필드
    pub core: CoreFields,
    aux: Vec<(String, FieldValue)>,
}

impl LogRecord {
    /// 코어 필드로 레코드를 생성합니다. 보조 필드는 비어 있습니다.
    pub fn new(core: CoreFields) -> Self {
        Self {
            core,
            aux: Vec::new(),
        }
    }

    /// 보조 필드를 추가합니다.
    ///
    /// `aux_` 접두어가 자동으로 붙으며, 같은 이름이 이미 있으면 값을 교체합니다.
    pub fn add_aux(&mut self, name: &str, value: impl Into<FieldValue>) {
        let full = aux_field_name(name);
        let value = value.into();
        match self.aux.iter_mut().find(|(n, _)| *n == full) {
            Some(slot) => slot.1 = value,
            None => self.aux.push((full, value)),
        }
    }

    /// 보조 필드를 `order`(접두어 포함 이름) 순서로 재배열합니다.
    ///
    /// `order`에 있지만 레코드에 없는 필드는 `Null`로 채워지고,
    /// `order`에 없는 필드는 원래 순서대로 뒤에 남습니다.
    pub fn arrange_aux(&mut self, order: &[String]) {
        let mut rest = std::mem::take(&mut self.aux);
        let mut arranged = Vec::with_capacity(order.len() + rest.len());
        for name in order {
            match rest.iter().position(|(n, _)| n == name) {
                Some(pos) => arranged.push(rest.remove(pos)),
                None => arranged.push((name.clone(), FieldValue::Null)),
            }
        }
        arranged.extend(rest);
        self.aux = arranged;
    }

    /// 접두어 없는 이름으로 보조 필드를 조회합니다.
    pub fn aux(&self, name: &str) -> Option<&FieldValue> {
        let full = aux_field_name(name);
        self.aux.iter().find(|(n, _)| *n == full).map(|(_, v)| v)
    }

    /// 보조 필드 목록 (접두어 포함 이름, 추가 순서)
    pub fn aux_fields(&self) -> &[(String, FieldValue)] {
        &self.aux
    }

    /// 전체 필드 이름 (코어 필드 다음 보조 필드)
    pub fn field_names(&self) -> Vec<String> {
        CORE_FIELDS
            .iter()
            .map(|s| (*s).to_owned())
            .chain(self.aux.iter().map(|(n, _)| n.clone()))
            .collect()
    }

    /// 전체 필드 이름 목록이 `names`와 같은지 확인합니다.
    pub fn has_schema(&self, names: &[String]) -> bool {
        names.len() == CORE_FIELDS.len() + self.aux.len()
            && names.iter().zip(CORE_FIELDS.iter()).all(|(a, b)| a == b)
            && names[CORE_FIELDS.len()..]
                .iter()
                .zip(self.aux.iter())
                .all(|(a, (b, _))| a == b)
    }

    /// 이름(접두어 포함)으로 필드 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.core.get(name).or_else(|| {
            self.aux
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// 필드 값을 컬럼 순서대로 반환합니다.
    pub fn values(&self) -> Vec<FieldValue> {
        let mut values: Vec<FieldValue> = CORE_FIELDS
            .iter()
            .filter_map(|name| self.core.get(name))
            .collect();
        values.extend(self.aux.iter().map(|(_, v)| v.clone()));
        values
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CORE_FIELDS.len() + self.aux.len()))?;
        for name in CORE_FIELDS {
            if let Some(value) = self.core.get(name) {
                map.serialize_entry(name, &value)?;
            }
        }
        for (name, value) in &self.aux {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.core.remote_ip,
            self.core.timestamp.format(TIMESTAMP_EXPORT_FORMAT),
            self.core.http_operation,
            self.core.http_url,
            self.core.request_status,
        )
    }
}
