//! 시간 폭과 시각 값 파싱
//!
//! 폭은 `15s`, `30min`, `1h`, `2D`, `T` 처럼 숫자 접두어(생략 시 1)와
//! 단위 별칭으로 씁니다.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use logalyzer_core::types::TIMESTAMP_EXPORT_FORMAT;

use crate::error::WidthError;

/// 시간 구간 폭
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWidth(TimeDelta);

impl TimeWidth {
    /// 폭 문자열을 파싱합니다.
    pub fn parse(input: &str) -> Result<Self, WidthError> {
        let fail = |reason: String| WidthError {
            input: input.to_owned(),
            reason,
        };

        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| fail("missing unit".to_owned()))?;
        let (digits, unit) = trimmed.split_at(split);

        let count: i64 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|e| fail(format!("bad multiplier: {e}")))?
        };
        if count <= 0 {
            return Err(fail("width must be positive".to_owned()));
        }

        let unit_secs: i64 = match unit {
            "s" | "S" => 1,
            "min" | "T" => 60,
            "h" | "H" => 3_600,
            "d" | "D" => 86_400,
            "w" | "W" => 604_800,
            other => return Err(fail(format!("unknown unit '{other}'"))),
        };

        let secs = count
            .checked_mul(unit_secs)
            .ok_or_else(|| fail("width overflows".to_owned()))?;
        TimeDelta::try_seconds(secs)
            .map(Self)
            .ok_or_else(|| fail("width overflows".to_owned()))
    }

    /// 폭을 `TimeDelta`로 반환합니다.
    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    /// 폭을 초 단위로 반환합니다.
    pub fn seconds(&self) -> i64 {
        self.0.num_seconds()
    }
}

/// 필터 값으로 전달된 시각을 파싱합니다.
///
/// 내보내기 형식, RFC 3339, 오프셋 없는 `%Y-%m-%dT%H:%M:%S`(UTC로 간주) 순으로 시도합니다.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_str(value, TIMESTAMP_EXPORT_FORMAT) {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .or_else(|| value.parse::<DateTime<Utc>>().ok().map(|t| t.fixed_offset()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!(TimeWidth::parse("15s").unwrap().seconds(), 15);
        assert_eq!(TimeWidth::parse("30min").unwrap().seconds(), 1_800);
        assert_eq!(TimeWidth::parse("T").unwrap().seconds(), 60);
        assert_eq!(TimeWidth::parse("1h").unwrap().seconds(), 3_600);
        assert_eq!(TimeWidth::parse("H").unwrap().seconds(), 3_600);
        assert_eq!(TimeWidth::parse("2d").unwrap().seconds(), 172_800);
        assert_eq!(TimeWidth::parse("1D").unwrap().seconds(), 86_400);
        assert_eq!(TimeWidth::parse("1w").unwrap().seconds(), 604_800);
    }

    #[test]
    fn rejects_bad_widths() {
        for bad in ["", "10", "0h", "5x", "h5", "1 hour", "timestamp"] {
            assert!(TimeWidth::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(TimeWidth::parse("99999999999999999w").is_err());
    }

    #[test]
    fn timestamp_formats() {
        let export = parse_timestamp("2024-03-01T10:00:00+0100").unwrap();
        assert_eq!(export.offset().local_minus_utc(), 3_600);

        let rfc = parse_timestamp("2024-03-01T10:00:00+01:00").unwrap();
        assert_eq!(rfc, export);

        let naive = parse_timestamp("2024-03-01T10:00:00").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
