//! 대시보드 쿼리 엔진
//!
//! 스냅샷 표에 필터, 프로젝션, 그룹화, 시간 구간 집계를 순서대로 적용합니다.
//! 각 단계는 표를 소비하고 새 표를 돌려주며, `index`(행별 시각)를 행과
//! 함께 유지합니다.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};
use logalyzer_core::config::DashboardConfig;
use logalyzer_core::table::Table;
use logalyzer_core::types::{FieldValue, TIMESTAMP_EXPORT_FORMAT};

use crate::error::{QueryError, WidthError};
use crate::width::{TimeWidth, parse_timestamp};

/// 시간 구간 집계가 만들 수 있는 최대 버킷 수
pub const MAX_TIME_BUCKETS: u64 = 100_000;

/// 타임스탬프 컬럼 이름
const TIMESTAMP_COLUMN: &str = "timestamp";

/// 값이 모두 비어 있을 때 숫자 컬럼으로 취급하는 코어 필드
const CORE_NUMERIC_FIELDS: [&str; 5] = ["bytes_sent", "request_time", "request_status", "lat", "long"];

/// 실수 합계를 쓰는 코어 필드
const CORE_FLOAT_FIELDS: [&str; 3] = ["request_time", "lat", "long"];

/// 대시보드 하나의 쿼리 정의
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// 표시 컬럼 (비어 있으면 전체)
    pub display_cols: Vec<String>,
    /// 그룹 기준 컬럼
    pub group_by_cols: Vec<String>,
    /// 그룹 건수 컬럼 이름
    pub count_title: String,
    /// 시간 구간 폭
    pub time_group: Option<TimeWidth>,
    /// 구간 건수 컬럼 이름
    pub time_title: String,
}

impl QuerySpec {
    /// 대시보드 설정에서 쿼리 정의를 만듭니다.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, WidthError> {
        let time_group = config
            .time_group
            .as_deref()
            .map(TimeWidth::parse)
            .transpose()?;
        Ok(Self {
            display_cols: config.display_cols.clone(),
            group_by_cols: config.group_by_cols.clone(),
            count_title: config.count_title.clone(),
            time_group,
            time_title: config.time_title.clone(),
        })
    }

    /// 결과 표의 컬럼 이름을 예상합니다 (레이아웃용).
    pub fn output_columns(&self) -> Vec<String> {
        let mut cols = self.display_cols.clone();
        if !self.group_by_cols.is_empty() {
            cols.push(self.count_title.clone());
        }
        if self.time_group.is_some() {
            cols.push(self.time_title.clone());
        }
        cols
    }

    /// 모든 단계를 실행합니다.
    pub fn run(&self, table: Table, filter: Option<&Filter>) -> Result<Table, QueryError> {
        let table = match filter {
            Some(f) => apply_filter(table, f),
            None => table,
        };
        let table = project(table, &self.display_cols)?;
        let table = group_by(table, &self.group_by_cols, &self.count_title)?;
        match self.time_group {
            Some(width) => time_bucket(table, width, &self.time_title),
            None => Ok(table),
        }
    }
}

/// 컨텍스트 쿼리 필터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// 컬럼 이름 또는 시간 폭
    pub key: String,
    /// 비교 값
    pub value: String,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ─── 필터 ───────────────────────────────────────────────────────────

/// 필터 값을 셀과 비교할 수 있는 형태로 변환한 것
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Int(i64),
    Float(f64),
    Str,
}

fn coerce(value: &str) -> Target {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(v) = value.parse::<i64>() {
            return Target::Int(v);
        }
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Target::Float(v),
        _ => Target::Str,
    }
}

fn cell_matches(cell: &FieldValue, target: &Target, raw: &str) -> bool {
    match (cell, target) {
        (FieldValue::Null, _) => false,
        (FieldValue::Int(a), Target::Int(b)) => a == b,
        (FieldValue::Int(_) | FieldValue::Float(_), Target::Int(_) | Target::Float(_)) => {
            let want = match target {
                Target::Int(v) => *v as f64,
                Target::Float(v) => *v,
                Target::Str => return false,
            };
            cell.as_f64() == Some(want)
        }
        (FieldValue::Str(s), _) => s == raw,
        (FieldValue::Time(t), _) => t.format(TIMESTAMP_EXPORT_FORMAT).to_string() == raw,
        _ => false,
    }
}

/// 필터를 적용합니다.
///
/// 키가 컬럼이면 값 일치, 아니면 `[value, value + 폭)` 시간 구간으로 해석합니다.
/// 어느 쪽으로도 해석할 수 없으면 경고를 남기고 표를 그대로 돌려줍니다.
pub fn apply_filter(table: Table, filter: &Filter) -> Table {
    if filter.key.is_empty() || filter.value.is_empty() {
        return table;
    }

    if let Some(col) = table.column_index(&filter.key) {
        let target = coerce(&filter.value);
        return retain_rows(table, |row, _| {
            cell_matches(&row[col], &target, &filter.value)
        });
    }

    let window = TimeWidth::parse(&filter.key)
        .ok()
        .zip(parse_timestamp(&filter.value));
    match window {
        Some((width, start)) => {
            // 범위를 넘는 끝은 상한 없음으로 취급합니다
            let end = start.checked_add_signed(width.delta());
            retain_rows(table, |_, ts| start <= *ts && end.is_none_or(|end| *ts < end))
        }
        None => {
            tracing::warn!(
                key = %filter.key,
                value = %filter.value,
                "filter key is neither a column nor a time width, ignoring"
            );
            table
        }
    }
}

fn retain_rows(
    table: Table,
    mut keep: impl FnMut(&[FieldValue], &DateTime<FixedOffset>) -> bool,
) -> Table {
    let Table {
        columns,
        rows,
        index,
    } = table;
    let (rows, index) = rows
        .into_iter()
        .zip(index)
        .filter(|(row, ts)| keep(row, ts))
        .unzip();
    Table {
        columns,
        rows,
        index,
    }
}

fn column_positions(table: &Table, names: &[String]) -> Result<Vec<usize>, QueryError> {
    names
        .iter()
        .map(|name| {
            table
                .column_index(name)
                .ok_or_else(|| QueryError::UnknownColumn(name.clone()))
        })
        .collect()
}

// ─── 프로젝션 ───────────────────────────────────────────────────────

/// 표시 컬럼만 남기고, 남긴 컬럼 중 하나라도 비어 있는 행을 버립니다.
///
/// `cols`가 비어 있으면 표를 그대로 돌려줍니다.
pub fn project(table: Table, cols: &[String]) -> Result<Table, QueryError> {
    if cols.is_empty() {
        return Ok(table);
    }
    let positions = column_positions(&table, cols)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut index = Vec::with_capacity(table.index.len());
    for (mut row, ts) in table.rows.into_iter().zip(table.index) {
        if positions.iter().any(|&p| row[p].is_null()) {
            continue;
        }
        rows.push(
            positions
                .iter()
                .map(|&p| std::mem::replace(&mut row[p], FieldValue::Null))
                .collect(),
        );
        index.push(ts);
    }

    Ok(Table {
        columns: cols.to_vec(),
        rows,
        index,
    })
}

// ─── 그룹화 ─────────────────────────────────────────────────────────

/// 해시 가능한 그룹 키 구성 요소
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Null,
    Str(String),
    Int(i64),
    Float(u64),
    Time(DateTime<FixedOffset>),
}

impl From<&FieldValue> for KeyPart {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Self::Null,
            FieldValue::Str(s) => Self::Str(s.clone()),
            FieldValue::Int(v) => Self::Int(*v),
            FieldValue::Float(v) => Self::Float(v.to_bits()),
            FieldValue::Time(t) => Self::Time(*t),
        }
    }
}

/// 그룹 컬럼 조합별 건수를 셉니다.
///
/// 그룹마다 처음 나온 행을 대표로 남기고 건수 컬럼을 붙인 뒤
/// 건수 내림차순으로 정렬합니다 (동률은 처음 나온 순서).
pub fn group_by(table: Table, cols: &[String], count_title: &str) -> Result<Table, QueryError> {
    if cols.is_empty() {
        return Ok(table);
    }
    let positions = column_positions(&table, cols)?;

    let mut slots: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<FieldValue>, DateTime<FixedOffset>, i64)> = Vec::new();
    for (row, ts) in table.rows.into_iter().zip(table.index) {
        let key: Vec<KeyPart> = positions.iter().map(|&p| KeyPart::from(&row[p])).collect();
        match slots.get(&key) {
            Some(&slot) => groups[slot].2 += 1,
            None => {
                slots.insert(key, groups.len());
                groups.push((row, ts, 1));
            }
        }
    }
    groups.sort_by_key(|(_, _, count)| Reverse(*count));

    let mut columns = table.columns;
    let count_col = match columns.iter().position(|c| c == count_title) {
        Some(pos) => pos,
        None => {
            columns.push(count_title.to_owned());
            columns.len() - 1
        }
    };

    let mut rows = Vec::with_capacity(groups.len());
    let mut index = Vec::with_capacity(groups.len());
    for (mut row, ts, count) in groups {
        if count_col < row.len() {
            row[count_col] = FieldValue::Int(count);
        } else {
            row.push(FieldValue::Int(count));
        }
        rows.push(row);
        index.push(ts);
    }

    Ok(Table {
        columns,
        rows,
        index,
    })
}

// ─── 시간 구간 집계 ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sum {
    Int(i64),
    Float(f64),
}

impl Sum {
    fn add(&mut self, value: &FieldValue) {
        match (self, value) {
            (Sum::Int(acc), FieldValue::Int(v)) => *acc = acc.saturating_add(*v),
            (Sum::Float(acc), v) => *acc += v.as_f64().unwrap_or(0.0),
            _ => {}
        }
    }

    fn into_value(self) -> FieldValue {
        match self {
            Sum::Int(v) => FieldValue::Int(v),
            Sum::Float(v) => FieldValue::Float(v),
        }
    }
}

/// 집계 결과 컬럼 하나의 계산 방법
#[derive(Debug, Clone, Copy)]
enum Output {
    /// 입력 컬럼 합계
    Sum(usize, Sum),
    /// 구간 건수
    Count,
    /// 구간 시작 시각
    Start,
}

fn numeric_kind(table: &Table, col: usize) -> Option<Sum> {
    let mut any = false;
    let mut float = false;
    for row in &table.rows {
        match &row[col] {
            FieldValue::Null => {}
            FieldValue::Int(_) => any = true,
            FieldValue::Float(_) => {
                any = true;
                float = true;
            }
            _ => return None,
        }
    }
    let name = table.columns[col].as_str();
    if !any {
        if !CORE_NUMERIC_FIELDS.contains(&name) {
            return None;
        }
        float = CORE_FLOAT_FIELDS.contains(&name);
    }
    Some(if float { Sum::Float(0.0) } else { Sum::Int(0) })
}

fn bucket_plan(table: &Table, time_title: &str) -> (Vec<String>, Vec<Output>) {
    let mut columns = Vec::new();
    let mut outputs = Vec::new();
    for (col, name) in table.columns.iter().enumerate() {
        let output = if name == time_title {
            Some(Output::Count)
        } else if name == TIMESTAMP_COLUMN {
            Some(Output::Start)
        } else {
            numeric_kind(table, col).map(|kind| Output::Sum(col, kind))
        };
        if let Some(output) = output {
            columns.push(name.clone());
            outputs.push(output);
        }
    }
    if !columns.iter().any(|c| c == time_title) {
        columns.push(time_title.to_owned());
        outputs.push(Output::Count);
    }
    if !columns.iter().any(|c| c == TIMESTAMP_COLUMN) {
        columns.push(TIMESTAMP_COLUMN.to_owned());
        outputs.push(Output::Start);
    }
    (columns, outputs)
}

/// 행을 고정 폭 시간 구간으로 묶어 숫자 컬럼을 합산합니다.
///
/// 구간은 가장 이른 행이 속한 날의 자정(그 행의 오프셋 기준)부터 폭 단위로
/// 나뉩니다. 처음과 마지막 비어 있지 않은 구간 사이의 빈 구간도 0으로 출력합니다.
pub fn time_bucket(table: Table, width: TimeWidth, time_title: &str) -> Result<Table, QueryError> {
    let (columns, outputs) = bucket_plan(&table, time_title);

    let Some(first) = table.index.iter().min().copied() else {
        return Ok(Table::empty(columns));
    };
    let origin = first
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*first.offset())
        .single()
        .unwrap_or(first);
    let width_secs = width.seconds();

    let slots: Vec<i64> = table
        .index
        .iter()
        .map(|ts| (*ts - origin).num_seconds().div_euclid(width_secs))
        .collect();
    let lo = slots.iter().copied().min().unwrap_or(0);
    let hi = slots.iter().copied().max().unwrap_or(0);
    let count = u64::try_from(hi - lo).unwrap_or(u64::MAX).saturating_add(1);
    if count > MAX_TIME_BUCKETS {
        return Err(QueryError::TooManyBuckets {
            count,
            max: MAX_TIME_BUCKETS,
        });
    }

    let n = count as usize;
    let mut tallies = vec![0_i64; n];
    let mut sums: Vec<Vec<Sum>> = outputs
        .iter()
        .filter_map(|out| match out {
            Output::Sum(_, kind) => Some(vec![*kind; n]),
            _ => None,
        })
        .collect();

    for (row, slot) in table.rows.iter().zip(&slots) {
        let bucket = (slot - lo) as usize;
        tallies[bucket] += 1;
        let mut sum_idx = 0;
        for out in &outputs {
            if let Output::Sum(col, _) = out {
                sums[sum_idx][bucket].add(&row[*col]);
                sum_idx += 1;
            }
        }
    }

    let mut rows = Vec::with_capacity(n);
    let mut index = Vec::with_capacity(n);
    for bucket in 0..n {
        let start = origin + TimeDelta::seconds(width_secs * (lo + bucket as i64));
        let mut sum_idx = 0;
        let row = outputs
            .iter()
            .map(|out| match out {
                Output::Sum(..) => {
                    let value = sums[sum_idx][bucket].into_value();
                    sum_idx += 1;
                    value
                }
                Output::Count => FieldValue::Int(tallies[bucket]),
                Output::Start => FieldValue::Time(start),
            })
            .collect();
        rows.push(row);
        index.push(start);
    }

    Ok(Table {
        columns,
        rows,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn table(columns: &[&str], rows: Vec<(Vec<FieldValue>, &str)>) -> Table {
        let (rows, index) = rows.into_iter().map(|(r, t)| (r, ts(t))).unzip();
        Table {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            rows,
            index,
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn group_by_counts_and_sorts_descending() {
        let t = table(
            &["a"],
            vec![
                (vec![FieldValue::Int(2)], "2024-03-01T10:00:00Z"),
                (vec![FieldValue::Int(1)], "2024-03-01T10:00:01Z"),
                (vec![FieldValue::Int(1)], "2024-03-01T10:00:02Z"),
            ],
        );
        let out = group_by(t, &strings(&["a"]), "count").unwrap();
        assert_eq!(out.columns, strings(&["a", "count"]));
        assert_eq!(
            out.rows,
            vec![
                vec![FieldValue::Int(1), FieldValue::Int(2)],
                vec![FieldValue::Int(2), FieldValue::Int(1)],
            ]
        );
    }

    #[test]
    fn group_by_ties_keep_first_seen_order() {
        let t = table(
            &["a"],
            vec![
                (vec![FieldValue::from("x")], "2024-03-01T10:00:00Z"),
                (vec![FieldValue::from("y")], "2024-03-01T10:00:01Z"),
                (vec![FieldValue::from("z")], "2024-03-01T10:00:02Z"),
            ],
        );
        let out = group_by(t, &strings(&["a"]), "hits").unwrap();
        let keys: Vec<_> = out.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(keys, ["x", "y", "z"]);
    }

    #[test]
    fn group_by_unknown_column() {
        let t = table(&["a"], vec![]);
        let err = group_by(t, &strings(&["b"]), "count").unwrap_err();
        assert_eq!(err, QueryError::UnknownColumn("b".to_owned()));
    }

    #[test]
    fn time_bucket_sums_within_hour() {
        let t = table(
            &["bytes_sent", "timestamp"],
            vec![
                (
                    vec![FieldValue::Int(100), FieldValue::Time(ts("2024-03-01T10:00:05Z"))],
                    "2024-03-01T10:00:05Z",
                ),
                (
                    vec![FieldValue::Int(50), FieldValue::Time(ts("2024-03-01T10:00:40Z"))],
                    "2024-03-01T10:00:40Z",
                ),
            ],
        );
        let out = time_bucket(t, TimeWidth::parse("1h").unwrap(), "tcount").unwrap();
        assert_eq!(out.columns, strings(&["bytes_sent", "timestamp", "tcount"]));
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0][0], FieldValue::Int(150));
        assert_eq!(out.rows[0][1], FieldValue::Time(ts("2024-03-01T10:00:00Z")));
        assert_eq!(out.rows[0][2], FieldValue::Int(2));
    }

    #[test]
    fn time_bucket_emits_empty_buckets() {
        let t = table(
            &["request_time"],
            vec![
                (vec![FieldValue::Float(0.5)], "2024-03-01T10:10:00+02:00"),
                (vec![FieldValue::Float(0.25)], "2024-03-01T12:59:00+02:00"),
            ],
        );
        let out = time_bucket(t, TimeWidth::parse("H").unwrap(), "tcount").unwrap();
        assert_eq!(out.columns, strings(&["request_time", "tcount", "timestamp"]));
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[1][0], FieldValue::Float(0.0));
        assert_eq!(out.rows[1][1], FieldValue::Int(0));
        assert_eq!(
            out.rows[2][2].to_string(),
            "2024-03-01T12:00:00+0200"
        );
    }

    #[test]
    fn time_bucket_drops_text_columns() {
        let t = table(
            &["http_url", "count"],
            vec![(
                vec![FieldValue::from("/"), FieldValue::Int(3)],
                "2024-03-01T10:00:00Z",
            )],
        );
        let out = time_bucket(t, TimeWidth::parse("1d").unwrap(), "tcount").unwrap();
        assert_eq!(out.columns, strings(&["count", "tcount", "timestamp"]));
        assert_eq!(out.rows[0][0], FieldValue::Int(3));
    }

    #[test]
    fn time_bucket_empty_table_keeps_numeric_core_columns() {
        let t = table(&["bytes_sent", "http_url", "aux_note"], vec![]);
        let out = time_bucket(t, TimeWidth::parse("1h").unwrap(), "tcount").unwrap();
        assert_eq!(out.columns, strings(&["bytes_sent", "tcount", "timestamp"]));
        assert!(out.is_empty());
    }

    #[test]
    fn time_bucket_rejects_runaway_ranges() {
        let t = table(
            &["bytes_sent"],
            vec![
                (vec![FieldValue::Int(1)], "2000-01-01T00:00:00Z"),
                (vec![FieldValue::Int(1)], "2024-01-01T00:00:00Z"),
            ],
        );
        let err = time_bucket(t, TimeWidth::parse("1s").unwrap(), "tcount").unwrap_err();
        assert!(matches!(err, QueryError::TooManyBuckets { .. }));
    }

    #[test]
    fn filter_by_time_window_is_half_open() {
        let t = table(
            &["http_url"],
            vec![
                (vec![FieldValue::from("/a")], "2024-03-01T09:59:59Z"),
                (vec![FieldValue::from("/b")], "2024-03-01T10:00:00Z"),
                (vec![FieldValue::from("/c")], "2024-03-01T10:59:59Z"),
                (vec![FieldValue::from("/d")], "2024-03-01T11:00:00Z"),
            ],
        );
        let out = apply_filter(t, &Filter::new("1h", "2024-03-01T10:00:00+0000"));
        let urls: Vec<_> = out.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(urls, ["/b", "/c"]);
        assert_eq!(out.index.len(), 2);
    }

    #[test]
    fn filter_coerces_numbers() {
        let t = table(
            &["request_status", "request_time"],
            vec![
                (vec![FieldValue::Int(200), FieldValue::Float(1.5)], "2024-03-01T10:00:00Z"),
                (vec![FieldValue::Int(404), FieldValue::Float(2.0)], "2024-03-01T10:00:01Z"),
            ],
        );
        let out = apply_filter(t.clone(), &Filter::new("request_status", "404"));
        assert_eq!(out.len(), 1);
        let out = apply_filter(t.clone(), &Filter::new("request_time", "1.5"));
        assert_eq!(out.len(), 1);
        let out = apply_filter(t, &Filter::new("request_time", "2"));
        assert_eq!(out.rows[0][0], FieldValue::Int(404));
    }

    #[test]
    fn filter_matches_text_and_timestamps() {
        let t = table(
            &["aux_code", "timestamp"],
            vec![
                (
                    vec![FieldValue::from("007"), FieldValue::Time(ts("2024-03-01T10:00:00Z"))],
                    "2024-03-01T10:00:00Z",
                ),
                (
                    vec![FieldValue::from("x"), FieldValue::Time(ts("2024-03-01T11:00:00Z"))],
                    "2024-03-01T11:00:00Z",
                ),
            ],
        );
        assert_eq!(apply_filter(t.clone(), &Filter::new("aux_code", "007")).len(), 1);
        let out = apply_filter(t, &Filter::new("timestamp", "2024-03-01T11:00:00+0000"));
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0][0], FieldValue::from("x"));
    }

    #[test]
    fn uninterpretable_filter_is_ignored() {
        let t = table(&["a"], vec![(vec![FieldValue::Int(1)], "2024-03-01T10:00:00Z")]);
        assert_eq!(apply_filter(t.clone(), &Filter::new("nope", "1")).len(), 1);
        assert_eq!(apply_filter(t, &Filter::new("", "")).len(), 1);
    }

    #[test]
    fn project_drops_rows_with_nulls() {
        let t = table(
            &["a", "b", "c"],
            vec![
                (
                    vec![FieldValue::Int(1), FieldValue::Null, FieldValue::from("x")],
                    "2024-03-01T10:00:00Z",
                ),
                (
                    vec![FieldValue::Int(2), FieldValue::Int(3), FieldValue::Null],
                    "2024-03-01T10:00:01Z",
                ),
            ],
        );
        let out = project(t.clone(), &strings(&["c", "a"])).unwrap();
        assert_eq!(out.columns, strings(&["c", "a"]));
        assert_eq!(out.rows, vec![vec![FieldValue::from("x"), FieldValue::Int(1)]]);
        assert_eq!(out.index, vec![ts("2024-03-01T10:00:00Z")]);

        let all = project(t, &[]).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn project_unknown_column() {
        let t = table(&["a"], vec![]);
        assert!(matches!(
            project(t, &strings(&["zz"])),
            Err(QueryError::UnknownColumn(c)) if c == "zz"
        ));
    }

    #[test]
    fn full_query_groups_then_buckets() {
        let mut config = DashboardConfig::new("hits");
        config.display_cols = strings(&["http_url", "timestamp"]);
        config.group_by_cols = strings(&["http_url"]);
        config.time_group = Some("1h".to_owned());
        let spec = QuerySpec::from_config(&config).unwrap();
        assert_eq!(spec.output_columns(), strings(&["http_url", "timestamp", "count", "tcount"]));

        let t = table(
            &["http_url", "timestamp", "bytes_sent"],
            vec![
                (
                    vec![FieldValue::from("/a"), FieldValue::Time(ts("2024-03-01T10:00:00Z")), FieldValue::Int(1)],
                    "2024-03-01T10:00:00Z",
                ),
                (
                    vec![FieldValue::from("/a"), FieldValue::Time(ts("2024-03-01T10:30:00Z")), FieldValue::Int(1)],
                    "2024-03-01T10:30:00Z",
                ),
                (
                    vec![FieldValue::from("/b"), FieldValue::Time(ts("2024-03-01T11:10:00Z")), FieldValue::Int(1)],
                    "2024-03-01T11:10:00Z",
                ),
            ],
        );
        let out = spec.run(t, None).unwrap();
        assert_eq!(out.columns, strings(&["timestamp", "count", "tcount"]));
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0][1], FieldValue::Int(2));
        assert_eq!(out.rows[1][1], FieldValue::Int(1));
    }

    #[test]
    fn bad_time_group_fails_spec_construction() {
        let mut config = DashboardConfig::new("x");
        config.time_group = Some("fortnight".to_owned());
        assert!(QuerySpec::from_config(&config).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn group_counts_sum_to_row_count(values in proptest::collection::vec(0_i64..5, 0..50)) {
                let n = values.len();
                let t = table(
                    &["a"],
                    values
                        .into_iter()
                        .map(|v| (vec![FieldValue::Int(v)], "2024-03-01T10:00:00Z"))
                        .collect(),
                );
                let out = group_by(t, &strings(&["a"]), "count").unwrap();
                let total: i64 = out.rows.iter().map(|r| match r[1] { FieldValue::Int(c) => c, _ => 0 }).sum();
                prop_assert_eq!(total as usize, n);
                let counts: Vec<i64> = out.rows.iter().map(|r| match r[1] { FieldValue::Int(c) => c, _ => 0 }).collect();
                prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]));
            }

            #[test]
            fn bucket_tallies_cover_all_rows(offsets in proptest::collection::vec(0_i64..86_400, 1..40)) {
                let base = ts("2024-03-01T00:00:00Z");
                let rows: Vec<Vec<FieldValue>> = offsets.iter().map(|_| vec![FieldValue::Int(1)]).collect();
                let index = offsets.iter().map(|o| base + chrono::TimeDelta::seconds(*o)).collect();
                let t = Table { columns: strings(&["bytes_sent"]), rows, index };
                let out = time_bucket(t, TimeWidth::parse("15min").unwrap(), "tcount").unwrap();
                let tallied: i64 = out.rows.iter().map(|r| match r[1] { FieldValue::Int(c) => c, _ => 0 }).sum();
                prop_assert_eq!(tallied as usize, offsets.len());
            }
        }
    }
}
