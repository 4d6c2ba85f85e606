#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, TimeDelta};
use libfuzzer_sys::fuzz_target;
use logalyzer_core::{FieldValue, Table};
use logalyzer_dashboard::{Filter, QuerySpec, TimeWidth};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// (분 오프셋, URL, 전송 바이트) 행 목록
    rows: Vec<(u16, String, Option<i32>)>,
    filter_key: String,
    filter_value: String,
    time_group: Option<String>,
    group_by_url: bool,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(base) = DateTime::parse_from_rfc3339("2024-03-01T00:00:00+00:00") else {
        return;
    };

    let mut table = Table::empty(vec![
        "timestamp".to_owned(),
        "http_url".to_owned(),
        "bytes_sent".to_owned(),
    ]);
    // 인덱스는 시간순이어야 합니다
    let mut rows = input.rows;
    rows.truncate(256);
    rows.sort_by_key(|(minutes, _, _)| *minutes);
    for (minutes, url, bytes) in rows {
        let at = base + TimeDelta::minutes(i64::from(minutes));
        table.rows.push(vec![
            FieldValue::Time(at),
            FieldValue::Str(url),
            bytes.map_or(FieldValue::Null, |b| FieldValue::Int(i64::from(b))),
        ]);
        table.index.push(at);
    }

    let group_by_cols = if input.group_by_url {
        vec!["http_url".to_owned()]
    } else {
        Vec::new()
    };
    let spec = QuerySpec {
        display_cols: Vec::new(),
        group_by_cols,
        count_title: "count".to_owned(),
        time_group: input.time_group.as_deref().and_then(|w| TimeWidth::parse(w).ok()),
        time_title: "tcount".to_owned(),
    };
    let filter = Filter::new(input.filter_key, input.filter_value);

    if let Ok(result) = spec.run(table, Some(&filter)) {
        assert!(result.rows.iter().all(|row| row.len() == result.columns.len()));
    }
});
