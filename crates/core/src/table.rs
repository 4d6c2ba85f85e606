//! 쿼리 테이블 -- 스냅샷과 대시보드 쿼리 결과의 공통 표 형식
//!
//! `index`는 각 행의 시각으로, `timestamp` 컬럼이 프로젝션에서 빠져도
//! 시간 구간 필터와 집계에 계속 사용됩니다.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::types::FieldValue;

/// 컬럼 이름, 행, 행별 시각 인덱스로 구성된 표
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// 컬럼 이름
    pub columns: Vec<String>,
    /// 행 (각 행의 길이는 `columns`와 같음)
    pub rows: Vec<Vec<FieldValue>>,
    /// 행별 시각 (직렬화하지 않음)
    #[serde(skip)]
    pub index: Vec<DateTime<FixedOffset>>,
}

impl Table {
    /// 컬럼만 있는 빈 표를 만듭니다.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            index: Vec::new(),
        }
    }

    /// 행 수
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 행이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 컬럼 위치를 찾습니다.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 컬럼 하나의 값을 행 순서대로 복사합니다.
    pub fn column_values(&self, name: &str) -> Option<Vec<FieldValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:00:00+00:00").unwrap();
        Table {
            columns: vec!["a".to_owned(), "b".to_owned()],
            rows: vec![
                vec![FieldValue::Int(1), FieldValue::from("x")],
                vec![FieldValue::Int(2), FieldValue::from("y")],
            ],
            index: vec![ts, ts],
        }
    }

    #[test]
    fn column_lookup() {
        let t = table();
        assert_eq!(t.column_index("b"), Some(1));
        assert_eq!(t.column_index("c"), None);
        assert_eq!(
            t.column_values("a"),
            Some(vec![FieldValue::Int(1), FieldValue::Int(2)])
        );
    }

    #[test]
    fn serializes_without_index() {
        let json = serde_json::to_string(&table()).unwrap();
        assert_eq!(json, r#"{"columns":["a","b"],"rows":[[1,"x"],[2,"y"]]}"#);
    }

    #[test]
    fn empty_table_keeps_columns() {
        let t = Table::empty(vec!["a".to_owned()]);
        assert!(t.is_empty());
        assert_eq!(t.columns.len(), 1);
    }
}
