//! 데이터셋 -- 수집된 레코드의 추가 전용, 시간 정렬 스냅샷 저장소
//!
//! 쓰기는 수집 스레드 하나, 읽기는 여러 HTTP 핸들러가 동시에 수행합니다.
//! 락 안에서는 레코드 핸들(`Arc`) 복사만 하고, 정렬은 락 밖에서 합니다.
//!
//! # 스키마
//! 첫 레코드의 필드 목록이 스키마로 고정되며, 이후 필드 구성이 다른 레코드는
//! [`DatasetError::SchemaMismatch`]로 거부됩니다.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use tracing::{error, warn};

use logalyzer_core::error::DatasetError;
use logalyzer_core::metrics as m;
use logalyzer_core::table::Table;
use logalyzer_core::types::LogRecord;

#[derive(Default)]
struct DatasetInner {
    schema: Option<Arc<[String]>>,
    records: Vec<Arc<LogRecord>>,
}

/// 스레드 안전한 추가 전용 레코드 저장소
pub struct Dataset {
    inner: Mutex<DatasetInner>,
    last_good: Mutex<Arc<Snapshot>>,
    lock_timeout: Duration,
}

impl Dataset {
    /// 스냅샷 락 대기 한도를 지정해 빈 데이터셋을 만듭니다.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(DatasetInner::default()),
            last_good: Mutex::new(Arc::new(Snapshot::empty())),
            lock_timeout,
        }
    }

    /// 레코드를 추가합니다.
    ///
    /// 첫 레코드가 스키마를 고정합니다. 필드 구성이 다르면 거부합니다.
    pub fn append(&self, record: LogRecord) -> Result<(), DatasetError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match &inner.schema {
            Some(schema) if !record.has_schema(schema) => {
                metrics::counter!(m::DATASET_RECORDS_REJECTED_TOTAL).increment(1);
                return Err(DatasetError::SchemaMismatch {
                    expected: schema.to_vec(),
                    actual: record.field_names(),
                });
            }
            Some(_) => {}
            None => inner.schema = Some(record.field_names().into()),
        }
        inner.records.push(Arc::new(record));
        metrics::gauge!(m::DATASET_RECORDS).set(inner.records.len() as f64);
        Ok(())
    }

    /// 시간순으로 정렬된 읽기 전용 스냅샷을 반환합니다.
    ///
    /// 락을 제한 시간 안에 얻지 못하면 마지막으로 성공한 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let Some(inner) = self.inner.try_lock_for(self.lock_timeout) else {
            error!(
                timeout_secs = self.lock_timeout.as_secs(),
                "dataset lock timeout, serving last good snapshot"
            );
            metrics::counter!(m::DATASET_SNAPSHOT_TIMEOUTS_TOTAL).increment(1);
            return Arc::clone(&self.last_good.lock());
        };

        // 추가 전용이므로 길이가 같으면 내용도 같다
        {
            let last = self.last_good.lock();
            if last.len() == inner.records.len() {
                return Arc::clone(&last);
            }
        }

        let columns = inner.schema.as_deref().map(<[String]>::to_vec).unwrap_or_default();
        let mut records = inner.records.clone();
        drop(inner);

        records.sort_by_key(|r| r.core.timestamp);
        let snapshot = Arc::new(Snapshot { columns, records });

        let mut last = self.last_good.lock();
        // 느린 리더가 더 최신 스냅샷을 덮어쓰지 않도록
        if snapshot.len() >= last.len() {
            *last = Arc::clone(&snapshot);
        }
        snapshot
    }

    /// 저장된 레코드 수
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 락을 제한 시간까지만 기다리는 레코드 수
    ///
    /// 시간 초과 시 마지막으로 성공한 스냅샷의 크기를 반환합니다.
    pub fn len_within_timeout(&self) -> usize {
        match self.inner.try_lock_for(self.lock_timeout) {
            Some(inner) => inner.records.len(),
            None => {
                error!(
                    timeout_secs = self.lock_timeout.as_secs(),
                    "dataset lock timeout, reporting last good snapshot size"
                );
                metrics::counter!(m::DATASET_SNAPSHOT_TIMEOUTS_TOTAL).increment(1);
                self.last_good.lock().len()
            }
        }
    }

    /// 고정된 스키마 (첫 레코드 이전에는 `None`)
    pub fn schema(&self) -> Option<Vec<String>> {
        self.inner.lock().schema.as_deref().map(<[String]>::to_vec)
    }

    /// 스키마 불일치 레코드는 경고 로그만 남기고 버립니다.
    pub fn append_or_warn(&self, record: LogRecord) -> bool {
        match self.append(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "record rejected by dataset");
                false
            }
        }
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// 데이터셋의 불변 시간순 사본
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    columns: Vec<String>,
    records: Vec<Arc<LogRecord>>,
}

impl Snapshot {
    /// 빈 스냅샷
    pub fn empty() -> Self {
        Self::default()
    }

    /// 컬럼 이름 (레코드가 없으면 빈 목록)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 가장 이른 타임스탬프
    pub fn first_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.records.first().map(|r| r.core.timestamp)
    }

    /// 가장 늦은 타임스탬프
    pub fn last_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.records.last().map(|r| r.core.timestamp)
    }

    /// 레코드 (시간순)
    pub fn records(&self) -> &[Arc<LogRecord>] {
        &self.records
    }

    /// 쿼리 엔진 입력 테이블을 만듭니다.
    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.records.iter().map(|r| r.values()).collect(),
            index: self.records.iter().map(|r| r.core.timestamp).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use logalyzer_core::types::{CoreFields, FieldValue};

    fn record_at(secs: i64) -> LogRecord {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(1_700_000_000 + secs, 0)
            .unwrap();
        LogRecord::new(CoreFields {
            timestamp: ts,
            ..Default::default()
        })
    }

    #[test]
    fn empty_dataset_gives_empty_snapshot() {
        let dataset = Dataset::default();
        let snap = dataset.snapshot();
        assert!(snap.is_empty());
        assert!(snap.columns().is_empty());
        assert!(snap.first_timestamp().is_none());
        assert!(dataset.schema().is_none());
    }

    #[test]
    fn snapshot_is_sorted_by_timestamp() {
        let dataset = Dataset::default();
        dataset.append(record_at(30)).unwrap();
        dataset.append(record_at(10)).unwrap();
        dataset.append(record_at(20)).unwrap();

        let snap = dataset.snapshot();
        let secs: Vec<i64> = snap
            .records()
            .iter()
            .map(|r| r.core.timestamp.timestamp() - 1_700_000_000)
            .collect();
        assert_eq!(secs, vec![10, 20, 30]);
        assert_eq!(snap.first_timestamp(), Some(record_at(10).core.timestamp));
        assert_eq!(snap.last_timestamp(), Some(record_at(30).core.timestamp));
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let dataset = Dataset::default();
        for url in ["/a", "/b", "/c"] {
            let mut rec = record_at(0);
            rec.core.http_url = url.to_owned();
            dataset.append(rec).unwrap();
        }
        let urls: Vec<String> = dataset
            .snapshot()
            .records()
            .iter()
            .map(|r| r.core.http_url.clone())
            .collect();
        assert_eq!(urls, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn schema_is_locked_by_first_record() {
        let dataset = Dataset::default();
        let mut first = record_at(0);
        first.add_aux("param", FieldValue::Null);
        dataset.append(first).unwrap();

        let err = dataset.append(record_at(1)).unwrap_err();
        assert!(matches!(err, DatasetError::SchemaMismatch { .. }));
        assert_eq!(dataset.len(), 1);
        assert!(dataset.schema().unwrap().contains(&"aux_param".to_owned()));
    }

    #[test]
    fn append_or_warn_drops_mismatched_record() {
        let dataset = Dataset::default();
        assert!(dataset.append_or_warn(record_at(0)));
        let mut other = record_at(1);
        other.add_aux("x", 1_i64);
        assert!(!dataset.append_or_warn(other));
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let dataset = Dataset::default();
        dataset.append(record_at(0)).unwrap();
        let before = dataset.snapshot();
        dataset.append(record_at(1)).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(dataset.snapshot().len(), 2);
    }

    #[test]
    fn unchanged_dataset_reuses_snapshot() {
        let dataset = Dataset::default();
        dataset.append(record_at(0)).unwrap();
        let a = dataset.snapshot();
        let b = dataset.snapshot();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn lock_timeout_serves_last_good_snapshot() {
        let dataset = Dataset::new(Duration::from_millis(20));
        dataset.append(record_at(0)).unwrap();
        let good = dataset.snapshot();

        let guard = dataset.inner.lock();
        let served = dataset.snapshot();
        drop(guard);

        assert!(Arc::ptr_eq(&good, &served));
    }

    #[test]
    fn bounded_len_does_not_wait_for_writer() {
        let dataset = Dataset::new(Duration::from_millis(20));
        dataset.append(record_at(0)).unwrap();
        let _ = dataset.snapshot();
        dataset.append(record_at(1)).unwrap();
        assert_eq!(dataset.len_within_timeout(), 2);

        let guard = dataset.inner.lock();
        let started = std::time::Instant::now();
        assert_eq!(dataset.len_within_timeout(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(guard);
    }

    #[test]
    fn to_table_keeps_index_and_columns() {
        let dataset = Dataset::default();
        dataset.append(record_at(5)).unwrap();
        let table = dataset.snapshot().to_table();
        assert_eq!(table.columns.len(), 18);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.index, vec![record_at(5).core.timestamp]);
    }
}
