//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logalyzer_`
//! - 모듈명: `log_pipeline_`, `dataset_`, `enricher_`, `dashboard_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logalyzer_core::metrics::LOG_PIPELINE_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 대시보드 엔드포인트 레이블 키 (layout, data, context)
pub const LABEL_ENDPOINT: &str = "endpoint";

// ─── Log Pipeline 메트릭 ────────────────────────────────────────────

/// Log Pipeline: 읽은 전체 라인 수 (counter)
pub const LOG_PIPELINE_LINES_READ_TOTAL: &str = "logalyzer_log_pipeline_lines_read_total";

/// Log Pipeline: 파싱 에러 수 (counter)
pub const LOG_PIPELINE_PARSE_ERRORS_TOTAL: &str = "logalyzer_log_pipeline_parse_errors_total";

/// Log Pipeline: 제외 규칙으로 버려진 레코드 수 (counter)
pub const LOG_PIPELINE_RECORDS_EXCLUDED_TOTAL: &str =
    "logalyzer_log_pipeline_records_excluded_total";

/// Log Pipeline: 파일 열기/읽기 실패 수 (counter)
pub const LOG_PIPELINE_FILE_ERRORS_TOTAL: &str = "logalyzer_log_pipeline_file_errors_total";

/// Log Pipeline: 수집 1회 소요 시간 (histogram, 초)
pub const LOG_PIPELINE_TICK_DURATION_SECONDS: &str =
    "logalyzer_log_pipeline_tick_duration_seconds";

/// Log Pipeline: 지리 정보 캐시 크기 (gauge)
pub const LOG_PIPELINE_GEO_CACHE_SIZE: &str = "logalyzer_log_pipeline_geo_cache_size";

// ─── Dataset 메트릭 ─────────────────────────────────────────────────

/// Dataset: 저장된 레코드 수 (gauge)
pub const DATASET_RECORDS: &str = "logalyzer_dataset_records";

/// Dataset: 스키마 불일치로 거부된 레코드 수 (counter)
pub const DATASET_RECORDS_REJECTED_TOTAL: &str = "logalyzer_dataset_records_rejected_total";

/// Dataset: 잠금 대기 시간 초과로 이전 스냅샷을 반환한 횟수 (counter)
pub const DATASET_SNAPSHOT_TIMEOUTS_TOTAL: &str = "logalyzer_dataset_snapshot_timeouts_total";

// ─── Enricher 메트릭 ────────────────────────────────────────────────

/// Enricher: 로드된 플러그인 수 (gauge)
pub const ENRICHERS_LOADED: &str = "logalyzer_enrichers_loaded";

/// Enricher: 플러그인 실행 실패 수 (counter)
pub const ENRICHER_ERRORS_TOTAL: &str = "logalyzer_enricher_errors_total";

// ─── Dashboard 메트릭 ───────────────────────────────────────────────

/// Dashboard: HTTP 요청 수 (counter, label: endpoint)
pub const DASHBOARD_REQUESTS_TOTAL: &str = "logalyzer_dashboard_requests_total";

/// Dashboard: 쿼리 에러 수 (counter)
pub const DASHBOARD_QUERY_ERRORS_TOTAL: &str = "logalyzer_dashboard_query_errors_total";

/// Dashboard: 요청 처리 시간 (histogram, 초, label: endpoint)
pub const DASHBOARD_REQUEST_DURATION_SECONDS: &str =
    "logalyzer_dashboard_request_duration_seconds";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "logalyzer_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "logalyzer_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 처리 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (수집 1회는 압축 파일 전체를 읽을 수 있음)
pub const DURATION_BUCKETS: [f64; 10] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `logalyzer-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Log Pipeline
    describe_counter!(
        LOG_PIPELINE_LINES_READ_TOTAL,
        "Total number of access log lines read from all files"
    );
    describe_counter!(
        LOG_PIPELINE_PARSE_ERRORS_TOTAL,
        "Total number of lines that did not match the line template"
    );
    describe_counter!(
        LOG_PIPELINE_RECORDS_EXCLUDED_TOTAL,
        "Total number of records dropped by request or remote ip exclusion"
    );
    describe_counter!(
        LOG_PIPELINE_FILE_ERRORS_TOTAL,
        "Total number of log file open or read failures"
    );
    describe_histogram!(
        LOG_PIPELINE_TICK_DURATION_SECONDS,
        "Time to complete a single collection pass in seconds"
    );
    describe_gauge!(
        LOG_PIPELINE_GEO_CACHE_SIZE,
        "Number of addresses held in the geolocation cache"
    );

    // Dataset
    describe_gauge!(DATASET_RECORDS, "Number of records held in the dataset");
    describe_counter!(
        DATASET_RECORDS_REJECTED_TOTAL,
        "Total number of records rejected for a schema mismatch"
    );
    describe_counter!(
        DATASET_SNAPSHOT_TIMEOUTS_TOTAL,
        "Total number of snapshot requests served from the previous snapshot"
    );

    // Enricher
    describe_gauge!(ENRICHERS_LOADED, "Number of active enrichment plugins");
    describe_counter!(
        ENRICHER_ERRORS_TOTAL,
        "Total number of enrichment plugin failures"
    );

    // Dashboard
    describe_counter!(
        DASHBOARD_REQUESTS_TOTAL,
        "Total number of dashboard HTTP requests per endpoint"
    );
    describe_counter!(
        DASHBOARD_QUERY_ERRORS_TOTAL,
        "Total number of dashboard queries that failed and returned an empty table"
    );
    describe_histogram!(
        DASHBOARD_REQUEST_DURATION_SECONDS,
        "Dashboard request latency in seconds"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Logalyzer daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
