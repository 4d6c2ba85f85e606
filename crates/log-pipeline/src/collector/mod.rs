//! 로그 수집 모듈 -- 액세스 로그 파일을 주기적으로 폴링하여 새 라인을 수집합니다.
//!
//! # 구성
//! - [`FileCursor`]: 파일별 읽기 위치
//! - [`source`]: 대상 파일 목록 구성, 일반/gzip 증분 읽기
//! - [`Collector`]: 한 번의 수집 주기(`tick`)를 수행
//! - [`worker`]: 전용 `collector` 스레드에서 주기적으로 `tick`을 실행
//!
//! # 아키텍처
//! 수집은 단일 스레드에서 동기적으로 수행됩니다. 파일을 읽는 도중에는
//! 중단하지 않고, 정지 요청은 각 주기의 시작에서만 확인합니다.

pub mod cursor;
pub mod source;
pub mod worker;

pub use cursor::FileCursor;
pub use worker::{CollectorHandle, spawn_collector};

use std::path::PathBuf;
use std::time::Instant;

use logalyzer_core::metrics as m;
use tracing::{debug, error, info};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::pipeline::{LineOutcome, LogPipeline};

/// 한 번의 수집 주기 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 읽은 파일 수
    pub files: usize,
    /// 읽은 라인 수 (빈 라인 제외)
    pub lines: usize,
    /// 데이터셋에 추가된 레코드 수
    pub appended: usize,
    /// 파싱 실패 라인 수
    pub parse_errors: usize,
    /// 제외된 라인 수
    pub excluded: usize,
    /// 스키마 불일치로 거부된 레코드 수
    pub rejected: usize,
}

impl TickReport {
    fn record(&mut self, outcome: LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::Appended => self.appended += 1,
            LineOutcome::ParseError => self.parse_errors += 1,
            LineOutcome::Excluded => self.excluded += 1,
            LineOutcome::Rejected => self.rejected += 1,
        }
    }
}

/// 파일 수집기
pub struct Collector {
    log_path: PathBuf,
    log_filter: Option<String>,
    cursor: FileCursor,
    pipeline: LogPipeline,
}

impl Collector {
    /// 수집기를 생성합니다.
    ///
    /// 수집 경로가 파일도 디렉토리도 아니면 에러를 반환합니다.
    pub fn new(config: &PipelineConfig, pipeline: LogPipeline) -> Result<Self, LogPipelineError> {
        if !config.log_path.is_file() && !config.log_path.is_dir() {
            return Err(LogPipelineError::LogPathNotFound(
                config.log_path.display().to_string(),
            ));
        }
        Ok(Self {
            log_path: config.log_path.clone(),
            log_filter: config.log_filter.clone(),
            cursor: FileCursor::new(),
            pipeline,
        })
    }

    /// 수집 주기 한 번을 수행합니다.
    ///
    /// 파일 하나의 읽기 실패는 그 파일만 건너뜁니다. 실패 전까지 처리한
    /// 라인의 끝으로 오프셋을 옮기고, 나머지는 다음 주기에 다시 시도합니다.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        let files = match source::candidate_files(&self.log_path, self.log_filter.as_deref()) {
            Ok(files) => files,
            Err(e) => {
                error!(path = %self.log_path.display(), error = %e, "cannot list log files");
                metrics::counter!(m::LOG_PIPELINE_FILE_ERRORS_TOTAL).increment(1);
                return report;
            }
        };

        for file in files {
            debug!(path = %file.display(), "parsing log file");
            let offset = self.cursor.get(&file);
            let pipeline = &mut self.pipeline;
            let result = source::read_new_lines(&file, offset, |line| {
                report.record(pipeline.process_line(line));
            });
            match result {
                Ok(new_offset) => {
                    self.cursor.set(file, new_offset);
                    report.files += 1;
                }
                Err(failure) => {
                    error!(
                        path = %file.display(),
                        error = %failure.error,
                        offset = failure.offset,
                        "error reading log file, skipping"
                    );
                    metrics::counter!(m::LOG_PIPELINE_FILE_ERRORS_TOTAL).increment(1);
                    // 이미 전달된 라인은 다시 읽지 않습니다
                    if failure.offset != offset {
                        self.cursor.set(file, failure.offset);
                    }
                }
            }
        }

        metrics::counter!(m::LOG_PIPELINE_LINES_READ_TOTAL).increment(report.lines as u64);
        metrics::histogram!(m::LOG_PIPELINE_TICK_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(
            files = report.files,
            lines = report.lines,
            appended = report.appended,
            parse_errors = report.parse_errors,
            excluded = report.excluded,
            rejected = report.rejected,
            "collector tick finished"
        );
        report
    }

    /// 파일별 읽기 위치
    pub fn cursor(&self) -> &FileCursor {
        &self.cursor
    }

    /// 내부 파이프라인
    pub fn pipeline(&self) -> &LogPipeline {
        &self.pipeline
    }
}
