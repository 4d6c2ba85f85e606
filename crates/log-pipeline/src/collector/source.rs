//! 로그 파일 목록 구성과 증분 읽기
//!
//! - 일반 파일: 기록된 오프셋이 현재 크기보다 크면 잘린 것으로 보고 0부터 다시 읽습니다.
//!   줄바꿈으로 끝난 라인만 소비하므로 쓰는 중인 마지막 라인은 다음 주기에 다시 읽습니다.
//! - gzip 파일(이름이 `gz`로 끝남): 압축을 풀며 오프셋만큼 버린 뒤 읽습니다.
//!   잘리지 않는다고 가정하며, 줄바꿈 없는 마지막 라인도 소비합니다.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tracing::info;

use crate::error::LogPipelineError;

/// 수집 대상 파일 목록을 만듭니다.
///
/// 경로가 파일이면 그 파일 하나, 디렉토리면 이름에 `filter`를 포함하는
/// 일반 파일 전체를 이름순으로 반환합니다.
pub fn candidate_files(path: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>, LogPipelineError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(LogPipelineError::LogPathNotFound(path.display().to_string()));
    }

    let entries = std::fs::read_dir(path).map_err(|e| file_access(path, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| file_access(path, &e))?;
        let candidate = entry.path();
        if !candidate.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if filter.is_none_or(|f| name.contains(f)) {
            files.push(candidate);
        }
    }
    files.sort();
    Ok(files)
}

/// gzip 파일 여부 (파일명 기준)
pub fn is_gzip(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with("gz"))
}

fn file_access(path: &Path, err: &io::Error) -> LogPipelineError {
    LogPipelineError::FileAccess {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// 읽기 도중 실패
///
/// `offset`은 실패 전까지 완전히 소비한 마지막 라인의 끝입니다.
/// 그 앞의 라인은 이미 전달되었으므로 커서를 여기까지 옮겨야 합니다.
#[derive(Debug)]
pub struct ReadFailure {
    /// 다음 주기에 이어 읽을 위치
    pub offset: u64,
    /// 원인
    pub error: LogPipelineError,
}

/// `offset` 이후의 새 라인을 읽어 `on_line`에 전달하고, 새 오프셋을 반환합니다.
///
/// 빈 라인은 건너뜁니다. 잘못된 UTF-8은 대체 문자로 바꿉니다.
pub fn read_new_lines(
    path: &Path,
    offset: u64,
    on_line: impl FnMut(&str),
) -> Result<u64, ReadFailure> {
    let file = File::open(path).map_err(|e| failure(path, offset, &e))?;
    if is_gzip(path) {
        read_gzip(path, file, offset, on_line)
    } else {
        read_plain(path, file, offset, on_line)
    }
}

fn failure(path: &Path, offset: u64, err: &io::Error) -> ReadFailure {
    ReadFailure {
        offset,
        error: file_access(path, err),
    }
}

fn read_plain(
    path: &Path,
    mut file: File,
    mut offset: u64,
    mut on_line: impl FnMut(&str),
) -> Result<u64, ReadFailure> {
    let size = file
        .metadata()
        .map_err(|e| failure(path, offset, &e))?
        .len();
    if offset > size {
        info!(path = %path.display(), offset, size, "log file truncated, reading from start");
        offset = 0;
    }
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| failure(path, offset, &e))?;

    let mut reader = BufReader::new(file);
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| failure(path, offset, &e))?;
        if n == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        offset += n as u64;
        emit(&buf, &mut on_line);
    }
    Ok(offset)
}

fn read_gzip(
    path: &Path,
    file: File,
    offset: u64,
    mut on_line: impl FnMut(&str),
) -> Result<u64, ReadFailure> {
    let mut reader = BufReader::new(MultiGzDecoder::new(BufReader::new(file)));
    let skipped = io::copy(&mut reader.by_ref().take(offset), &mut io::sink())
        .map_err(|e| failure(path, offset, &e))?;

    let mut position = skipped;
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        // 실패한 라인의 일부는 버리고 다음 주기에 다시 읽습니다
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| failure(path, position, &e))?;
        if n == 0 {
            break;
        }
        position += n as u64;
        emit(&buf, &mut on_line);
    }
    Ok(position)
}

fn emit(raw: &[u8], on_line: &mut impl FnMut(&str)) {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim_end_matches(['\n', '\r']);
    if !line.trim().is_empty() {
        on_line(line);
    }
}
