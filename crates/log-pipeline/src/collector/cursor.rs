//! 파일별 읽기 위치 추적
//!
//! 프로세스 메모리에만 유지되며 재시작 시 처음부터 다시 구성됩니다.
//! gzip 파일의 위치는 압축 해제된 스트림 기준입니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 파일 경로 → 마지막으로 읽은 바이트 오프셋
#[derive(Debug, Clone, Default)]
pub struct FileCursor {
    offsets: HashMap<PathBuf, u64>,
}

impl FileCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록된 오프셋 (처음 보는 파일은 0)
    pub fn get(&self, path: &Path) -> u64 {
        self.offsets.get(path).copied().unwrap_or(0)
    }

    /// 오프셋을 기록합니다.
    pub fn set(&mut self, path: impl Into<PathBuf>, offset: u64) {
        self.offsets.insert(path.into(), offset);
    }

    /// 추적 중인 파일 수
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
