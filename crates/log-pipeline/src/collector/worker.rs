//! 수집 스레드 -- 정지 플래그와 condvar로 주기적 실행을 제어합니다.
//!
//! 정지 요청은 대기 중인 스레드를 즉시 깨웁니다. 진행 중인 `tick`은 끝까지 수행됩니다.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::info;

use super::Collector;
use crate::error::LogPipelineError;

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// 실행 중인 수집 스레드 핸들
pub struct CollectorHandle {
    signal: Arc<StopSignal>,
    thread: Option<JoinHandle<Collector>>,
}

/// `collector` 스레드에서 수집 루프를 시작합니다.
pub fn spawn_collector(
    collector: Collector,
    poll_interval: Duration,
) -> Result<CollectorHandle, LogPipelineError> {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = Arc::clone(&signal);

    let thread = std::thread::Builder::new()
        .name("collector".to_owned())
        .spawn(move || run(collector, &thread_signal, poll_interval))
        .map_err(|e| LogPipelineError::Thread(e.to_string()))?;

    info!(interval_secs = poll_interval.as_secs(), "collector thread started");
    Ok(CollectorHandle {
        signal,
        thread: Some(thread),
    })
}

fn run(mut collector: Collector, signal: &StopSignal, poll_interval: Duration) -> Collector {
    loop {
        if *signal.stopped.lock() {
            break;
        }

        collector.tick();

        let mut stopped = signal.stopped.lock();
        signal
            .wake
            .wait_while_for(&mut stopped, |stopped| !*stopped, poll_interval);
    }
    info!("collector thread stopped");
    collector
}

impl CollectorHandle {
    /// 정지를 요청합니다. 대기 중이면 즉시 깨어납니다.
    pub fn stop(&self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
    }

    /// 스레드가 아직 실행 중인지 확인합니다.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// 정지를 요청하고 스레드 종료를 기다립니다. 수집기를 돌려받습니다.
    pub fn join(mut self) -> Result<Collector, LogPipelineError> {
        self.stop();
        let thread = self
            .thread
            .take()
            .ok_or_else(|| LogPipelineError::Thread("already joined".to_owned()))?;
        thread
            .join()
            .map_err(|_| LogPipelineError::Thread("collector thread panicked".to_owned()))
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
