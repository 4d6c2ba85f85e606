#![no_main]

use libfuzzer_sys::fuzz_target;
use logalyzer_core::config::{DEFAULT_DATETIME_FORMAT, DEFAULT_LINE_FORMAT};
use logalyzer_log_pipeline::AccessLogParser;

fuzz_target!(|data: &[u8]| {
    // 수집기는 손실 변환된 라인을 넘깁니다
    let line = String::from_utf8_lossy(data);
    if let Ok(parser) = AccessLogParser::new(DEFAULT_LINE_FORMAT, DEFAULT_DATETIME_FORMAT) {
        let _ = parser.parse(&line);
    }
});
