#![no_main]

use libfuzzer_sys::fuzz_target;
use logalyzer_dashboard::TimeWidth;
use logalyzer_dashboard::width::parse_timestamp;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(width) = TimeWidth::parse(input) {
            assert!(width.seconds() > 0);
        }
        let _ = parse_timestamp(input);
    }
});
