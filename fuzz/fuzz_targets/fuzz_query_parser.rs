#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use topic_search::query::{Identity, compile};

fuzz_target!(|data: &str| {
    // Any input either compiles or is a syntax error; nothing panics
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    if let Err(e) = compile(data, now, Some(Identity::new(1, None))) {
        assert!(e.is_syntax());
    }
});
