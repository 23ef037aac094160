#![no_main]
use libfuzzer_sys::fuzz_target;
use rendezvous_libs::time::{format_time, parse_time, round_to_quarter_hour, TimeOfDay, TimeRange};

fuzz_target!(|data: (TimeOfDay, TimeRange, TimeRange, &str)| {
    let (time, a, b, raw) = data;

    assert_eq!(parse_time(&format_time(time)), Ok(time), "{} did not survive formatting", time);

    let rounded = round_to_quarter_hour(time);
    assert_eq!(round_to_quarter_hour(rounded), rounded, "rounding {} is not idempotent", time);

    assert_eq!(a.overlaps(&b), b.overlaps(&a), "overlap of {} and {} is not symmetric", a, b);
    if a.end() <= b.start() || b.end() <= a.start() {
        assert!(!a.overlaps(&b), "{} and {} only touch", a, b);
    }

    for tick in a.quarters() {
        assert!(a.covers(&tick), "{} escapes {}", tick, a);
    }

    // anything that parses formats back to a canonical time
    if let Ok(parsed) = parse_time(raw) {
        assert_eq!(parse_time(&format_time(parsed)), Ok(parsed));
    }
});
