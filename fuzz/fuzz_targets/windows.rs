#![no_main]
use libfuzzer_sys::fuzz_target;
use rendezvous_libs::{
    compute_top_windows, occupancy::compute_occupancy, Availability, TimeRange, Weekday,
};
use std::collections::BTreeMap;

fuzz_target!(|data: (Vec<Weekday>, Vec<TimeRange>, BTreeMap<u8, Vec<(Weekday, TimeRange)>>, u8)| {
    // searching for inputs that break the window invariants
    #[cfg(feature = "log")]
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let (days, ranges, users, n) = data;
    let n = usize::from(n % 8);

    let mut availability = Availability::new();
    for (user, free) in users {
        let user_days = availability.entry(user.to_string()).or_default();
        for (day, range) in free {
            user_days.entry(day).or_default().push(range);
        }
    }

    let grid = compute_occupancy(&days, &ranges, &availability);
    let windows = compute_top_windows(&days, &ranges, &availability, n);

    assert!(windows.len() <= n, "{} windows returned for n = {}", windows.len(), n);
    assert!(
        windows.windows(2).all(|pair| pair[0].rank(&pair[1]).is_le()),
        "windows out of order"
    );

    for window in &windows {
        assert!(grid.days.contains(&window.day), "{} was not selected", window.day);
        assert!(window.attend_count() > 0, "empty window {}", window);
        assert_eq!(window.total_users(), availability.len());
        assert!(window.duration() > 0, "empty window {}", window);
        assert!(
            ranges.iter().any(|range| range.start() <= window.range.start())
                && ranges.iter().any(|range| window.range.end() <= range.end()),
            "{} outside of the candidate ranges",
            window
        );
    }
});
