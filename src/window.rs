use crate::meeting::{Availability, UserId, Weekday};
use crate::occupancy::{attendance, normalize_days, ticks};
use crate::time::{TimeOfDay, TimeRange};
use itertools::Itertools;
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// How many windows the summary shows
pub const DEFAULT_WINDOW_COUNT: usize = 4;

/// A contiguous stretch of one day where the same number of users are free
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptimalWindow {
    pub day: Weekday,
    pub range: TimeRange,
    pub attending: BTreeSet<UserId>,
    pub absent: BTreeSet<UserId>,
}

impl OptimalWindow {
    pub fn duration(&self) -> u16 {
        self.range.duration()
    }

    pub fn attend_count(&self) -> usize {
        self.attending.len()
    }

    pub fn total_users(&self) -> usize {
        self.attending.len() + self.absent.len()
    }

    /// Order windows are published in: most attendees, then longest
    /// Remaining ties go to the earlier day and start so ranking is stable
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .attend_count()
            .cmp(&self.attend_count())
            .then_with(|| other.duration().cmp(&self.duration()))
            .then_with(|| self.day.cmp(&other.day))
            .then_with(|| self.range.start().cmp(&other.range.start()))
    }
}

impl fmt::Display for OptimalWindow {
    /// "Monday 09:30–10:00 (2/3)"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}/{})",
            self.day,
            self.range,
            self.attend_count(),
            self.total_users()
        )
    }
}

struct TickAttendance<'a> {
    range: TimeRange,
    attending: BTreeSet<&'a str>,
}

/// Greedy merge of one day's occupied ticks into windows
///
/// Ticks are visited most-attended first. Each unvisited tick grows in both
/// directions through directly adjacent, unvisited ticks with the same head
/// count; attendance sets are unioned and every tick is used at most once.
fn day_windows(day: Weekday, ticks: &[TimeRange], availability: &Availability) -> Vec<OptimalWindow> {
    let slots = ticks
        .iter()
        .map(|range| TickAttendance {
            range: *range,
            attending: attendance(availability, day, range).collect(),
        })
        .filter(|slot| !slot.attending.is_empty())
        .collect_vec();

    let by_start: BTreeMap<TimeOfDay, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.range.start(), i))
        .collect();
    let by_end: BTreeMap<TimeOfDay, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.range.end(), i))
        .collect();

    let order = (0..slots.len()).sorted_by(|&a, &b| {
        slots[b]
            .attending
            .len()
            .cmp(&slots[a].attending.len())
            .then_with(|| slots[a].range.start().cmp(&slots[b].range.start()))
    });

    let mut consumed = vec![false; slots.len()];
    let mut windows = Vec::new();

    for seed in order {
        if consumed[seed] {
            continue;
        }
        consumed[seed] = true;

        let count = slots[seed].attending.len();
        let joins = |i: usize, consumed: &[bool]| !consumed[i] && slots[i].attending.len() == count;
        let mut members: BTreeSet<&str> = slots[seed].attending.clone();

        let mut first = seed;
        while let Some(&prev) = by_end.get(&slots[first].range.start()) {
            if !joins(prev, &consumed[..]) {
                break;
            }
            consumed[prev] = true;
            members.extend(&slots[prev].attending);
            first = prev;
        }

        let mut last = seed;
        while let Some(&next) = by_start.get(&slots[last].range.end()) {
            if !joins(next, &consumed[..]) {
                break;
            }
            consumed[next] = true;
            members.extend(&slots[next].attending);
            last = next;
        }

        let attending: BTreeSet<UserId> = members.into_iter().map(str::to_string).collect();
        let absent = availability
            .keys()
            .filter(|user| !attending.contains(*user))
            .cloned()
            .collect();

        let window = OptimalWindow {
            day,
            range: TimeRange::new(slots[first].range.start(), slots[last].range.end()),
            attending,
            absent,
        };
        trace!("window {}", window);
        windows.push(window);
    }

    windows
}

/// Sorts by `OptimalWindow::rank` and keeps the first `n`
pub fn rank_windows(mut windows: Vec<OptimalWindow>, n: usize) -> Vec<OptimalWindow> {
    windows.sort_by(OptimalWindow::rank);
    windows.truncate(n);
    windows
}

/// Best `n` windows to hold the meeting in, across every selected day
///
/// # Examples
/// ```
/// use rendezvous_libs::{
///     meeting::{Availability, Weekday},
///     time::TimeRange,
///     window::compute_top_windows,
/// };
///
/// let mut availability = Availability::new();
/// availability
///     .entry("u1".to_string())
///     .or_default()
///     .insert(Weekday::Monday, vec![TimeRange::parse("09:00", "10:00").unwrap()]);
///
/// let windows = compute_top_windows(
///     &[Weekday::Monday],
///     &[TimeRange::parse("09:00", "11:00").unwrap()],
///     &availability,
///     4,
/// );
///
/// assert_eq!(windows.len(), 1);
/// assert_eq!(windows[0].to_string(), "Monday 09:00–10:00 (1/1)");
/// ```
pub fn compute_top_windows(
    days: &[Weekday],
    ranges: &[TimeRange],
    availability: &Availability,
    n: usize,
) -> Vec<OptimalWindow> {
    let days = normalize_days(days);
    let ticks = ticks(ranges);

    #[cfg(feature = "rayon")]
    let windows: Vec<OptimalWindow> = days
        .par_iter()
        .flat_map_iter(|&day| day_windows(day, &ticks, availability))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let windows: Vec<OptimalWindow> = days
        .iter()
        .flat_map(|&day| day_windows(day, &ticks, availability))
        .collect();

    debug!("{} candidate windows over {} days", windows.len(), days.len());

    rank_windows(windows, n)
}
