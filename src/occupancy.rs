use crate::meeting::{Availability, Weekday};
use crate::time::TimeRange;
use itertools::Itertools;
use log::debug;

/// Number of colour stops between "nobody" and "everybody"
pub const BUCKETS: usize = 11;

/// One row of the rendering timeline
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A quarter hour inside a candidate range. `first` / `last` mark the
    /// range boundaries
    Tick {
        range: TimeRange,
        first: bool,
        last: bool,
    },
    /// Separator between two candidate ranges that do not touch
    Gap,
}

/// Builds the timeline for `ranges`, sorted by start time. Empty and
/// inverted ranges are skipped
///
/// # Examples
/// ```
/// use rendezvous_libs::{occupancy::{timeline, Slot}, time::TimeRange};
///
/// let ranges = vec![
///     TimeRange::parse("13:00", "13:30").unwrap(),
///     TimeRange::parse("09:00", "09:30").unwrap(),
/// ];
/// let slots = timeline(&ranges);
///
/// assert_eq!(slots.len(), 5);
/// assert_eq!(slots[2], Slot::Gap);
/// assert!(matches!(slots[0], Slot::Tick { first: true, last: false, .. }));
/// assert!(matches!(slots[4], Slot::Tick { first: false, last: true, .. }));
/// ```
pub fn timeline(ranges: &[TimeRange]) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut previous: Option<TimeRange> = None;

    for range in ranges
        .iter()
        .filter(|range| range.start() < range.end())
        .sorted_by_key(|range| range.start())
    {
        if let Some(previous) = previous {
            if previous.end() != range.start() {
                slots.push(Slot::Gap);
            }
        }

        let ticks = range.quarters().collect_vec();
        let count = ticks.len();
        slots.extend(ticks.into_iter().enumerate().map(|(i, tick)| Slot::Tick {
            range: tick,
            first: i == 0,
            last: i + 1 == count,
        }));

        previous = Some(*range);
    }

    slots
}

/// Every quarter-hour tick of `ranges`, in time order. Ticks shared by
/// overlapping ranges appear once
pub fn ticks(ranges: &[TimeRange]) -> Vec<TimeRange> {
    timeline(ranges)
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Tick { range, .. } => Some(range),
            Slot::Gap => None,
        })
        .sorted()
        .dedup()
        .collect()
}

/// Days in layout order, without repeats
pub fn normalize_days(days: &[Weekday]) -> Vec<Weekday> {
    days.iter().copied().sorted().dedup().collect()
}

/// Users with any range on `day` overlapping `slot`, in id order
pub fn attendance<'a>(
    availability: &'a Availability,
    day: Weekday,
    slot: &'a TimeRange,
) -> impl Iterator<Item = &'a str> + 'a {
    availability
        .iter()
        .filter(move |(_, days)| {
            days.get(&day)
                .map_or(false, |ranges| ranges.iter().any(|range| range.overlaps(slot)))
        })
        .map(|(user, _)| user.as_str())
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    pub count: usize,
    pub total: usize,
}

impl Occupancy {
    /// Share of users attending; zero when nobody has responded
    pub fn ratio(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count as f64 / self.total as f64
        }
    }

    /// Colour stop for this cell, `floor(ratio * BUCKETS)` kept below
    /// `BUCKETS`. Integer arithmetic, so equal inputs always land in the
    /// same bucket
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::occupancy::Occupancy;
    ///
    /// assert_eq!(Occupancy { count: 0, total: 0 }.bucket(), 0);
    /// assert_eq!(Occupancy { count: 1, total: 2 }.bucket(), 5);
    /// assert_eq!(Occupancy { count: 2, total: 2 }.bucket(), 10);
    /// ```
    pub fn bucket(self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.count * BUCKETS / self.total).min(BUCKETS - 1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Tick {
        range: TimeRange,
        first: bool,
        last: bool,
        /// One entry per grid column
        cells: Vec<Occupancy>,
    },
    Gap,
}

/// Slot-level occupancy for a meeting: columns are days, rows are the
/// timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    pub days: Vec<Weekday>,
    pub rows: Vec<Row>,
    pub total_users: usize,
}

impl OccupancyGrid {
    /// Nothing to lay out: no days or no candidate ranges
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() || self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Occupancy> {
        match self.rows.get(row)? {
            Row::Tick { cells, .. } => cells.get(column).copied(),
            Row::Gap => None,
        }
    }
}

/// Counts, for every day and every tick of the candidate ranges, how many
/// users are available
pub fn compute_occupancy(
    days: &[Weekday],
    ranges: &[TimeRange],
    availability: &Availability,
) -> OccupancyGrid {
    let days = normalize_days(days);
    let total_users = availability.len();

    if days.is_empty() || ranges.is_empty() {
        return OccupancyGrid {
            days,
            rows: vec![],
            total_users,
        };
    }

    let rows = timeline(ranges)
        .into_iter()
        .map(|slot| match slot {
            Slot::Gap => Row::Gap,
            Slot::Tick { range, first, last } => {
                assert!(
                    ranges.iter().any(|candidate| candidate.covers(&range)),
                    "slot {} outside of every candidate range",
                    range
                );

                let cells = days
                    .iter()
                    .map(|&day| Occupancy {
                        count: attendance(availability, day, &range).count(),
                        total: total_users,
                    })
                    .collect();

                Row::Tick {
                    range,
                    first,
                    last,
                    cells,
                }
            }
        })
        .collect_vec();

    debug!(
        "occupancy grid: {} days x {} rows, {} users",
        days.len(),
        rows.len(),
        total_users
    );

    OccupancyGrid {
        days,
        rows,
        total_users,
    }
}
