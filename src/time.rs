use crate::data::ValidationError;
use core::fmt;
use core::str::FromStr;
use num::Integer;

/// Length of a single slot, in minutes
pub const QUARTER_HOUR: u16 = 15;

const MINUTES_PER_HOUR: u16 = 60;
const LAST_MINUTE: u16 = 24 * MINUTES_PER_HOUR - 1;

/// Minutes since midnight, on [0, 1440]
/// 1440 is the end-of-day sentinel "24:00" and is never the same as "00:00"
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(LAST_MINUTE + 1);

    /// Returns `None` for anything past "24:00"
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::TimeOfDay;
    ///
    /// assert_eq!(TimeOfDay::new(1440), Some(TimeOfDay::END_OF_DAY));
    /// assert_eq!(TimeOfDay::new(1441), None);
    /// ```
    pub fn new(minutes: u16) -> Option<TimeOfDay> {
        if minutes <= Self::END_OF_DAY.0 {
            Some(TimeOfDay(minutes))
        } else {
            None
        }
    }

    /// Wall-clock constructor for literals
    ///
    /// # Panics
    /// If the result would be past "24:00"
    pub const fn at(hours: u16, minutes: u16) -> TimeOfDay {
        let total = hours * MINUTES_PER_HOUR + minutes;
        assert!(total <= LAST_MINUTE + 1, "time of day out of range");
        TimeOfDay(total)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn is_end_of_day(self) -> bool {
        self == Self::END_OF_DAY
    }

    pub fn is_on_the_hour(self) -> bool {
        Integer::is_multiple_of(&self.0, &MINUTES_PER_HOUR)
    }

    pub fn is_on_the_half_hour(self) -> bool {
        Integer::is_multiple_of(&self.0, &(MINUTES_PER_HOUR / 2))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes) = Integer::div_rem(&self.0, &MINUTES_PER_HOUR);
        write!(f, "{:02}:{:02}", hours, minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time(s)
    }
}

/// Parses a 24-hour `H:MM` / `HH:MM` wall-clock time, or the literal `24:00`
///
/// # Examples
/// ```
/// use rendezvous_libs::time::{parse_time, TimeOfDay};
///
/// assert_eq!(parse_time("09:30").unwrap().minutes(), 570);
/// assert_eq!(parse_time("9:30").unwrap().minutes(), 570);
/// assert_eq!(parse_time("24:00").unwrap(), TimeOfDay::END_OF_DAY);
/// assert!(parse_time("24:01").is_err());
/// assert!(parse_time("12:5").is_err());
/// ```
pub fn parse_time(s: &str) -> Result<TimeOfDay, ValidationError> {
    let s = s.trim();
    if s == "24:00" {
        return Ok(TimeOfDay::END_OF_DAY);
    }

    let invalid = || ValidationError::InvalidFormat(s.to_string());

    let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
    if !(1..=2).contains(&hours.len())
        || minutes.len() != 2
        || !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let hours: u16 = hours.parse().map_err(|_| invalid())?;
    let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes >= MINUTES_PER_HOUR {
        return Err(invalid());
    }

    Ok(TimeOfDay(hours * MINUTES_PER_HOUR + minutes))
}

/// Inverse of `parse_time`; the end-of-day sentinel renders as `24:00`
pub fn format_time(time: TimeOfDay) -> String {
    time.to_string()
}

/// Rounds half-up to the nearest quarter hour
///
/// Anything that would round up to midnight of the next day is clamped to
/// 23:59 instead. The `24:00` sentinel itself is left alone.
///
/// # Examples
/// ```
/// use rendezvous_libs::time::{round_to_quarter_hour, TimeOfDay};
///
/// assert_eq!(round_to_quarter_hour(TimeOfDay::at(9, 7)), TimeOfDay::at(9, 0));
/// assert_eq!(round_to_quarter_hour(TimeOfDay::at(9, 8)), TimeOfDay::at(9, 15));
/// assert_eq!(round_to_quarter_hour(TimeOfDay::at(23, 55)), TimeOfDay::at(23, 59));
/// assert_eq!(round_to_quarter_hour(TimeOfDay::END_OF_DAY), TimeOfDay::END_OF_DAY);
/// ```
pub fn round_to_quarter_hour(time: TimeOfDay) -> TimeOfDay {
    if time.is_end_of_day() {
        return time;
    }

    let (quarters, rest) = Integer::div_rem(&time.0, &QUARTER_HOUR);
    let quarters = if rest * 2 >= QUARTER_HOUR {
        quarters + 1
    } else {
        quarters
    };

    TimeOfDay((quarters * QUARTER_HOUR).min(LAST_MINUTE))
}

/// Half-open [start, end) time range
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRange(pub TimeOfDay, pub TimeOfDay);

impl TimeRange {
    /// Construct a new Time Range
    /// Range is half-open on [start, end). No validation happens here, see
    /// `data::validate_range`
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::{TimeOfDay, TimeRange};
    ///
    /// let test = TimeRange::new(TimeOfDay::at(9, 0), TimeOfDay::at(10, 0));
    ///
    /// assert_eq!(test.start(), TimeOfDay::at(9, 0));
    /// assert_eq!(test.duration(), 60);
    /// ```
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> TimeRange {
        TimeRange(start, end)
    }

    /// The whole day, "00:00" to "24:00"
    pub fn all_day() -> TimeRange {
        TimeRange(TimeOfDay::MIDNIGHT, TimeOfDay::END_OF_DAY)
    }

    /// Parses both ends and rounds them to the nearest quarter hour, the form
    /// ranges are stored in
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::{TimeOfDay, TimeRange};
    ///
    /// let range = TimeRange::parse("9:05", "10:53").unwrap();
    /// assert_eq!(range, TimeRange::new(TimeOfDay::at(9, 0), TimeOfDay::at(11, 0)));
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<TimeRange, ValidationError> {
        Ok(TimeRange(
            round_to_quarter_hour(parse_time(start)?),
            round_to_quarter_hour(parse_time(end)?),
        ))
    }

    pub fn start(self) -> TimeOfDay {
        self.0
    }

    pub fn end(self) -> TimeOfDay {
        self.1
    }

    /// Minutes covered; zero for inverted ranges
    pub fn duration(self) -> u16 {
        self.1 .0.saturating_sub(self.0 .0)
    }

    pub fn is_all_day(self) -> bool {
        self == Self::all_day()
    }

    /// Strict half-open overlap. Touching endpoints do not overlap
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::TimeRange;
    ///
    /// let a = TimeRange::parse("00:00", "00:30").unwrap();
    /// let b = TimeRange::parse("00:30", "01:00").unwrap();
    /// let c = TimeRange::parse("00:15", "00:45").unwrap();
    ///
    /// assert!(!a.overlaps(&b));
    /// assert!(a.overlaps(&c));
    /// assert!(c.overlaps(&a));
    /// ```
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start() < other.end() && self.end() > other.start()
    }

    /// Whether `other` lies entirely inside this range
    pub fn covers(&self, other: &TimeRange) -> bool {
        self.start() <= other.start() && other.end() <= self.end()
    }

    /// Splits the range into quarter-hour slots. The final slot is cut short
    /// when the range does not end on a quarter hour
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::TimeRange;
    ///
    /// let slots: Vec<_> = TimeRange::parse("09:00", "09:45").unwrap().quarters().collect();
    /// assert_eq!(slots.len(), 3);
    /// assert_eq!(slots[2], TimeRange::parse("09:30", "09:45").unwrap());
    ///
    /// let slots: Vec<_> = TimeRange::parse("23:30", "23:59").unwrap().quarters().collect();
    /// assert_eq!(slots.last().unwrap().to_string(), "23:45–23:59");
    /// ```
    pub fn quarters(self) -> impl Iterator<Item = TimeRange> {
        let end = self.end().0;
        (self.start().0..end)
            .step_by(QUARTER_HOUR as usize)
            .map(move |t| TimeRange(TimeOfDay(t), TimeOfDay((t + QUARTER_HOUR).min(end))))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.0, self.1)
    }
}

pub trait Overlapping {
    fn has_overlap_with(self, candidate: &TimeRange) -> bool;
}

impl<'a, T> Overlapping for T
where
    T: IntoIterator<Item = &'a TimeRange>,
{
    /// Linear scan of self for anything overlapping `candidate`
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::time::{Overlapping, TimeRange};
    ///
    /// let existing = vec![TimeRange::parse("09:00", "10:00").unwrap()];
    ///
    /// assert!(existing.iter().has_overlap_with(&TimeRange::parse("09:30", "10:30").unwrap()));
    /// assert!(!existing.iter().has_overlap_with(&TimeRange::parse("10:00", "10:30").unwrap()));
    /// ```
    fn has_overlap_with(self, candidate: &TimeRange) -> bool {
        self.into_iter().any(|range| range.overlaps(candidate))
    }
}

/// Free-function form of `Overlapping::has_overlap_with`
pub fn has_overlap_with_any(candidate: &TimeRange, existing: &[TimeRange]) -> bool {
    existing.iter().has_overlap_with(candidate)
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for TimeOfDay {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(TimeOfDay(u.int_in_range(0..=TimeOfDay::END_OF_DAY.0)?))
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for TimeRange {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let start = u.arbitrary::<TimeOfDay>()?;
        let end = u.int_in_range(start.0..=TimeOfDay::END_OF_DAY.0)?;
        Ok(TimeRange(
            round_to_quarter_hour(start),
            round_to_quarter_hour(TimeOfDay(end)),
        ))
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::{TimeOfDay, TimeRange};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for TimeOfDay {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for TimeOfDay {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(de::Error::custom)
        }
    }

    #[derive(Serialize)]
    struct RangeObject {
        start: TimeOfDay,
        end: TimeOfDay,
    }

    /// Candidate ranges are stored as `{start, end}` objects and user ranges
    /// as `[start, end]` pairs; both read back into a `TimeRange`
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RangeRepr {
        Object { start: TimeOfDay, end: TimeOfDay },
        Pair(TimeOfDay, TimeOfDay),
    }

    impl Serialize for TimeRange {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            RangeObject {
                start: self.start(),
                end: self.end(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for TimeRange {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            Ok(match RangeRepr::deserialize(deserializer)? {
                RangeRepr::Object { start, end } | RangeRepr::Pair(start, end) => {
                    TimeRange(start, end)
                }
            })
        }
    }
}
