use crate::data::{ValidationError, ValidationPolicy};
use crate::render::RenderError;
use crate::time::TimeRange;
use crate::window::OptimalWindow;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Days a meeting can be held on, in the order they are laid out
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type UserId = String;

/// Every user's submitted ranges, per day. Sorted maps keep iteration order
/// independent of insertion order
pub type Availability = BTreeMap<UserId, BTreeMap<Weekday, Vec<TimeRange>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Meeting {
    pub selected_days: BTreeSet<Weekday>,
    pub ranges: Vec<TimeRange>,
    pub user_availability: Availability,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "embedTitle", skip_serializing_if = "Option::is_none")
    )]
    pub title: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "embedDesc", skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
}

impl Meeting {
    pub fn new<D>(selected_days: D, ranges: Vec<TimeRange>) -> Meeting
    where
        D: IntoIterator<Item = Weekday>,
    {
        Meeting {
            selected_days: selected_days.into_iter().collect(),
            ranges,
            ..Meeting::default()
        }
    }

    /// Selected days in layout order
    pub fn days(&self) -> Vec<Weekday> {
        self.selected_days.iter().copied().collect()
    }

    /// Adds a candidate range, leaving the meeting untouched if it is rejected
    ///
    /// # Examples
    /// ```
    /// use rendezvous_libs::{
    ///     data::{ValidationError, ValidationPolicy},
    ///     meeting::{Meeting, Weekday},
    ///     time::TimeRange,
    /// };
    ///
    /// let policy = ValidationPolicy::default();
    /// let mut meeting = Meeting::new(vec![Weekday::Monday], vec![]);
    ///
    /// meeting.add_range(TimeRange::parse("09:00", "10:00").unwrap(), &policy).unwrap();
    /// assert!(matches!(
    ///     meeting.add_range(TimeRange::parse("09:30", "10:30").unwrap(), &policy),
    ///     Err(ValidationError::OverlappingRange { .. })
    /// ));
    /// assert_eq!(meeting.ranges.len(), 1);
    /// ```
    pub fn add_range(
        &mut self,
        range: TimeRange,
        policy: &ValidationPolicy,
    ) -> Result<(), ValidationError> {
        policy.validate(&range, &self.ranges)?;
        self.ranges.push(range);
        Ok(())
    }

    /// Records `range` as free time for `user` on `day`. Only the user's own
    /// ranges for that day are checked for overlap
    pub fn add_availability(
        &mut self,
        user: &str,
        day: Weekday,
        range: TimeRange,
        policy: &ValidationPolicy,
    ) -> Result<(), ValidationError> {
        let existing = self
            .user_availability
            .get(user)
            .and_then(|days| days.get(&day))
            .map(Vec::as_slice)
            .unwrap_or_default();
        policy.validate(&range, existing)?;

        self.user_availability
            .entry(user.to_string())
            .or_default()
            .entry(day)
            .or_default()
            .push(range);

        debug!("{} is available {} {}", user, day, range);
        Ok(())
    }

    /// Number of users who have submitted anything
    pub fn respondents(&self) -> usize {
        self.user_availability.len()
    }

    pub fn top_windows(&self, n: usize) -> Vec<OptimalWindow> {
        crate::window::compute_top_windows(&self.days(), &self.ranges, &self.user_availability, n)
    }

    /// PNG heatmap of the current availability
    pub fn heatmap(&self) -> Result<Vec<u8>, RenderError> {
        crate::render::compute_heatmap(&self.days(), &self.ranges, &self.user_availability)
    }
}
