use crate::data::{ValidationError, ValidationPolicy};
use crate::meeting::{Meeting, Weekday};
use crate::time::TimeRange;
use log::debug;
use std::collections::BTreeSet;
use std::{fmt, mem};
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    SelectingDays,
    AddingRanges,
    SettingDetails,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::SelectingDays => "selecting days",
            Stage::AddingRanges => "adding time ranges",
            Stage::SettingDetails => "setting details",
            Stage::Done => "done",
        })
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SessionError {
    #[error("Expected the session to be {expected}, but it is {found}")]
    WrongState { expected: Stage, found: Stage },
    #[error("Select at least one day")]
    NoDaysSelected,
    #[error("Add at least one time range")]
    NoRanges,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Step-by-step creation of a `Meeting`: pick days, add candidate ranges,
/// then optionally title it. A failed step leaves the session as it was
///
/// # Examples
/// ```
/// use rendezvous_libs::{
///     data::ValidationPolicy,
///     meeting::Weekday,
///     session::{SessionError, SetupSession, Stage},
/// };
///
/// let policy = ValidationPolicy::default();
/// let mut session = SetupSession::new();
///
/// for day in [Weekday::Sunday, Weekday::Saturday] {
///     session.toggle_day(day).unwrap();
/// }
/// session.confirm_days().unwrap();
///
/// session.add_range("9:00", "12:00", &policy).unwrap();
/// assert!(matches!(
///     session.add_range("11:00", "13:00", &policy),
///     Err(SessionError::Invalid(_))
/// ));
/// session.finish_ranges().unwrap();
/// session.set_details(Some("Standup".to_string()), None).unwrap();
///
/// assert_eq!(session.stage(), Stage::Done);
/// let meeting = session.into_meeting().unwrap();
/// assert_eq!(meeting.selected_days.len(), 5);
/// assert_eq!(meeting.ranges.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupSession {
    SelectingDays {
        days: BTreeSet<Weekday>,
    },
    AddingRanges {
        days: BTreeSet<Weekday>,
        ranges: Vec<TimeRange>,
    },
    SettingDetails {
        days: BTreeSet<Weekday>,
        ranges: Vec<TimeRange>,
    },
    Done(Meeting),
}

impl Default for SetupSession {
    fn default() -> Self {
        SetupSession::new()
    }
}

impl SetupSession {
    /// Starts with every day of the week selected
    pub fn new() -> Self {
        SetupSession::SelectingDays {
            days: Weekday::ALL.into_iter().collect(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            SetupSession::SelectingDays { .. } => Stage::SelectingDays,
            SetupSession::AddingRanges { .. } => Stage::AddingRanges,
            SetupSession::SettingDetails { .. } => Stage::SettingDetails,
            SetupSession::Done(_) => Stage::Done,
        }
    }

    fn wrong_state(&self, expected: Stage) -> SessionError {
        SessionError::WrongState {
            expected,
            found: self.stage(),
        }
    }

    /// Flips `day` in or out of the selection. Returns whether it is now
    /// selected
    pub fn toggle_day(&mut self, day: Weekday) -> Result<bool, SessionError> {
        match self {
            SetupSession::SelectingDays { days } => {
                if days.remove(&day) {
                    Ok(false)
                } else {
                    days.insert(day);
                    Ok(true)
                }
            }
            _ => Err(self.wrong_state(Stage::SelectingDays)),
        }
    }

    pub fn confirm_days(&mut self) -> Result<(), SessionError> {
        match self {
            SetupSession::SelectingDays { days } if days.is_empty() => Err(SessionError::NoDaysSelected),
            SetupSession::SelectingDays { days } => {
                let days = mem::take(days);
                debug!("setup: {} days selected", days.len());
                *self = SetupSession::AddingRanges {
                    days,
                    ranges: Vec::new(),
                };
                Ok(())
            }
            _ => Err(self.wrong_state(Stage::SelectingDays)),
        }
    }

    /// Parses, rounds and validates a candidate range before appending it.
    /// Returns the range as stored
    pub fn add_range(
        &mut self,
        start: &str,
        end: &str,
        policy: &ValidationPolicy,
    ) -> Result<TimeRange, SessionError> {
        match self {
            SetupSession::AddingRanges { ranges, .. } => {
                let range = TimeRange::parse(start, end)?;
                policy.validate(&range, ranges)?;
                ranges.push(range);
                debug!("setup: added range {}", range);
                Ok(range)
            }
            _ => Err(self.wrong_state(Stage::AddingRanges)),
        }
    }

    pub fn finish_ranges(&mut self) -> Result<(), SessionError> {
        match self {
            SetupSession::AddingRanges { ranges, .. } if ranges.is_empty() => Err(SessionError::NoRanges),
            SetupSession::AddingRanges { days, ranges } => {
                *self = SetupSession::SettingDetails {
                    days: mem::take(days),
                    ranges: mem::take(ranges),
                };
                Ok(())
            }
            _ => Err(self.wrong_state(Stage::AddingRanges)),
        }
    }

    /// Blank strings count as unset
    pub fn set_details(
        &mut self,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<(), SessionError> {
        let non_blank = |text: Option<String>| text.filter(|text| !text.trim().is_empty());

        match self {
            SetupSession::SettingDetails { days, ranges } => {
                let mut meeting = Meeting::new(mem::take(days), mem::take(ranges));
                meeting.title = non_blank(title);
                meeting.description = non_blank(description);

                debug!(
                    "setup: done, {} days x {} ranges",
                    meeting.selected_days.len(),
                    meeting.ranges.len()
                );
                *self = SetupSession::Done(meeting);
                Ok(())
            }
            _ => Err(self.wrong_state(Stage::SettingDetails)),
        }
    }

    pub fn meeting(&self) -> Option<&Meeting> {
        match self {
            SetupSession::Done(meeting) => Some(meeting),
            _ => None,
        }
    }

    pub fn into_meeting(self) -> Result<Meeting, SessionError> {
        match self {
            SetupSession::Done(meeting) => Ok(meeting),
            other => Err(other.wrong_state(Stage::Done)),
        }
    }
}
