use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::time::{format_time, hhmm, parse_time};
use crate::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    #[default]
    Pending,
    Approved,
    Blocked,
}

impl DoctorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorStatus::Pending => "pending",
            DoctorStatus::Approved => "approved",
            DoctorStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Doctor profile, one per doctor-role user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub qualifications: String,
    pub experience: i32,
    pub fees: f64,
    #[serde(default, deserialize_with = "deserialize_stored_availability")]
    pub availability: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: DoctorStatus,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn is_bookable(&self) -> bool {
        self.status == DoctorStatus::Approved
    }
}

/// A doctor profile with the owning user's name and email filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub user: Option<UserSummary>,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

/// Hours assumed when availability only names a day.
pub const DEFAULT_DAY_START: (u32, u32) = (9, 0);
pub const DEFAULT_DAY_END: (u32, u32) = (17, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        DayOfWeek::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = AvailabilityError;

    /// Case-insensitive; accepts full names and three-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().trim_end_matches(':').to_lowercase();
        DayOfWeek::ALL
            .iter()
            .copied()
            .find(|day| {
                let name = day.name().to_lowercase();
                lowered == name || (lowered.len() == 3 && name.starts_with(&lowered))
            })
            .ok_or_else(|| AvailabilityError::UnknownDay(s.trim().to_string()))
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = AvailabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("Unknown day of week: {0}")]
    UnknownDay(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Availability on {day} must start before it ends ({start} - {end})")]
    EmptyWindow { day: DayOfWeek, start: String, end: String },

    #[error("Could not understand availability entry: {0}")]
    Unparseable(String),
}

/// Canonical availability: a weekday and the hours a doctor takes bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    pub fn new(day: DayOfWeek, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self, AvailabilityError> {
        if start_time >= end_time {
            return Err(AvailabilityError::EmptyWindow {
                day,
                start: format_time(&start_time),
                end: format_time(&end_time),
            });
        }
        Ok(Self { day, start_time, end_time })
    }

    pub fn full_day(day: DayOfWeek) -> Self {
        let (start_h, start_m) = DEFAULT_DAY_START;
        let (end_h, end_m) = DEFAULT_DAY_END;
        Self {
            day,
            start_time: NaiveTime::from_hms_opt(start_h, start_m, 0).unwrap_or(NaiveTime::MIN),
            end_time: NaiveTime::from_hms_opt(end_h, end_m, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Availability as clients and older records send it: either structured
/// windows, bare day names (possibly with hours), or one comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvailabilityInput {
    Entries(Vec<AvailabilityEntry>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvailabilityEntry {
    Window {
        day: String,
        #[serde(alias = "startTime")]
        start_time: String,
        #[serde(alias = "endTime")]
        end_time: String,
    },
    Day(String),
}

impl From<Vec<AvailabilityWindow>> for AvailabilityInput {
    fn from(windows: Vec<AvailabilityWindow>) -> Self {
        AvailabilityInput::Entries(
            windows
                .into_iter()
                .map(|window| AvailabilityEntry::Window {
                    day: window.day.name().to_string(),
                    start_time: format_time(&window.start_time),
                    end_time: format_time(&window.end_time),
                })
                .collect(),
        )
    }
}

impl AvailabilityInput {
    /// Strict normalization used on writes: any bad entry rejects the lot.
    pub fn normalize(&self) -> Result<Vec<AvailabilityWindow>, AvailabilityError> {
        let windows = self
            .entries()
            .into_iter()
            .map(|entry| entry.to_window())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(canonicalize(windows))
    }

    /// Lenient normalization used on reads: bad entries are dropped.
    pub fn normalize_lenient(&self) -> Vec<AvailabilityWindow> {
        let windows = self
            .entries()
            .into_iter()
            .filter_map(|entry| match entry.to_window() {
                Ok(window) => Some(window),
                Err(e) => {
                    warn!("Skipping stored availability entry: {}", e);
                    None
                }
            })
            .collect();
        canonicalize(windows)
    }

    fn entries(&self) -> Vec<AvailabilityEntry> {
        match self {
            AvailabilityInput::Entries(entries) => entries.clone(),
            AvailabilityInput::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| AvailabilityEntry::Day(part.to_string()))
                .collect(),
        }
    }
}

impl AvailabilityEntry {
    fn to_window(&self) -> Result<AvailabilityWindow, AvailabilityError> {
        match self {
            AvailabilityEntry::Window { day, start_time, end_time } => {
                let day: DayOfWeek = day.parse()?;
                AvailabilityWindow::new(day, parse_hhmm(start_time)?, parse_hhmm(end_time)?)
            }
            AvailabilityEntry::Day(text) => parse_day_entry(text),
        }
    }
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, AvailabilityError> {
    parse_time(raw).ok_or_else(|| AvailabilityError::InvalidTime(raw.trim().to_string()))
}

/// `"Monday"`, `"Monday 10:00-12:00"`, `"Mon: 10:00 to 12:00"`.
fn parse_day_entry(text: &str) -> Result<AvailabilityWindow, AvailabilityError> {
    let text = text.trim();
    let (day_part, hours_part) = match text.split_once(char::is_whitespace) {
        Some((day, rest)) => (day, rest.trim()),
        None => (text, ""),
    };
    let day: DayOfWeek = day_part.parse()?;

    if hours_part.is_empty() {
        return Ok(AvailabilityWindow::full_day(day));
    }

    let hours = hours_part.replace(" to ", "-");
    let (start, end) = hours
        .split_once('-')
        .ok_or_else(|| AvailabilityError::Unparseable(text.to_string()))?;
    AvailabilityWindow::new(day, parse_hhmm(start)?, parse_hhmm(end)?)
}

fn canonicalize(mut windows: Vec<AvailabilityWindow>) -> Vec<AvailabilityWindow> {
    windows.sort_by_key(|window| (window.day, window.start_time, window.end_time));
    windows.dedup();
    windows
}

fn deserialize_stored_availability<'de, D>(deserializer: D) -> Result<Vec<AvailabilityWindow>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<AvailabilityInput>::deserialize(deserializer)?;
    Ok(input.map(|input| input.normalize_lenient()).unwrap_or_default())
}
