use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Calendar day in the reference timezone. Serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// One row per calendar day. A day with no stored row reads as
/// [`MedRecord::empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedRecord {
    pub date: DateKey,
    #[sqlx(rename = "had_morning_meds")]
    pub morning_given: bool,
    #[sqlx(rename = "had_evening_meds")]
    pub evening_given: bool,
}

impl MedRecord {
    pub fn empty(date: DateKey) -> Self {
        Self {
            date,
            morning_given: false,
            evening_given: false,
        }
    }

    pub fn is_given(&self, period: MedPeriod) -> bool {
        match period {
            MedPeriod::Morning => self.morning_given,
            MedPeriod::Evening => self.evening_given,
        }
    }

    /// Apply a patch; fields left as `None` keep their current value.
    pub fn apply(&mut self, flags: MedFlags) {
        if let Some(v) = flags.morning_given {
            self.morning_given = v;
        }
        if let Some(v) = flags.evening_given {
            self.evening_given = v;
        }
    }

    pub fn status(&self) -> DoseStatus {
        match (self.morning_given, self.evening_given) {
            (false, false) => DoseStatus::Absent,
            (true, false) => DoseStatus::MorningOnly,
            (false, true) => DoseStatus::EveningOnly,
            (true, true) => DoseStatus::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Absent,
    MorningOnly,
    EveningOnly,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedPeriod {
    Morning,
    Evening,
}

impl MedPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedPeriod::Morning => "morning",
            MedPeriod::Evening => "evening",
        }
    }
}

impl fmt::Display for MedPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedPeriod {
    type Err = AppError;

    /// Exact literals only: `"Morning"` or `" morning"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(MedPeriod::Morning),
            "evening" => Ok(MedPeriod::Evening),
            _ => Err(AppError::Validation("Invalid medication type".into())),
        }
    }
}

/// Per-field write. `None` means "leave the stored value alone", which lets
/// the store update one flag without reading the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MedFlags {
    pub morning_given: Option<bool>,
    pub evening_given: Option<bool>,
}

impl MedFlags {
    pub fn set(period: MedPeriod, value: bool) -> Self {
        match period {
            MedPeriod::Morning => Self {
                morning_given: Some(value),
                evening_given: None,
            },
            MedPeriod::Evening => Self {
                morning_given: None,
                evening_given: Some(value),
            },
        }
    }

    pub fn given(period: MedPeriod) -> Self {
        Self::set(period, true)
    }

    pub fn reset(period: MedPeriod) -> Self {
        Self::set(period, false)
    }
}
