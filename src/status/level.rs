use std::fmt;

use log::warn;

/// Stage of one operation session, from the submitting side and the scheduler's side
///
/// Levels are stored as integers and only their order matters to the submission logic:
/// anything at or above `Submitted` blocks a new submission, anything above `Inactive`
/// counts as active. Levels above `Submitted` are reported by the scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLevel {
    Unknown = 1,
    Inactive = 2,
    Registered = 3,
    Submitted = 4,
    Held = 5,
    Queued = 6,
    Active = 7,
    Error = 8,
}

impl StatusLevel {
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Integers that don't name a level read back as `Unknown`
    pub fn from_value(value: i64) -> StatusLevel {
        match value {
            1 => StatusLevel::Unknown,
            2 => StatusLevel::Inactive,
            3 => StatusLevel::Registered,
            4 => StatusLevel::Submitted,
            5 => StatusLevel::Held,
            6 => StatusLevel::Queued,
            7 => StatusLevel::Active,
            8 => StatusLevel::Error,
            other => {
                warn!("Unrecognised status level {other}, treating as unknown");
                StatusLevel::Unknown
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StatusLevel::Unknown => "unknown",
            StatusLevel::Inactive => "inactive",
            StatusLevel::Registered => "registered",
            StatusLevel::Submitted => "submitted",
            StatusLevel::Held => "held",
            StatusLevel::Queued => "queued",
            StatusLevel::Active => "active",
            StatusLevel::Error => "error",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
