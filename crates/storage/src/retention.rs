//! Age threshold after which fragments count as abandoned.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::StorageError;

/// A retention window such as `"-3 HOURS"` or `"90 minutes"`.
///
/// The optional leading `-` is accepted because windows are written relative
/// to now; it does not change the meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetentionWindow(Duration);

impl RetentionWindow {
    pub const DEFAULT: RetentionWindow = RetentionWindow(Duration::from_secs(3 * 60 * 60));

    pub fn new(age: Duration) -> Self {
        Self(age)
    }

    pub fn age(&self) -> Duration {
        self.0
    }

    /// Instant before which a file counts as stale.
    pub fn cutoff(&self, now: SystemTime) -> SystemTime {
        now.checked_sub(self.0).unwrap_or(SystemTime::UNIX_EPOCH)
    }

    pub fn is_stale(&self, modified: SystemTime, now: SystemTime) -> bool {
        modified < self.cutoff(now)
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_lowercase();
    let unit = unit.strip_suffix('s').unwrap_or(&unit);
    Some(match unit {
        "sec" | "second" => 1,
        "min" | "minute" => 60,
        "hour" => 60 * 60,
        "day" => 24 * 60 * 60,
        "week" => 7 * 24 * 60 * 60,
        _ => return None,
    })
}

impl FromStr for RetentionWindow {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidRetention(s.to_owned());

        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('-').unwrap_or(trimmed).trim_start();
        let mut parts = trimmed.split_whitespace();
        let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let amount: u64 = amount.parse().map_err(|_| invalid())?;
        let seconds = unit_seconds(unit)
            .and_then(|unit| unit.checked_mul(amount))
            .ok_or_else(invalid)?;
        Ok(Self(Duration::from_secs(seconds)))
    }
}

impl TryFrom<String> for RetentionWindow {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RetentionWindow> for String {
    fn from(window: RetentionWindow) -> Self {
        window.to_string()
    }
}

impl fmt::Display for RetentionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let (amount, unit) = [(604_800, "weeks"), (86_400, "days"), (3_600, "hours"), (60, "minutes")]
            .into_iter()
            .find(|(size, _)| secs != 0 && secs % size == 0)
            .map(|(size, unit)| (secs / size, unit))
            .unwrap_or((secs, "seconds"));
        write!(f, "-{amount} {unit}")
    }
}
