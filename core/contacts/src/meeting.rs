//! Meetings attached to a contact.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use peoplesync_common::{Error, Result};

/// Format of meeting times, e.g. `2017-11-02 14:30`.
pub const MEETING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A meeting scheduled with a contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Meeting {
    /// When the meeting takes place (local wall-clock time).
    pub time: NaiveDateTime,
    /// Short description of the meeting.
    pub title: String,
}

impl Meeting {
    /// Parse a meeting from its time text.
    ///
    /// # Errors
    /// - Returns a validation error if `time` is not `YYYY-MM-DD HH:MM`
    pub fn parse(time: &str, title: impl Into<String>) -> Result<Self> {
        let time = NaiveDateTime::parse_from_str(time.trim(), MEETING_TIME_FORMAT).map_err(|_| {
            Error::Validation("Time format should be YYYY-MM-DD HH:MM".to_string())
        })?;
        Ok(Self {
            time,
            title: title.into(),
        })
    }
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.time.format(MEETING_TIME_FORMAT), self.title)
    }
}
