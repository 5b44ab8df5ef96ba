use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Name of a snapshot directory: `{year}-{month}-{day}-{sequence}`.
///
/// Month and day are written without zero padding (`2025-6-4-1`), and the
/// sequence starts at 1 for each calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName {
    pub date: NaiveDate,
    pub sequence: u32,
}

impl SnapshotName {
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self { date, sequence }
    }

    /// Parse a directory name. Anything that is not four dash-separated
    /// numbers forming a valid date and a sequence of at least 1 is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split('-');
        let year = parts.next()?.parse::<i32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let day = parts.next()?.parse::<u32>().ok()?;
        let sequence = parts.next()?.parse::<u32>().ok()?;
        if parts.next().is_some() || sequence == 0 {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(Self { date, sequence })
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.date.year(),
            self.date.month(),
            self.date.day(),
            self.sequence
        )
    }
}
