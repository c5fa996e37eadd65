use chrono::{DateTime, Months, Utc};

use crate::models::{keys, ValidationError};

/// An inclusive window over creation timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreatedRange {
    /// Creates a new range, validating that start <= end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// The window reaching `months` back from `now`.
    pub fn last_months(now: DateTime<Utc>, months: u32) -> Self {
        let start = now
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    /// Bounds formatted the way `CreatedAt` is persisted.
    pub fn bounds(&self) -> (String, String) {
        (keys::timestamp(self.start), keys::timestamp(self.end))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}
