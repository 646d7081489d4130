//! Read filters for buffer snapshots
//!
//! # Filter Logic
//!
//! - All predicates are optional (None = match all)
//! - Different predicates are AND'd
//! - `offset` and `limit` paginate the filtered, newest-first result
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use spotlight_buffer::ReadFilter;
//!
//! // Envelopes from the last minute touching app.js, first page of 20
//! let filter = ReadFilter::all()
//!     .with_time_window(Duration::from_secs(60))
//!     .with_filename("app.js")
//!     .with_limit(20);
//! ```

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use spotlight_envelope::Uuid;

/// Snapshot filter for [`EnvelopeBuffer::read`](crate::EnvelopeBuffer::read)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadFilter {
    /// Maximum age of an item (None = any age)
    pub time_window: Option<Duration>,
    /// Exact envelope identity
    pub envelope_id: Option<Uuid>,
    /// Filename suffix matched through the filename index
    pub filename: Option<String>,
    /// Page size (None = unbounded)
    pub limit: Option<usize>,
    /// Items to skip before the page starts
    pub offset: usize,
}

impl ReadFilter {
    /// Filter matching every buffered item
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_time_window(mut self, window: Duration) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_envelope_id(mut self, id: Uuid) -> Self {
        self.envelope_id = Some(id);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Oldest insertion time still inside the window
    pub(crate) fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = TimeDelta::from_std(self.time_window?).ok()?;
        now.checked_sub_signed(window)
    }

    /// Check a single item
    ///
    /// `file_ids` is the set resolved from the filename index when a
    /// filename predicate is present.
    pub(crate) fn matches(
        &self,
        id: Uuid,
        inserted_at: DateTime<Utc>,
        cutoff: Option<DateTime<Utc>>,
        file_ids: Option<&HashSet<Uuid>>,
    ) -> bool {
        if let Some(cutoff) = cutoff
            && inserted_at < cutoff
        {
            return false;
        }

        if let Some(wanted) = self.envelope_id
            && wanted != id
        {
            return false;
        }

        if let Some(ids) = file_ids
            && !ids.contains(&id)
        {
            return false;
        }

        true
    }

    /// Apply offset and limit to a filtered result
    pub(crate) fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let page = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
