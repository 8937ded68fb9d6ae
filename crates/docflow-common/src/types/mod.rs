//! Common types used across docflow

use crate::dates::parse_source_timestamp;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and modification times of a fetched artifact.
///
/// Both bounds are set together: either the content stream had at least one
/// timestamp, or it was empty and both are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Earliest event observed in the artifact
    pub created_at: Option<DateTime<Utc>>,

    /// Latest event observed in the artifact
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileMeta {
    /// Metadata for an artifact without any timestamped content
    pub fn empty() -> Self {
        Self {
            created_at: None,
            modified_at: None,
        }
    }

    /// Build the window from raw source timestamps, in any order
    pub fn from_timestamps<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut window: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

        for ts in raw {
            let ts = parse_source_timestamp(ts.as_ref())?;
            window = Some(match window {
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                None => (ts, ts),
            });
        }

        Ok(match window {
            Some((created, modified)) => Self {
                created_at: Some(created),
                modified_at: Some(modified),
            },
            None => Self::empty(),
        })
    }

    /// Whether the artifact carried no timestamps at all
    pub fn is_empty(&self) -> bool {
        self.created_at.is_none()
    }
}
