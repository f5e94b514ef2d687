// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Imported activity model and the summary handed to the prompt builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored activity record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Owner
    pub user_id: String,
    /// Sport type (Run, Ride, Swim, etc.)
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Distance in meters
    pub distance_meters: f64,
    /// Moving time in seconds
    pub duration_seconds: u64,
    /// Start time
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub date: DateTime<Utc>,
    /// Import source, e.g. "strava"
    #[serde(default)]
    pub source: String,
}

/// Most-recent-first snapshot of a user's activities.
#[derive(Debug, Clone, Default)]
pub struct ActivitySummary {
    activities: Vec<ActivityRecord>,
}

impl ActivitySummary {
    /// Wrap records, ordering them most recent first.
    pub fn new(mut activities: Vec<ActivityRecord>) -> Self {
        activities.sort_by(|a, b| b.date.cmp(&a.date));
        Self { activities }
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.activities.iter()
    }
}
