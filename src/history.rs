//! Bounded health score history
//!
//! Each athlete keeps the most recent health score snapshots, oldest first. Appending to
//! a full history evicts the oldest entry. Entries are not deduplicated by date: several
//! updates on the same day each leave their own snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of snapshots retained per athlete
pub const HISTORY_CAPACITY: usize = 10;

/// Score change (in points) between oldest and newest retained entries treated as flat
const TREND_DEAD_BAND: i16 = 3;

/// One health score snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub health_score: u8,
}

impl HistoryEntry {
    pub fn new(date: NaiveDate, health_score: u8) -> Self {
        HistoryEntry { date, health_score }
    }
}

/// Direction of the health score over the retained window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryTrend {
    Improving,
    Stable,
    Declining,
}

/// Immutable, capacity-bounded sequence of snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthHistory {
    entries: Vec<HistoryEntry>,
}

impl HealthHistory {
    /// History holding a single entry
    pub fn seeded(entry: HistoryEntry) -> Self {
        HealthHistory {
            entries: vec![entry],
        }
    }

    /// Return a new history with `entry` appended and the oldest entries dropped
    /// beyond [`HISTORY_CAPACITY`].
    ///
    /// An entry dated before the newest retained entry is recorded on the newest
    /// entry's date, so dates never go backwards.
    pub fn append(&self, entry: HistoryEntry) -> Self {
        let entry = match self.latest() {
            Some(last) if entry.date < last.date => HistoryEntry {
                date: last.date,
                ..entry
            },
            _ => entry,
        };

        let skip = (self.entries.len() + 1).saturating_sub(HISTORY_CAPACITY);
        let entries = self
            .entries
            .iter()
            .skip(skip)
            .copied()
            .chain(std::iter::once(entry))
            .collect();

        HealthHistory { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Compare the oldest and newest retained scores
    pub fn trend(&self) -> HistoryTrend {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) if self.entries.len() > 1 => {
                let change = i16::from(last.health_score) - i16::from(first.health_score);
                if change > TREND_DEAD_BAND {
                    HistoryTrend::Improving
                } else if change < -TREND_DEAD_BAND {
                    HistoryTrend::Declining
                } else {
                    HistoryTrend::Stable
                }
            }
            _ => HistoryTrend::Stable,
        }
    }
}
