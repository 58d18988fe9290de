use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Commit-time bounds for one stat job; `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// One fully-resolved query unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatJob {
    pub label: String,
    pub repositories: Vec<String>,
    pub extensions: BTreeSet<String>,
    pub window: TimeWindow,
}

impl StatJob {
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}

/// A repository as resolved by the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub filename: String,
    pub changes: u64,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, changes: u64) -> Self {
        Self {
            filename: filename.into(),
            changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Display name of the author; `None` when the host has no attributable author.
    pub author: Option<String>,
    pub files: Vec<FileChange>,
}

/// Author display name to cumulative changed-line count.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AuthorTally(BTreeMap<String, u64>);

impl AuthorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, author: &str, changes: u64) {
        *self.0.entry(author.to_string()).or_insert(0) += changes;
    }

    pub fn get(&self, author: &str) -> Option<u64> {
        self.0.get(author).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for AuthorTally {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut tally = AuthorTally::new();
        for (author, changes) in iter {
            let author: String = author.into();
            tally.add(&author, changes);
        }
        tally
    }
}

/// Label to tally for the whole run.
///
/// Labels keep first-insertion order. Committing under an existing label
/// replaces that tally in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AggregationTable {
    entries: Vec<(String, AuthorTally)>,
    last_label: Option<String>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&mut self, label: &str, tally: AuthorTally) {
        match self.entries.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, slot)) => *slot = tally,
            None => self.entries.push((label.to_string(), tally)),
        }
        self.last_label = Some(label.to_string());
    }

    pub fn get(&self, label: &str) -> Option<&AuthorTally> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, tally)| tally)
    }

    /// Label of the most recently committed job.
    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn last_tally(&self) -> Option<&AuthorTally> {
        self.last_label.as_deref().and_then(|label| self.get(label))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AuthorTally)> {
        self.entries.iter().map(|(label, tally)| (label.as_str(), tally))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_nested_map(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.entries
            .iter()
            .map(|(label, tally)| (label.clone(), tally.as_map().clone()))
            .collect()
    }
}

impl Serialize for AggregationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, tally) in &self.entries {
            map.serialize_entry(label, tally)?;
        }
        map.end()
    }
}

impl fmt::Debug for AggregationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(label, tally)| (label, tally.as_map())))
            .finish()
    }
}
