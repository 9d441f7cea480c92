/// Core types for versions and the version list.
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// Provenance back-reference to the version a restore was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub id: String,
    /// Unix milliseconds of the referenced version.
    pub timestamp: i64,
}

/// A full snapshot of the document at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// Opaque identifier, the only lookup key.
    pub id: String,
    /// Complete serialized markup (never a delta).
    pub content: String,
    /// Creation instant in Unix milliseconds.
    pub timestamp: i64,
    /// Set only on versions created by a restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<VersionRef>,
}

impl Version {
    pub fn new(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
            restored_from: None,
        }
    }

    /// Reference to this version, as stored in `restored_from` of a copy.
    pub fn reference(&self) -> VersionRef {
        VersionRef {
            id: self.id.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Creation instant as a UTC date-time (epoch if out of range).
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    pub fn is_restore(&self) -> bool {
        self.restored_from.is_some()
    }
}

/// Versions created on one calendar day, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub versions: Vec<&'a Version>,
}

/// Ordered, append-only, never-empty list of versions with unique ids.
///
/// Serializes as a plain JSON array; deserialization re-checks the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Version>", into = "Vec<Version>")]
pub struct VersionList {
    versions: Vec<Version>,
}

impl VersionList {
    /// Creates a list holding a single seed version.
    pub fn seeded(seed: Version) -> Self {
        Self {
            versions: vec![seed],
        }
    }

    /// Builds a list from existing versions, validating the invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHistory` if `versions` is empty or contains a
    /// duplicate id.
    pub fn from_versions(versions: Vec<Version>) -> Result<Self, HistoryError> {
        if versions.is_empty() {
            return Err(HistoryError::InvalidHistory(
                "version list is empty".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(versions.len());
        for v in &versions {
            if !seen.insert(v.id.as_str()) {
                return Err(HistoryError::InvalidHistory(format!(
                    "duplicate version id: {}",
                    v.id
                )));
            }
        }
        Ok(Self { versions })
    }

    /// The last appended version.
    pub fn latest(&self) -> &Version {
        // Non-empty by construction.
        &self.versions[self.versions.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.versions.iter()
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }

    /// Timestamp for the next append: `now_ms`, but never earlier than the
    /// latest version.
    pub fn next_timestamp(&self, now_ms: i64) -> i64 {
        now_ms.max(self.latest().timestamp)
    }

    /// Appends a version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHistory` if the id is already present.
    pub(crate) fn push(&mut self, version: Version) -> Result<(), HistoryError> {
        if self.contains(&version.id) {
            return Err(HistoryError::InvalidHistory(format!(
                "duplicate version id: {}",
                version.id
            )));
        }
        self.versions.push(version);
        Ok(())
    }

    /// Groups versions by calendar day in `tz`, newest day first and newest
    /// version first inside each day. Storage order is untouched.
    pub fn group_by_day<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayGroup<'_>> {
        let mut days: BTreeMap<NaiveDate, Vec<&Version>> = BTreeMap::new();
        for v in self.versions.iter().rev() {
            let date = v.created_at().with_timezone(tz).date_naive();
            days.entry(date).or_default().push(v);
        }
        days.into_iter()
            .rev()
            .map(|(date, versions)| DayGroup { date, versions })
            .collect()
    }
}

impl TryFrom<Vec<Version>> for VersionList {
    type Error = HistoryError;

    fn try_from(versions: Vec<Version>) -> Result<Self, Self::Error> {
        Self::from_versions(versions)
    }
}

impl From<VersionList> for Vec<Version> {
    fn from(list: VersionList) -> Self {
        list.versions
    }
}

impl<'a> IntoIterator for &'a VersionList {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn sample_list() -> VersionList {
        VersionList::from_versions(vec![
            Version::new("a", "<p>A</p>", 1_000),
            Version::new("b", "<p>B</p>", 2_000),
            Version::new("c", "<p>C</p>", DAY_MS + 5_000),
        ])
        .expect("valid list")
    }

    #[test]
    fn test_from_versions_rejects_empty() {
        let err = VersionList::from_versions(Vec::new()).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidHistory(_)));
    }

    #[test]
    fn test_from_versions_rejects_duplicate_ids() {
        let err = VersionList::from_versions(vec![
            Version::new("x", "1", 1),
            Version::new("x", "2", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidHistory(_)));
    }

    #[test]
    fn test_latest_is_last_element() {
        let list = sample_list();
        assert_eq!(list.latest().id, "c");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_push_rejects_duplicate() {
        let mut list = sample_list();
        assert!(list.push(Version::new("a", "again", 9_000)).is_err());
        assert_eq!(list.len(), 3);
        list.push(Version::new("d", "<p>D</p>", 9_000)).expect("push");
        assert_eq!(list.latest().id, "d");
    }

    #[test]
    fn test_next_timestamp_never_goes_backwards() {
        let list = sample_list();
        let latest = list.latest().timestamp;
        assert_eq!(list.next_timestamp(0), latest);
        assert_eq!(list.next_timestamp(latest + 10), latest + 10);
    }

    #[test]
    fn test_json_shape_matches_storage_format() {
        let mut list = VersionList::seeded(Version::new("initial", "<p>A</p>", 5));
        let mut restored = Version::new("r1", "<p>A</p>", 6);
        restored.restored_from = Some(list.latest().reference());
        list.push(restored).expect("push");

        let json = serde_json::to_value(&list).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([
                { "id": "initial", "content": "<p>A</p>", "timestamp": 5 },
                {
                    "id": "r1",
                    "content": "<p>A</p>",
                    "timestamp": 6,
                    "restoredFrom": { "id": "initial", "timestamp": 5 }
                }
            ])
        );
    }

    #[test]
    fn test_deserialize_rejects_empty_array() {
        let parsed: Result<VersionList, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_group_by_day_newest_first() {
        let list = sample_list();
        let groups = list.group_by_day(&Utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(groups[0].versions[0].id, "c");
        let ids: Vec<&str> = groups[1].versions.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        // Projection only: storage order unchanged
        assert_eq!(list.as_slice()[0].id, "a");
    }

    #[test]
    fn test_group_by_day_respects_timezone() {
        let list = sample_list();
        // UTC-1 pulls "c" (00:00:05 on day 2 UTC) back to day 1.
        let west = FixedOffset::west_opt(3600).unwrap();
        let groups = list.group_by_day(&west);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(groups[0].versions.len(), 1);
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(1969, 12, 31).unwrap());
    }
}
