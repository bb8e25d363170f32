//! Set reconciliation of incoming records against an installed container.
//!
//! # Algorithm
//!
//! For each source record, in source order:
//!
//! 1. Derive its key. No key: skip it.
//! 2. Key not installed: append it.
//! 3. Key installed and the profile replaces on match: drop every installed
//!    record with that key, then append the incoming one. An installed
//!    entry that is already identical is left alone.
//! 4. Key installed otherwise: it is a duplicate, skip it.
//!
//! Under replace-on-match only the last record of a key in the source is
//! considered.
//!
//! Running the same source against the output again makes no changes.

use crate::identity::{MergeKey, Record};
use crate::profile::{DuplicatePolicy, FileProfile, KeyStrategy};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct Entry<R> {
    record: R,
    key: Option<MergeKey>,
}

/// The records of one container plus the keys derivable from them.
///
/// The key set always equals the set of keys of the held records.
#[derive(Debug, Clone)]
pub struct RecordSet<R> {
    entries: Vec<Entry<R>>,
    keys: HashSet<MergeKey>,
    strategy: KeyStrategy,
}

impl<R: Record> RecordSet<R> {
    /// Build from installed records, deriving every key up front.
    pub fn from_records(records: impl IntoIterator<Item = R>, strategy: KeyStrategy) -> Self {
        let mut set = Self {
            entries: Vec::new(),
            keys: HashSet::new(),
            strategy,
        };
        for record in records {
            let key = record.merge_key(&strategy);
            set.append(record, key);
        }
        set
    }

    pub fn contains(&self, key: &MergeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MergeKey> {
        self.keys.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn into_records(self) -> Vec<R> {
        self.entries.into_iter().map(|e| e.record).collect()
    }

    fn append(&mut self, record: R, key: Option<MergeKey>) {
        if let Some(key) = &key {
            self.keys.insert(key.clone());
        }
        self.entries.push(Entry { record, key });
    }

    /// True when exactly one record carries `key` and it equals `record`.
    fn holds_only(&self, key: &MergeKey, record: &R) -> bool {
        let mut matching = self
            .entries
            .iter()
            .filter(|e| e.key.as_ref() == Some(key));
        matches!((matching.next(), matching.next()), (Some(e), None) if e.record == *record)
    }

    /// Drop every record carrying `key`, returning how many were removed.
    fn remove_all(&mut self, key: &MergeKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key.as_ref() != Some(key));
        self.keys.remove(key);
        before - self.entries.len()
    }
}

/// What reconciliation did with the incoming records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Keys appended as new entries
    pub inserted: Vec<MergeKey>,
    /// Keys whose installed entries were superseded
    pub replaced: Vec<MergeKey>,
    /// Keys skipped because they were already installed
    pub duplicates: Vec<MergeKey>,
    /// Incoming records without a derivable key
    pub unkeyed: usize,
}

impl ReconcileReport {
    pub fn change_count(&self) -> usize {
        self.inserted.len() + self.replaced.len()
    }

    /// True when nothing would be written.
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Fold the report of another container of the same file into this one.
    pub fn absorb(&mut self, other: ReconcileReport) {
        self.inserted.extend(other.inserted);
        self.replaced.extend(other.replaced);
        self.duplicates.extend(other.duplicates);
        self.unkeyed += other.unkeyed;
    }
}

/// Applies a profile's duplicate policy to incoming records.
pub struct Reconciler<'a> {
    profile: &'a FileProfile,
}

impl<'a> Reconciler<'a> {
    pub fn new(profile: &'a FileProfile) -> Self {
        Self { profile }
    }

    /// Reconcile `source` into `target`.
    pub fn merge<R: Record>(
        &self,
        mut target: RecordSet<R>,
        source: impl IntoIterator<Item = R>,
    ) -> (RecordSet<R>, ReconcileReport) {
        let mut report = ReconcileReport::default();
        let file = self.profile.filename;

        let incoming: Vec<(R, Option<MergeKey>)> = source
            .into_iter()
            .map(|record| {
                let key = record.merge_key(&target.strategy);
                (record, key)
            })
            .collect();
        // Under replace-on-match the last definition of a key in the fragment wins.
        let mut last_seen: HashMap<&MergeKey, usize> = HashMap::new();
        for (index, (_, key)) in incoming.iter().enumerate() {
            if let Some(key) = key {
                last_seen.insert(key, index);
            }
        }
        let superseded: Vec<bool> = incoming
            .iter()
            .enumerate()
            .map(|(index, (_, key))| {
                key.as_ref()
                    .is_some_and(|key| last_seen.get(key).is_some_and(|last| *last != index))
            })
            .collect();

        for ((record, key), superseded) in incoming.into_iter().zip(superseded) {
            let Some(key) = key else {
                tracing::debug!(file, "skipping record without a merge key");
                report.unkeyed += 1;
                continue;
            };

            let replaces = self.profile.policy == DuplicatePolicy::ReplaceOnMatch;
            if replaces && superseded {
                tracing::trace!(file, %key, "superseded later in the fragment");
                report.duplicates.push(key);
                continue;
            }

            if !target.contains(&key) {
                tracing::trace!(file, %key, "inserting");
                target.append(record, Some(key.clone()));
                report.inserted.push(key);
                continue;
            }

            match self.profile.policy {
                DuplicatePolicy::ReplaceOnMatch if target.holds_only(&key, &record) => {
                    tracing::trace!(file, %key, "installed entry already current");
                    report.duplicates.push(key);
                }
                DuplicatePolicy::ReplaceOnMatch => {
                    let removed = target.remove_all(&key);
                    if removed > 1 {
                        tracing::warn!(file, %key, removed, "collapsed duplicate installed entries");
                    }
                    tracing::debug!(file, %key, "replacing installed entry");
                    target.append(record, Some(key.clone()));
                    report.replaced.push(key);
                }
                DuplicatePolicy::InsertOnly => {
                    tracing::trace!(file, %key, "already installed");
                    report.duplicates.push(key);
                }
            }
        }

        (target, report)
    }
}
