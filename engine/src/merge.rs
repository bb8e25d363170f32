//! Merge orchestration: parse, reconcile, and serialize only on change.
//!
//! This is the engine's entry point. It never touches files; callers hand in
//! the installed content and the fragment (or the installed file list for the
//! gameplay config) and decide what to do with a [`MergeResult::Modified`].

use crate::error::{Error, Result};
use crate::format::gameplay;
use crate::format::json::JsonDocument;
use crate::format::xml::XmlDocument;
use crate::profile::{FileProfile, Format, GameplayLayout};
use crate::reconcile::{ReconcileReport, RecordSet, Reconciler};

/// What is being merged into the target.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Raw bytes of a fragment shipped with the mod.
    Fragment(&'a [u8]),
    /// Names of the custom files just installed (gameplay config only).
    InstalledFiles(&'a [String]),
}

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// Nothing to write; callers should skip writing and backing up.
    Unchanged,
    /// New content with at least one inserted or replaced record.
    Modified { content: Vec<u8>, change_count: usize },
}

impl MergeResult {
    pub fn change_count(&self) -> usize {
        match self {
            MergeResult::Unchanged => 0,
            MergeResult::Modified { change_count, .. } => *change_count,
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, MergeResult::Modified { .. })
    }

    pub fn into_content(self) -> Option<Vec<u8>> {
        match self {
            MergeResult::Unchanged => None,
            MergeResult::Modified { content, .. } => Some(content),
        }
    }
}

/// Merge `source` into `target` under `profile`.
pub fn run(target: &[u8], source: Source<'_>, profile: &FileProfile) -> Result<MergeResult> {
    run_with_report(target, source, profile).map(|(result, _)| result)
}

/// Like [`run`], also returning the per-record decisions.
pub fn run_with_report(
    target: &[u8],
    source: Source<'_>,
    profile: &FileProfile,
) -> Result<(MergeResult, ReconcileReport)> {
    let file = profile.filename;
    let (content, report) = match (profile.format, source) {
        (Format::JsonArray { container, field }, Source::Fragment(fragment)) => {
            merge_json_array(target, fragment, profile, container, field)?
        }
        (Format::XmlTree { root }, Source::Fragment(fragment)) => {
            merge_xml_tree(target, fragment, profile, root)?
        }
        (Format::GameplayPaths(layout), Source::InstalledFiles(installed)) => {
            merge_gameplay(target, installed, profile, &layout)?
        }
        (Format::GameplayPaths(_), Source::Fragment(_)) => {
            return Err(Error::unreadable_source(
                file,
                "expects the list of installed custom files",
            ));
        }
        (_, Source::InstalledFiles(_)) => {
            return Err(Error::unreadable_source(file, "expects a fragment"));
        }
    };

    let result = match content {
        Some(content) => MergeResult::Modified {
            content,
            change_count: report.change_count(),
        },
        None => MergeResult::Unchanged,
    };
    tracing::debug!(
        file,
        changes = report.change_count(),
        duplicates = report.duplicates.len(),
        unkeyed = report.unkeyed,
        "merge finished"
    );
    Ok((result, report))
}

type Merged = (Option<Vec<u8>>, ReconcileReport);

fn merge_json_array(
    target: &[u8],
    fragment: &[u8],
    profile: &FileProfile,
    container: &[&str],
    field: &str,
) -> Result<Merged> {
    let file = profile.filename;
    let mut doc = JsonDocument::parse(target).map_err(|e| Error::unparsable_target(file, e))?;
    let incoming = JsonDocument::parse(fragment)
        .and_then(|source| source.records(container, field))
        .map_err(|e| Error::unreadable_source(file, e))?;

    let items = doc
        .array_mut(container, field)
        .map_err(|e| Error::unparsable_target(file, e))?;
    let installed = RecordSet::from_records(std::mem::take(items), profile.key);
    let (merged, report) = Reconciler::new(profile).merge(installed, incoming);
    *items = merged.into_records();

    if report.is_empty() {
        return Ok((None, report));
    }
    let content = doc
        .to_bytes()
        .map_err(|e| Error::serialization(file, e))?;
    Ok((Some(content), report))
}

fn merge_xml_tree(
    target: &[u8],
    fragment: &[u8],
    profile: &FileProfile,
    root: &str,
) -> Result<Merged> {
    let file = profile.filename;
    let mut doc = XmlDocument::parse(target).map_err(|e| Error::unparsable_target(file, e))?;
    let source = XmlDocument::parse(fragment).map_err(|e| Error::unreadable_source(file, e))?;
    if doc.root.name != root {
        tracing::warn!(file, expected = root, found = %doc.root.name, "unexpected root element");
    }

    let installed = RecordSet::from_records(std::mem::take(&mut doc.root.children), profile.key);
    let incoming = source
        .root
        .children
        .into_iter()
        .filter(|node| node.as_element().is_some());
    let (merged, report) = Reconciler::new(profile).merge(installed, incoming);
    doc.root.children = merged.into_records();

    if report.is_empty() {
        return Ok((None, report));
    }
    let content = doc
        .to_bytes()
        .map_err(|e| Error::serialization(file, e))?;
    Ok((Some(content), report))
}

fn merge_gameplay(
    target: &[u8],
    installed: &[String],
    profile: &FileProfile,
    layout: &GameplayLayout,
) -> Result<Merged> {
    let file = profile.filename;
    let mut doc = JsonDocument::parse(target).map_err(|e| Error::unparsable_target(file, e))?;
    let report = gameplay::register_installed(&mut doc, layout, profile, installed)
        .map_err(|e| Error::unparsable_target(file, e))?;

    if report.is_empty() {
        return Ok((None, report));
    }
    let content = doc
        .to_bytes()
        .map_err(|e| Error::serialization(file, e))?;
    Ok((Some(content), report))
}
