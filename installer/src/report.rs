//! Per-file summary rendering.

use crate::cli::OutputFormat;
use crate::pipeline::{FileReport, FileStatus};

pub fn render(reports: &[FileReport], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => serde_json::to_string_pretty(reports),
    }
}

fn render_text(reports: &[FileReport]) -> String {
    let mut out: Vec<String> = reports.iter().map(line).collect();
    out.push(tally(reports));
    out.join("\n")
}

fn line(report: &FileReport) -> String {
    let file = &report.file;
    match &report.status {
        FileStatus::Updated {
            changes,
            backup,
            dry_run,
        } => {
            let noun = if *changes == 1 { "change" } else { "changes" };
            let detail = match (backup, dry_run) {
                (_, true) => ", dry run".to_string(),
                (Some(backup), false) => format!(", backup {backup}"),
                (None, false) => String::new(),
            };
            format!("[updated] {file} ({changes} {noun}{detail})")
        }
        FileStatus::Unchanged => format!("[unchanged] {file}"),
        FileStatus::Skipped { reason } => format!("[skipped] {file}: {reason}"),
        FileStatus::Failed { error } => format!("[failed] {file}: {error}"),
    }
}

fn tally(reports: &[FileReport]) -> String {
    let (mut updated, mut unchanged, mut skipped, mut failed) = (0, 0, 0, 0);
    for report in reports {
        match report.status {
            FileStatus::Updated { .. } => updated += 1,
            FileStatus::Unchanged => unchanged += 1,
            FileStatus::Skipped { .. } => skipped += 1,
            FileStatus::Failed { .. } => failed += 1,
        }
    }
    format!(
        "{} files: {updated} updated, {unchanged} unchanged, {skipped} skipped, {failed} failed",
        reports.len()
    )
}
