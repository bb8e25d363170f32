//! Copies the mod's custom JSON files into the mission folder.

use crate::pipeline::{FileReport, FileStatus};
use crate::store::MissionStore;
use modmerge_engine::CUSTOM_SUBDIR;

/// Result of copying the custom files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Installation {
    /// Names that now exist in the mission's `custom/` folder, sorted.
    pub installed: Vec<String>,
    /// Custom files that were not copied, for the run summary.
    pub problems: Vec<FileReport>,
}

impl Installation {
    fn problem(&mut self, file: String, status: FileStatus) {
        self.problems.push(FileReport { file, status });
    }
}

/// Copy every `*.json` file from `<data>/custom/` to `<mission>/custom/`.
///
/// Only files that were actually copied are reported as installed, since
/// the gameplay config is updated from that list. A file that cannot be
/// copied is recorded in [`Installation::problems`] and the rest continue.
/// In dry-run mode nothing is copied and every candidate is reported.
pub async fn install_custom_files<D, M>(data: &D, mission: &M, dry_run: bool) -> Installation
where
    D: MissionStore,
    M: MissionStore,
{
    let mut outcome = Installation::default();

    let names: Vec<String> = match data.list(CUSTOM_SUBDIR).await {
        Ok(names) => names
            .into_iter()
            .filter(|name| name.ends_with(".json"))
            .collect(),
        Err(err) => {
            tracing::error!(source = %data.describe(), error = %err, "cannot list custom files");
            outcome.problem(
                format!("{CUSTOM_SUBDIR}/"),
                FileStatus::Failed {
                    error: err.to_string(),
                },
            );
            return outcome;
        }
    };

    if names.is_empty() {
        tracing::info!(source = %data.describe(), "no custom files to install");
        return outcome;
    }

    for name in names {
        let path = format!("{CUSTOM_SUBDIR}/{name}");
        if dry_run {
            tracing::info!(file = %path, "would copy");
            outcome.installed.push(name);
            continue;
        }

        let content = match data.read(&path).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::warn!(file = %path, "custom file disappeared before copy");
                outcome.problem(
                    path,
                    FileStatus::Skipped {
                        reason: "removed from data folder before copy".to_string(),
                    },
                );
                continue;
            }
            Err(err) => {
                tracing::error!(file = %path, error = %err, "cannot read custom file");
                outcome.problem(
                    path,
                    FileStatus::Failed {
                        error: err.to_string(),
                    },
                );
                continue;
            }
        };

        match mission.write(&path, &content).await {
            Ok(()) => {
                tracing::info!(file = %path, "copied");
                outcome.installed.push(name);
            }
            Err(err) => {
                tracing::error!(file = %path, error = %err, "cannot copy custom file");
                outcome.problem(
                    path,
                    FileStatus::Failed {
                        error: err.to_string(),
                    },
                );
            }
        }
    }

    outcome
}
