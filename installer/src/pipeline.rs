//! Per-file read, merge, back up, and write.
//!
//! Each profile is processed independently. A failure on one file is
//! recorded in its [`FileReport`] and never stops the others.

use crate::error::{InstallError, Result};
use crate::store::MissionStore;
use modmerge_engine::{run, Error as EngineError, FileProfile, Format, MergeResult, Source, PROFILES};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Write behavior shared by every file in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub backup: bool,
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Updated {
        changes: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        backup: Option<String>,
        dry_run: bool,
    },
    Unchanged,
    Skipped { reason: String },
    Failed { error: String },
}

impl FileStatus {
    fn skipped(reason: impl Into<String>) -> Self {
        FileStatus::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Process one file, folding every error into the returned status.
pub async fn process_file<D, M>(
    profile: &FileProfile,
    data: &D,
    mission: &M,
    installed: &[String],
    options: Options,
) -> FileReport
where
    D: MissionStore,
    M: MissionStore,
{
    let status = match try_process(profile, data, mission, installed, options).await {
        Ok(status) => status,
        Err(err) => {
            tracing::error!(file = profile.filename, error = %err, "file failed");
            FileStatus::Failed {
                error: err.to_string(),
            }
        }
    };
    FileReport {
        file: profile.filename.to_string(),
        status,
    }
}

async fn try_process<D, M>(
    profile: &FileProfile,
    data: &D,
    mission: &M,
    installed: &[String],
    options: Options,
) -> Result<FileStatus>
where
    D: MissionStore,
    M: MissionStore,
{
    let name = profile.filename;

    let fragment = match profile.format {
        Format::GameplayPaths(_) => {
            if installed.is_empty() {
                return Ok(FileStatus::skipped("no custom files installed"));
            }
            None
        }
        _ => match read_or_skip(data, name).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => return Ok(FileStatus::skipped("no fragment in data folder")),
            Err(status) => return Ok(status),
        },
    };

    let target = match read_or_skip(mission, name).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(FileStatus::skipped("not found in mission folder")),
        Err(status) => return Ok(status),
    };

    let source = match &fragment {
        Some(bytes) => Source::Fragment(bytes),
        None => Source::InstalledFiles(installed),
    };

    let result = match run(&target, source, profile) {
        Ok(result) => result,
        Err(EngineError::UnparsableTarget { reason, .. }) => {
            tracing::warn!(file = name, %reason, "target could not be parsed");
            return Ok(FileStatus::skipped(format!("unparsable target: {reason}")));
        }
        Err(EngineError::UnreadableSource { reason, .. }) => {
            tracing::warn!(file = name, %reason, "fragment could not be read");
            return Ok(FileStatus::skipped(format!("unreadable fragment: {reason}")));
        }
        Err(err) => return Err(InstallError::from(err)),
    };

    let changes = result.change_count();
    let MergeResult::Modified { content, .. } = result else {
        tracing::info!(file = name, "no changes required");
        return Ok(FileStatus::Unchanged);
    };

    if options.dry_run {
        tracing::info!(file = name, changes, "dry run, not writing");
        return Ok(FileStatus::Updated {
            changes,
            backup: None,
            dry_run: true,
        });
    }

    let backup = if options.backup {
        Some(mission.backup(name, &target).await?)
    } else {
        None
    };
    mission.write(name, &content).await?;
    tracing::info!(file = name, changes, backup = ?backup, "updated");

    Ok(FileStatus::Updated {
        changes,
        backup,
        dry_run: false,
    })
}

/// A read failure on either side skips the file rather than failing it.
async fn read_or_skip<S: MissionStore>(
    store: &S,
    name: &str,
) -> std::result::Result<Option<Vec<u8>>, FileStatus> {
    store.read(name).await.map_err(|err| {
        tracing::warn!(file = name, location = %store.describe(), error = %err, "read failed");
        FileStatus::skipped(format!("unavailable: {err}"))
    })
}

/// Process every supported file concurrently, reporting in table order.
pub async fn run_all<D, M>(
    data: Arc<D>,
    mission: Arc<M>,
    installed: Arc<Vec<String>>,
    options: Options,
) -> Vec<FileReport>
where
    D: MissionStore,
    M: MissionStore,
{
    let mut reports: Vec<FileReport> = PROFILES
        .iter()
        .map(|profile| FileReport {
            file: profile.filename.to_string(),
            status: FileStatus::Failed {
                error: "task did not complete".to_string(),
            },
        })
        .collect();

    let mut tasks = JoinSet::new();
    for (index, profile) in PROFILES.iter().enumerate() {
        let data = Arc::clone(&data);
        let mission = Arc::clone(&mission);
        let installed = Arc::clone(&installed);
        tasks.spawn(async move {
            let report = process_file(profile, &*data, &*mission, &installed, options).await;
            (index, report)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => reports[index] = report,
            Err(err) => tracing::error!(error = %err, "file task aborted"),
        }
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use modmerge_engine::{CFG_GAMEPLAY, MAP_GROUP_PROTO, SPAWNABLE_TYPES};

    const PROTO_TARGET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<prototype>
    <group name="Land_Shed"/>
</prototype>
"#;

    const PROTO_FRAGMENT: &str = r#"<prototype>
    <group name="Land_Shed"/>
    <group name="Land_Bunker_X"/>
</prototype>
"#;

    struct Fixture {
        _data_dir: tempfile::TempDir,
        mission_dir: tempfile::TempDir,
        data: LocalStore,
        mission: LocalStore,
    }

    fn fixture() -> Fixture {
        let data_dir = tempfile::tempdir().unwrap();
        let mission_dir = tempfile::tempdir().unwrap();
        let data = LocalStore::new(data_dir.path());
        let mission = LocalStore::new(mission_dir.path());
        Fixture {
            _data_dir: data_dir,
            mission_dir,
            data,
            mission,
        }
    }

    fn backups_in(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".bak"))
            .collect()
    }

    #[tokio::test]
    async fn modified_file_is_backed_up_then_written() {
        let fx = fixture();
        fx.data.write("mapgroupproto.xml", PROTO_FRAGMENT.as_bytes()).await.unwrap();
        fx.mission.write("mapgroupproto.xml", PROTO_TARGET.as_bytes()).await.unwrap();

        let report = process_file(&MAP_GROUP_PROTO, &fx.data, &fx.mission, &[], Options::default()).await;

        let FileStatus::Updated { changes, backup: Some(backup), dry_run: false } = &report.status else {
            panic!("unexpected status {:?}", report.status);
        };
        assert_eq!(*changes, 1);
        assert_eq!(
            fx.mission.read(backup).await.unwrap(),
            Some(PROTO_TARGET.as_bytes().to_vec())
        );
        let written = fx.mission.read("mapgroupproto.xml").await.unwrap().unwrap();
        assert!(String::from_utf8(written).unwrap().contains("Land_Bunker_X"));

        let again = process_file(&MAP_GROUP_PROTO, &fx.data, &fx.mission, &[], Options::default()).await;
        assert_eq!(again.status, FileStatus::Unchanged);
        assert_eq!(backups_in(fx.mission_dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn dry_run_leaves_target_untouched() {
        let fx = fixture();
        fx.data.write("mapgroupproto.xml", PROTO_FRAGMENT.as_bytes()).await.unwrap();
        fx.mission.write("mapgroupproto.xml", PROTO_TARGET.as_bytes()).await.unwrap();
        let options = Options {
            backup: true,
            dry_run: true,
        };

        let report = process_file(&MAP_GROUP_PROTO, &fx.data, &fx.mission, &[], options).await;

        assert_eq!(
            report.status,
            FileStatus::Updated {
                changes: 1,
                backup: None,
                dry_run: true
            }
        );
        assert_eq!(
            fx.mission.read("mapgroupproto.xml").await.unwrap(),
            Some(PROTO_TARGET.as_bytes().to_vec())
        );
        assert!(backups_in(fx.mission_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn no_backup_option_skips_archive() {
        let fx = fixture();
        fx.data.write("mapgroupproto.xml", PROTO_FRAGMENT.as_bytes()).await.unwrap();
        fx.mission.write("mapgroupproto.xml", PROTO_TARGET.as_bytes()).await.unwrap();
        let options = Options {
            backup: false,
            dry_run: false,
        };

        let report = process_file(&MAP_GROUP_PROTO, &fx.data, &fx.mission, &[], options).await;

        assert!(matches!(report.status, FileStatus::Updated { backup: None, .. }));
        assert!(backups_in(fx.mission_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_inputs_are_skipped() {
        let fx = fixture();

        let report = process_file(&SPAWNABLE_TYPES, &fx.data, &fx.mission, &[], Options::default()).await;
        assert_eq!(report.status, FileStatus::skipped("no fragment in data folder"));

        fx.data.write("cfgspawnabletypes.xml", b"<spawnabletypes/>").await.unwrap();
        let report = process_file(&SPAWNABLE_TYPES, &fx.data, &fx.mission, &[], Options::default()).await;
        assert_eq!(report.status, FileStatus::skipped("not found in mission folder"));
    }

    #[tokio::test]
    async fn gameplay_needs_installed_files() {
        let fx = fixture();
        fx.mission
            .write("cfggameplay.json", br#"{"WorldsData": {"objectSpawnersArr": []}}"#)
            .await
            .unwrap();

        let report = process_file(&CFG_GAMEPLAY, &fx.data, &fx.mission, &[], Options::default()).await;
        assert_eq!(report.status, FileStatus::skipped("no custom files installed"));

        let installed = vec!["zone1-pra.json".to_string(), "spawns1.json".to_string()];
        let report = process_file(&CFG_GAMEPLAY, &fx.data, &fx.mission, &installed, Options::default()).await;
        assert!(matches!(report.status, FileStatus::Updated { changes: 2, .. }));

        let written = fx.mission.read("cfggameplay.json").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(
            json["WorldsData"]["playerRestrictedAreaFiles"],
            serde_json::json!(["./custom/zone1-pra.json"])
        );
        assert_eq!(
            json["WorldsData"]["objectSpawnersArr"],
            serde_json::json!(["./custom/spawns1.json"])
        );
    }

    #[tokio::test]
    async fn malformed_target_is_skipped_and_kept() {
        let fx = fixture();
        fx.data.write("mapgroupproto.xml", PROTO_FRAGMENT.as_bytes()).await.unwrap();
        fx.mission.write("mapgroupproto.xml", b"<prototype><group").await.unwrap();

        let report = process_file(&MAP_GROUP_PROTO, &fx.data, &fx.mission, &[], Options::default()).await;

        let FileStatus::Skipped { reason } = &report.status else {
            panic!("unexpected status {:?}", report.status);
        };
        assert!(reason.starts_with("unparsable target"));
        assert_eq!(
            fx.mission.read("mapgroupproto.xml").await.unwrap(),
            Some(b"<prototype><group".to_vec())
        );
    }

    #[tokio::test]
    async fn run_all_reports_in_table_order() {
        let fx = fixture();
        fx.data.write("mapgroupproto.xml", PROTO_FRAGMENT.as_bytes()).await.unwrap();
        fx.mission.write("mapgroupproto.xml", PROTO_TARGET.as_bytes()).await.unwrap();

        let reports = run_all(
            Arc::new(fx.data.clone()),
            Arc::new(fx.mission.clone()),
            Arc::new(Vec::new()),
            Options::default(),
        )
        .await;

        let files: Vec<_> = reports.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(
            files,
            vec![
                "cfggameplay.json",
                "cfgundergroundtriggers.json",
                "mapgrouppos.xml",
                "mapgroupproto.xml",
                "cfgspawnabletypes.xml",
            ]
        );
        assert!(matches!(reports[3].status, FileStatus::Updated { changes: 1, .. }));
        assert!(reports.iter().all(|r| !r.status.is_failure()));
    }

    #[test]
    fn status_serializes_with_tag() {
        let report = FileReport {
            file: "mapgrouppos.xml".to_string(),
            status: FileStatus::Updated {
                changes: 3,
                backup: None,
                dry_run: false,
            },
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "file": "mapgrouppos.xml",
                "status": "updated",
                "changes": 3,
                "dry_run": false
            })
        );
    }
}
