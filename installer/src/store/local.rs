use super::MissionStore;
use crate::error::{InstallError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        name.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

/// `<name>.<stamp>.bak`, or `<name>.<stamp>-<n>.bak` when earlier attempts
/// in the same second already exist.
pub(crate) fn backup_name(name: &str, stamp: &str, attempt: usize) -> String {
    match attempt {
        0 => format!("{name}.{stamp}.bak"),
        n => format!("{name}.{stamp}-{n}.bak"),
    }
}

/// Local time as `YYYYmmdd-HHMMSS`.
fn backup_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Write `content` to a file that must not exist yet.
async fn create_new(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.flush().await
}

impl MissionStore for LocalStore {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(InstallError::io(path, err)),
        }
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| InstallError::io(parent, err))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|err| InstallError::io(&path, err))
    }

    async fn backup(&self, name: &str, previous: &[u8]) -> Result<String> {
        let stamp = backup_stamp();
        let mut attempt = 0;
        loop {
            let archive = backup_name(name, &stamp, attempt);
            let path = self.resolve(&archive);
            match create_new(&path, previous).await {
                Ok(()) => {
                    tracing::debug!(file = name, backup = %archive, "archived previous content");
                    return Ok(archive);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(InstallError::io(path, err)),
            }
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let path = self.resolve(dir);
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(InstallError::io(path, err)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| InstallError::io(&path, err))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| InstallError::io(entry.path(), err))?;
            if file_type.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
