//! Storage backends supplying and receiving file bytes.
//!
//! The merge engine only sees buffers. A store is where those buffers come
//! from and go to: the local repository, a local mission folder, or a remote
//! server reached over some file transfer session.

mod local;

pub use local::LocalStore;

use crate::error::Result;
use std::future::Future;

/// Byte-level access to a directory tree, addressed by `/`-separated names.
///
/// Reads and writes are not atomic with respect to other writers; callers
/// that target a live server accept the window between `read` and `write`.
pub trait MissionStore: Send + Sync + 'static {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Content of `name`, or `None` when it does not exist.
    fn read(&self, name: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Replace the content of `name`, creating parent directories.
    fn write(&self, name: &str, content: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Archive `previous` next to `name`, returning the archive's name.
    ///
    /// Never overwrites an earlier archive.
    fn backup(&self, name: &str, previous: &[u8]) -> impl Future<Output = Result<String>> + Send;

    /// Names of the regular files directly inside `dir`, sorted by name;
    /// empty when it is absent.
    fn list(&self, dir: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}
