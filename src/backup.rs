//! Backup records: timestamped snapshots of the display state.
//!
//! One file per switch attempt, named `gdctl-backup-<local time>.txt` so a
//! plain `ls` lists them oldest first.  Files are never read back or
//! deleted by this crate; rolling back is a manual `gdctl set`.

use chrono::Local;
use log::debug;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File name prefix shared by every backup record.
pub const PREFIX: &str = "gdctl-backup-";

/// Suffixes tried before giving up when several backups land in the same
/// millisecond.  Suffixes are two digits wide so names sort in write order.
const MAX_SUFFIX: u32 = 100;

/// Errors from writing a backup record.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("cannot create backup directory {}: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write backup {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no free backup file name in {}", .dir.display())]
    Exhausted { dir: PathBuf },
}

/// Writes backup records into one directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `snapshot` to a new, uniquely named file and return its path.
    ///
    /// Existing files are never overwritten.
    pub fn write(&self, snapshot: &str) -> Result<PathBuf, BackupError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| BackupError::CreateDir {
            dir: self.dir.clone(),
            source,
        })?;

        let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        for n in 0..MAX_SUFFIX {
            let path = self.dir.join(record_name(&stamp, n));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(BackupError::Write { path, source }),
            };
            file.write_all(snapshot.as_bytes())
                .map_err(|source| BackupError::Write {
                    path: path.clone(),
                    source,
                })?;
            debug!("wrote {} bytes to {}", snapshot.len(), path.display());
            return Ok(path);
        }
        Err(BackupError::Exhausted {
            dir: self.dir.clone(),
        })
    }

    /// Every backup record in the directory, oldest first.
    pub fn list(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(PREFIX) && n.ends_with(".txt"))
                })
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        files.sort();
        Ok(files)
    }
}

/// File name for the `n`th record written at `stamp`; `n == 0` has no suffix.
fn record_name(stamp: &str, n: u32) -> String {
    if n == 0 {
        format!("{}{}.txt", PREFIX, stamp)
    } else {
        format!("{}{}_{:02}.txt", PREFIX, stamp, n)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// A fresh, not-yet-created directory under the system temp dir.
    pub(crate) fn tmp_dir(tag: &str) -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "gdswitch-{}-test-{}-{}",
            tag,
            std::process::id(),
            id
        ))
    }

    #[test]
    fn writes_snapshot_verbatim() {
        let dir = tmp_dir("backup");
        let store = BackupStore::new(&dir);
        let path = store.write("Monitors:\n└──Monitor eDP-1 (x)\n").unwrap();
        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(PREFIX));
        assert!(name.ends_with(".txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Monitors:\n└──Monitor eDP-1 (x)\n"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rapid_writes_never_collide() {
        let dir = tmp_dir("backup");
        let store = BackupStore::new(&dir);
        let a = store.write("first").unwrap();
        let b = store.write("second").unwrap();
        let c = store.write("third").unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(store.list().unwrap().len(), 3);
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "first");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn suffixed_names_sort_in_write_order() {
        let names: Vec<String> = (0..MAX_SUFFIX)
            .map(|n| record_name("20260101-120000.000", n))
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[2], "gdctl-backup-20260101-120000.000_02.txt");
        assert_eq!(names[10], "gdctl-backup-20260101-120000.000_10.txt");
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let store = BackupStore::new(tmp_dir("backup"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn unusable_dir_is_an_error() {
        // A regular file where the directory should be.
        let blocker = tmp_dir("backup");
        std::fs::write(&blocker, "not a dir").unwrap();
        let err = BackupStore::new(&blocker).write("x").unwrap_err();
        assert!(matches!(err, BackupError::CreateDir { .. }));
        let _ = std::fs::remove_file(&blocker);
    }
}
