//! Watches a markdown file on disk, used to drive the preview from an external editor.

use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file was written, or re-created by an editor saving via rename.
    Changed(PathBuf),
    /// The file is gone.
    Removed(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("invalid file path: {0}")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// Keeps the OS watcher alive, events stop once this is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    file_path: PathBuf,
}

impl FileWatcher {
    /// Watches the parent directory of `path` and reports the events about that file.
    ///
    /// Watching the directory instead of the file itself keeps the watch alive across
    /// editors replacing the file on save.
    pub fn new(path: &Path) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), WatchError> {
        let file_path = path.to_path_buf();
        let (Some(file_name), Some(parent)) = (file_path.file_name(), file_path.parent()) else {
            return Err(WatchError::InvalidPath(file_path));
        };
        let file_name: OsString = file_name.to_os_string();
        let watch_target = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let target = file_path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    let is_target_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if !is_target_file {
                        return;
                    }

                    let watch_event = if event.kind.is_remove() {
                        WatchEvent::Removed(target.clone())
                    } else if event.kind.is_modify() || event.kind.is_create() {
                        WatchEvent::Changed(target.clone())
                    } else {
                        return;
                    };
                    let _ = event_tx.send(watch_event);
                }
                Err(err) => {
                    tracing::error!(?err, "File watcher error");
                }
            },
            notify::Config::default(),
        )?;

        watcher.watch(&watch_target, RecursiveMode::NonRecursive)?;

        tracing::debug!(path = ?file_path, "Started file watcher");

        Ok((
            Self {
                _watcher: watcher,
                file_path,
            },
            event_rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invalid_path() {
        assert!(matches!(
            FileWatcher::new(Path::new("/")),
            Err(WatchError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_reports_changes_of_the_target_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# one").unwrap();

        let (watcher, mut events) = FileWatcher::new(&path).unwrap();
        assert_eq!(watcher.path(), path.as_path());

        std::fs::write(dir.path().join("other.md"), "noise").unwrap();
        std::fs::write(&path, "# two").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no file event received")
            .unwrap();
        assert_eq!(event, WatchEvent::Changed(path.clone()));
    }
}
