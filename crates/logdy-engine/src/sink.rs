//! Crash-safe rotating log file, written synchronously on the ingress path.
//!
//! Rotation writes a `.rotating` marker before touching any file and removes
//! it only once the rename chain has completed, so a crash mid-rotation
//! leaves an unambiguous trail for [`RotatingSink::open`] to recover from.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use logdy_protocol::Message;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode message as JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_err(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn rotating_marker_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".rotating");
    PathBuf::from(name)
}

/// Backup path for generation `n` (1 = most recent), preserving the
/// original extension: `app.log` -> `app.1.log`.
fn backup_path(base: &Path, n: usize) -> PathBuf {
    match (base.file_stem(), base.extension()) {
        (Some(stem), Some(ext)) => base.with_file_name(format!(
            "{}.{n}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        )),
        _ => base.with_file_name(format!("{}.{n}", base.to_string_lossy())),
    }
}

/// If a stale `.rotating` marker is found, finish whatever rotation was
/// interrupted before anything else touches the file.
fn recover_stale_rotation(path: &Path) -> Result<(), SinkError> {
    let marker = rotating_marker_path(path);
    if !marker.exists() {
        return Ok(());
    }

    let backup1 = backup_path(path, 1);
    let should_restore = match (fs::metadata(path), fs::metadata(&backup1)) {
        (Ok(current), Ok(backup)) => {
            let current_mtime = current.modified().map_err(|e| io_err(path, e))?;
            let backup_mtime = backup.modified().map_err(|e| io_err(&backup1, e))?;
            backup_mtime > current_mtime
        }
        (Err(_), Ok(_)) => true,
        _ => false,
    };

    if should_restore {
        let _ = fs::remove_file(path);
        fs::rename(&backup1, path).map_err(|e| io_err(&backup1, e))?;
    }

    fs::remove_file(&marker).map_err(|e| io_err(&marker, e))
}

/// Append-only sink with optional size-triggered rotation.
///
/// `max_size_bytes: None` disables rotation entirely (the file grows
/// unbounded, matching `--file-output` with no rotation flags).
pub struct RotatingSink {
    path: PathBuf,
    file: File,
    raw: bool,
    max_size_bytes: Option<u64>,
    max_backups: usize,
    current_size: u64,
}

impl RotatingSink {
    pub fn open(
        path: PathBuf,
        raw: bool,
        max_size_bytes: Option<u64>,
        max_backups: usize,
    ) -> Result<Self, SinkError> {
        recover_stale_rotation(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        let current_size = file.metadata().map_err(|e| io_err(&path, e))?.len();
        Ok(Self {
            path,
            file,
            raw,
            max_size_bytes,
            max_backups,
            current_size,
        })
    }

    /// Append one message, rotating first if it would push the file past
    /// `max_size_bytes`. `raw` sinks write `message.content` verbatim;
    /// otherwise the whole message is written as a JSON line.
    pub fn write_message(&mut self, message: &Message) -> Result<(), SinkError> {
        let mut line = if self.raw {
            message.content.clone()
        } else {
            serde_json::to_string(message)?
        };
        line.push('\n');

        if let Some(max) = self.max_size_bytes {
            if self.current_size + line.len() as u64 > max && self.current_size > 0 {
                self.rotate()?;
            }
        }

        self.file
            .write_all(line.as_bytes())
            .map_err(|e| io_err(&self.path, e))?;
        self.current_size += line.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), SinkError> {
        let marker = rotating_marker_path(&self.path);
        File::create(&marker).map_err(|e| io_err(&marker, e))?;

        for i in (1..=self.max_backups).rev() {
            let from = backup_path(&self.path, i);
            if i == self.max_backups {
                let _ = fs::remove_file(&from);
            } else if from.exists() {
                let to = backup_path(&self.path, i + 1);
                fs::rename(&from, &to).map_err(|e| io_err(&from, e))?;
            }
        }

        if self.max_backups > 0 {
            fs::rename(&self.path, backup_path(&self.path, 1)).map_err(|e| io_err(&self.path, e))?;
        } else {
            fs::remove_file(&self.path).map_err(|e| io_err(&self.path, e))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;
        self.current_size = 0;

        fs::remove_file(&marker).map_err(|e| io_err(&marker, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdy_protocol::{LogType, MessageOrigin};
    use std::io::Read;
    use std::time::Duration;

    fn msg(id: &str, content: &str) -> Message {
        Message::new(id.to_owned(), LogType::Stdout, content.to_owned(), 0, MessageOrigin::default())
    }

    #[test]
    fn raw_sink_writes_content_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut sink = RotatingSink::open(path.clone(), true, None, 0).unwrap();
        sink.write_message(&msg("1", "hello")).unwrap();
        sink.write_message(&msg("2", "world")).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello\nworld\n");
    }

    #[test]
    fn json_sink_writes_full_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut sink = RotatingSink::open(path.clone(), false, None, 0).unwrap();
        sink.write_message(&msg("1", "hello")).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(contents.trim_end()).unwrap();
        assert_eq!(parsed["content"], "hello");
    }

    #[test]
    fn rotation_shifts_backups_and_resets_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut sink = RotatingSink::open(path.clone(), true, Some(10), 2).unwrap();
        for i in 0..5 {
            sink.write_message(&msg(&i.to_string(), "0123456789")).unwrap();
        }
        assert!(backup_path(&path, 1).exists());
        assert!(path.exists());
    }

    #[test]
    fn stale_marker_restores_newer_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let backup1 = backup_path(&path, 1);
        // written in order, so backup1's mtime already follows path's
        fs::write(&path, "stale-current\n").unwrap();
        std::thread::sleep(Duration::from_millis(10));
        fs::write(&backup1, "good-backup\n").unwrap();
        File::create(rotating_marker_path(&path)).unwrap();

        RotatingSink::open(path.clone(), true, None, 1).unwrap();
        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "good-backup\n");
        assert!(!rotating_marker_path(&path).exists());
    }

    #[test]
    fn backup_path_preserves_extension() {
        let base = Path::new("/var/log/app.log");
        assert_eq!(backup_path(base, 1), Path::new("/var/log/app.1.log"));
        let noext = Path::new("/var/log/app");
        assert_eq!(backup_path(noext, 2), Path::new("/var/log/app.2"));
    }
}
