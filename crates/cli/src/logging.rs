//! Tracing setup: stderr plus a size-rotated log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Append-only log file that rolls over at a size limit.
///
/// On rollover `app.log` becomes `app.log.1`, `app.log.1` becomes
/// `app.log.2`, and so on; the oldest backup beyond `backups` is removed.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Mutex::new(State { file, written }),
        })
    }

    fn backup(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut State) -> io::Result<()> {
        state.file.flush()?;
        if self.backups == 0 {
            state.file = File::create(&self.path)?;
        } else {
            for n in (1..self.backups).rev() {
                let from = self.backup(n);
                if from.exists() {
                    std::fs::rename(&from, self.backup(n + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup(1))?;
            state.file = append(&self.path)?;
        }
        state.written = 0;
        Ok(())
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        let incoming = buf.len() as u64;
        if state.written > 0 && state.written + incoming > self.max_bytes {
            self.rotate(&mut state)?;
        }
        state.file.write_all(buf)?;
        state.written += incoming;
        Ok(buf.len())
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writer handed out per event.
pub struct RotatingWriter<'a>(&'a RotatingFile);

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.state.lock() {
            Ok(mut state) => state.file.flush(),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter(self)
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `config.level`. With `log_file` set, every event is
/// also appended to it without ANSI colours.
pub fn init(config: &LoggingConfig, log_file: Option<&Path>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Logging(format!("invalid level '{}': {e}", config.level)))?,
    };

    let stderr = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_thread_names(true);

    let file = match log_file {
        Some(path) => {
            let writer = RotatingFile::open(path, config.max_bytes, config.backups).map_err(|e| {
                Error::Logging(format!("cannot open log file {}: {e}", path.display()))
            })?;
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                    .with_thread_names(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(file: &RotatingFile, line: &str) {
        file.make_writer().write_all(line.as_bytes()).unwrap();
    }

    #[test]
    fn rolls_over_past_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("server.log");
        let file = RotatingFile::open(&path, 16, 2).unwrap();

        write(&file, "first line\n");
        write(&file, "second line\n");
        write(&file, "third line\n");
        write(&file, "fourth line\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fourth line\n");
        assert_eq!(std::fs::read_to_string(file.backup(1)).unwrap(), "third line\n");
        assert_eq!(std::fs::read_to_string(file.backup(2)).unwrap(), "second line\n");
        assert!(!file.backup(3).exists());
    }

    #[test]
    fn appends_to_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.log");
        std::fs::write(&path, "old\n").unwrap();

        let file = RotatingFile::open(&path, 1024, 1).unwrap();
        write(&file, "new\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.log");
        let file = RotatingFile::open(&path, 8, 0).unwrap();

        write(&file, "aaaaaa\n");
        write(&file, "bbbbbb\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "bbbbbb\n");
        assert!(!file.backup(1).exists());
    }
}
