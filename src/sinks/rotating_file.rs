//! Rotating file sink
//!
//! Rotation moves the active file to `<name>.1`, shifting older backups up
//! by one and deleting the one past the retention limit. Backups can be
//! gzip-compressed to `<name>.N.gz`.

use super::file::open_append;
use super::Sink;
use crate::core::{LoggerError, Result};
use crate::formatters::Rendered;
use chrono::{DateTime, Local, Timelike};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// When to rotate the active file
///
/// # Examples
///
/// ```
/// use rust_dispatch_logger::sinks::RotationStrategy;
///
/// // Rotate when file exceeds 100 MB
/// let size_strategy = RotationStrategy::Size { max_bytes: 100 * 1024 * 1024 };
///
/// // Rotate daily, at the first write after 2 AM
/// let daily_strategy = RotationStrategy::Daily { hour: 2 };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RotationStrategy {
    /// Rotate when file reaches size in bytes
    Size { max_bytes: u64 },

    /// Rotate on the first write of a new day at or past `hour` (0-23)
    Daily { hour: u8 },

    /// Never rotate
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// Strategy plus retention settings
///
/// # Examples
///
/// ```
/// use rust_dispatch_logger::sinks::{RotationPolicy, RotationStrategy};
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::Daily { hour: 0 })
///     .with_max_backups(7)
///     .with_compression(true);
/// ```
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pub strategy: RotationStrategy,
    /// Maximum number of rotated files to keep
    pub max_backup_files: usize,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            max_backup_files: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for `with_strategy(RotationStrategy::Size { max_bytes })`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backup_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// File sink that rotates according to a [`RotationPolicy`]
///
/// ```no_run
/// use rust_dispatch_logger::sinks::{RotatingFileSink, RotationPolicy};
///
/// let policy = RotationPolicy::new().with_max_size(50 * 1024 * 1024).with_max_backups(3);
/// let sink = RotatingFileSink::with_policy("/var/log/app.log", policy).unwrap();
/// ```
pub struct RotatingFileSink {
    base_path: PathBuf,
    name: String,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    last_rotation: SystemTime,
    closed: bool,
}

impl RotatingFileSink {
    /// Open with the default policy (10 MB, 5 backups)
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        if let RotationStrategy::Daily { hour } = policy.strategy {
            if hour > 23 {
                return Err(LoggerError::config(
                    "RotatingFileSink",
                    format!("daily rotation hour must be 0-23, got {}", hour),
                ));
            }
        }

        let base_path = path.as_ref().to_path_buf();
        let file = open_append(&base_path)?;
        let metadata = file.metadata()?;
        let last_rotation = metadata.modified().unwrap_or_else(|_| SystemTime::now());

        Ok(Self {
            name: base_path.display().to_string(),
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size: metadata.len(),
            last_rotation,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn should_rotate(&self) -> bool {
        match &self.policy.strategy {
            RotationStrategy::Never => false,
            RotationStrategy::Size { max_bytes } => self.current_size >= *max_bytes,
            RotationStrategy::Daily { hour } => {
                let now: DateTime<Local> = Local::now();
                let last: DateTime<Local> = self.last_rotation.into();
                now.date_naive() != last.date_naive() && now.hour() >= u32::from(*hour)
            }
        }
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        if self.policy.max_backup_files == 0 {
            fs::remove_file(&self.base_path).or_else(ignore_missing)?;
        } else {
            let oldest = self.backup_path(self.policy.max_backup_files);
            fs::remove_file(&oldest).or_else(ignore_missing)?;
            fs::remove_file(Self::compressed_path(&oldest)).or_else(ignore_missing)?;

            for i in (1..self.policy.max_backup_files).rev() {
                let from = self.backup_path(i);
                let to = self.backup_path(i + 1);
                let from_gz = Self::compressed_path(&from);
                if from_gz.exists() {
                    fs::rename(&from_gz, Self::compressed_path(&to))?;
                } else if from.exists() {
                    fs::rename(&from, &to)?;
                }
            }

            let first = self.backup_path(1);
            if self.base_path.exists() {
                fs::rename(&self.base_path, &first).map_err(|e| {
                    LoggerError::io_operation(
                        "rotate log file",
                        format!("Failed to move '{}'", self.base_path.display()),
                        e,
                    )
                })?;
                if self.policy.compress {
                    compress_file(&first, &Self::compressed_path(&first))?;
                }
            }
        }

        self.writer = Some(BufWriter::new(open_append(&self.base_path)?));
        self.current_size = 0;
        self.last_rotation = SystemTime::now();
        Ok(())
    }
}

fn ignore_missing(e: std::io::Error) -> std::io::Result<()> {
    if e.kind() == std::io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(e)
    }
}

/// Gzip `path` into `gz_path`, removing the original only on success
fn compress_file(path: &Path, gz_path: &Path) -> Result<()> {
    let mut temp = gz_path.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let result = (|| -> std::io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        std::io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp, gz_path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Sink for RotatingFileSink {
    fn write(&mut self, rendered: &Rendered) -> Result<()> {
        if self.closed {
            return Err(LoggerError::sink_closed(self.name.as_str()));
        }

        if self.should_rotate() {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    self.writer = Some(BufWriter::new(open_append(&self.base_path)?));
                }
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("rotating file writer not initialized"))?;
        let line = rendered.to_line()?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        self.current_size += line.len() as u64 + 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn line(text: &str) -> Rendered {
        Rendered::Text(text.to_string())
    }

    #[test]
    fn test_size_rotation_shifts_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new().with_max_size(10).with_max_backups(2);
        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();

        sink.write(&line("first line")).unwrap();
        sink.write(&line("second line")).unwrap();
        sink.write(&line("third line")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "third line\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), "second line\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.2")).unwrap(), "first line\n");
    }

    #[test]
    fn test_retention_limit_drops_oldest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new().with_max_size(1).with_max_backups(1);
        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();

        for text in ["a", "b", "c"] {
            sink.write(&line(text)).unwrap();
        }

        assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), "b\n");
        assert!(!dir.path().join("app.log.2").exists());
    }

    #[test]
    fn test_compressed_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new()
            .with_max_size(1)
            .with_max_backups(3)
            .with_compression(true);
        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();

        sink.write(&line("compressed")).unwrap();
        sink.write(&line("active")).unwrap();

        let gz = dir.path().join("app.log.1.gz");
        assert!(gz.exists());
        assert!(!dir.path().join("app.log.1").exists());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "compressed\n");
    }

    #[test]
    fn test_never_strategy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new().with_strategy(RotationStrategy::Never);
        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();

        for _ in 0..10 {
            sink.write(&line("entry")).unwrap();
        }
        assert_eq!(sink.current_size(), 60);
        assert!(!dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_invalid_daily_hour() {
        let dir = TempDir::new().unwrap();
        let policy = RotationPolicy::new().with_strategy(RotationStrategy::Daily { hour: 24 });
        let result = RotatingFileSink::with_policy(dir.path().join("app.log"), policy);
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_write_after_close() {
        let dir = TempDir::new().unwrap();
        let mut sink = RotatingFileSink::new(dir.path().join("app.log")).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(matches!(sink.write(&line("x")), Err(LoggerError::SinkClosed { .. })));
    }
}
