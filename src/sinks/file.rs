//! File sink implementation

use super::Sink;
use crate::core::{LoggerError, Result};
use crate::formatters::Rendered;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-mode file sink; missing parent directories are created
///
/// Every line is flushed as it is written.
pub struct FileSink {
    path: PathBuf,
    name: String,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            name: path.display().to_string(),
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Open `path` for appending, creating parent directories first
pub(crate) fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::io_operation(
                "open log file",
                format!("Failed to open '{}'", path.display()),
                e,
            )
        })
}

impl Sink for FileSink {
    fn write(&mut self, rendered: &Rendered) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink_closed(self.name.as_str()))?;
        let line = rendered.to_line()?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
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
    use tempfile::TempDir;

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/app.log");

        let mut sink = FileSink::new(&path).unwrap();
        sink.write(&Rendered::Text("hello".into())).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "first\n").unwrap();

        let mut sink = FileSink::new(&path).unwrap();
        sink.write(&Rendered::Text("second".into())).unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(dir.path().join("app.log")).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.write(&Rendered::Text("late".into())),
            Err(LoggerError::SinkClosed { .. })
        ));
    }
}
