//! Writable destinations for formatted entries

pub mod console;
pub mod file;
pub mod memory;
pub mod rotating_file;
pub mod writer;

pub use console::{ConsoleSink, ConsoleTarget};
pub use file::FileSink;
pub use memory::MemorySink;
pub use rotating_file::{RotatingFileSink, RotationPolicy, RotationStrategy};
pub use writer::WriterSink;

use crate::core::Result;
use crate::formatters::Rendered;

/// A destination owned by one backend
///
/// Text sinks write each rendered entry as one line. `close` is idempotent;
/// writing after it returns [`LoggerError::SinkClosed`](crate::LoggerError::SinkClosed).
pub trait Sink: Send {
    fn write(&mut self, rendered: &Rendered) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    /// Whether this is the process's stdout or stderr
    fn is_standard_stream(&self) -> bool {
        false
    }
}

impl Sink for Box<dyn Sink> {
    fn write(&mut self, rendered: &Rendered) -> Result<()> {
        (**self).write(rendered)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_standard_stream(&self) -> bool {
        (**self).is_standard_stream()
    }
}

/// How a backend's sink is chosen when no instance is given
///
/// Clones of a `Memory` spec share one buffer; `Path` specs open a new
/// append handle per backend.
#[derive(Debug, Clone, Default)]
pub enum SinkSpec {
    #[default]
    Stdout,
    Stderr,
    Path(std::path::PathBuf),
    Rotating(std::path::PathBuf, RotationPolicy),
    Memory(MemorySink),
    /// `"stdout"` or `"stderr"`, resolved when the sink is opened
    Named(String),
}

impl SinkSpec {
    pub fn path(path: impl Into<std::path::PathBuf>) -> Self {
        SinkSpec::Path(path.into())
    }

    /// Open the destination; unknown names are a configuration error
    pub fn open(&self) -> Result<Box<dyn Sink>> {
        let sink: Box<dyn Sink> = match self {
            SinkSpec::Stdout => Box::new(ConsoleSink::stdout()),
            SinkSpec::Stderr => Box::new(ConsoleSink::stderr()),
            SinkSpec::Path(path) => Box::new(FileSink::new(path.clone())?),
            SinkSpec::Rotating(path, policy) => {
                Box::new(RotatingFileSink::with_policy(path, policy.clone())?)
            }
            SinkSpec::Memory(sink) => Box::new(sink.clone()),
            SinkSpec::Named(name) => match name.trim().to_ascii_lowercase().as_str() {
                "stdout" | "-" => Box::new(ConsoleSink::stdout()),
                "stderr" => Box::new(ConsoleSink::stderr()),
                _ => return Err(crate::core::LoggerError::unsupported_sink(name.as_str())),
            },
        };
        Ok(sink)
    }
}

impl From<MemorySink> for SinkSpec {
    fn from(sink: MemorySink) -> Self {
        SinkSpec::Memory(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_specs() {
        assert_eq!(SinkSpec::Named("STDOUT".into()).open().unwrap().name(), "stdout");
        assert_eq!(SinkSpec::Named("stderr".into()).open().unwrap().name(), "stderr");

        let err = SinkSpec::Named("syslog".into()).open().err().unwrap();
        assert!(matches!(err, crate::LoggerError::UnsupportedSink { ref spec } if spec == "syslog"));
    }

    #[test]
    fn test_memory_spec_shares_buffer() {
        let handle = MemorySink::new();
        let mut sink = SinkSpec::from(handle.clone()).open().unwrap();
        sink.write(&Rendered::Text("x".into())).unwrap();
        assert_eq!(handle.lines(), vec!["x"]);
    }

    #[test]
    fn test_path_spec_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs/app.log");
        let mut sink = SinkSpec::path(&path).open().unwrap();
        sink.write(&Rendered::Text("x".into())).unwrap();
        assert!(path.exists());
    }
}
