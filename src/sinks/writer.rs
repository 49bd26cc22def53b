//! Sink over any `std::io::Write`

use super::Sink;
use crate::core::{LoggerError, Result};
use crate::formatters::Rendered;
use std::io::Write;

/// Line sink wrapping an arbitrary writer
///
/// Closing flushes and drops the writer.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::sinks::{Sink, WriterSink};
/// use rust_dispatch_logger::formatters::Rendered;
///
/// let mut sink = WriterSink::new(Vec::new());
/// sink.write(&Rendered::Text("hello".into())).unwrap();
/// assert_eq!(sink.get_ref().unwrap(), b"hello\n");
/// ```
pub struct WriterSink<W: Write + Send> {
    writer: Option<W>,
    name: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            name: "writer".to_string(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The wrapped writer, or `None` once closed
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, rendered: &Rendered) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink_closed(self.name.as_str()))?;
        let line = rendered.to_line()?;
        writeln!(writer, "{}", line)?;
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

    #[test]
    fn test_structured_written_as_json_line() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write(&Rendered::Structured(serde_json::json!({"a": 1})))
            .unwrap();
        assert_eq!(sink.get_ref().unwrap(), b"{\"a\":1}\n");
    }

    #[test]
    fn test_write_after_close_fails() {
        let mut sink = WriterSink::new(Vec::new()).with_name("buffer");
        sink.close().unwrap();
        sink.close().unwrap();

        let err = sink.write(&Rendered::Text("late".into())).unwrap_err();
        assert!(matches!(err, LoggerError::SinkClosed { ref sink } if sink == "buffer"));
        assert!(sink.is_closed());
    }
}
