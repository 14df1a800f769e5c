/// Output formatting for the CLI
///
/// Reports go to stdout (or any writer in tests) either as human-readable
/// text or as pretty-printed JSON for scripting. Progress and logs never
/// go through here; they use stderr.
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,

    /// Pretty-printed JSON document
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Writer on stdout
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writer(format, Box::new(io::stdout()))
    }

    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write>) -> Self {
        Self { format, writer }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write `value` as JSON, or the text produced by `render`
    pub fn emit<T, F>(&mut self, value: &T, render: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => {
                writeln!(self.writer, "{}", serde_json::to_string_pretty(value)?)?;
            }
            OutputFormat::Text => {
                let text = render(value);
                write!(self.writer, "{}", text)?;
                if !text.ends_with('\n') {
                    writeln!(self.writer)?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared buffer so the test can read what the writer produced
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emit_json_and_text() {
        let captured = Captured::default();
        let mut json = OutputWriter::with_writer(OutputFormat::Json, Box::new(captured.clone()));
        json.emit(&vec![1, 2], |_| unreachable!()).unwrap();
        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "[\n  1,\n  2\n]\n");

        let captured = Captured::default();
        let mut text = OutputWriter::with_writer(OutputFormat::Text, Box::new(captured.clone()));
        text.emit(&3, |n| format!("three = {n}")).unwrap();
        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "three = 3\n");
    }
}
