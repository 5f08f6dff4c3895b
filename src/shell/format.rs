//! Text rendering of command results

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::errors::ErrorClassification;
use super::types::{CommandOutput, CommandResult};

/// Writes results and error blocks to an output stream.
pub struct Formatter {
    out: Box<dyn Write + Send>,
}

impl Formatter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Formatter writing into a shared in-memory buffer.
    pub fn buffered() -> (Self, OutputBuffer) {
        let buffer = OutputBuffer::default();
        (Self::new(Box::new(buffer.clone())), buffer)
    }

    /// Render `result`; `help` follows the error block of a failed command.
    pub fn render(&mut self, result: &CommandResult, help: Option<&str>) -> io::Result<()> {
        match &result.outcome {
            Ok(output) => self.render_output(output, result.elapsed),
            Err(err) => self.render_error(err, help),
        }?;
        self.out.flush()
    }

    fn render_output(&mut self, output: &CommandOutput, elapsed: Duration) -> io::Result<()> {
        match output {
            CommandOutput::Empty => {}
            CommandOutput::Rows { header, rows } => self.render_rows(header, rows)?,
            CommandOutput::Value(value) => writeln!(self.out, "{}", value)?,
            CommandOutput::Table(table) => writeln!(self.out, "=> {}", table)?,
            CommandOutput::Bulk(report) => {
                for line in report.summary_lines() {
                    writeln!(self.out, "{}", line)?;
                }
            }
        }
        writeln!(self.out, "{}", footer(output.row_count(), elapsed))
    }

    fn render_rows(&mut self, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
        let columns = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut widths = vec![0; columns];
        for line in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        if !header.is_empty() {
            writeln!(self.out, "{}", pad_line(header, &widths))?;
        }
        for row in rows {
            writeln!(self.out, " {}", pad_line(row, &widths))?;
        }
        Ok(())
    }

    fn render_error(&mut self, err: &ErrorClassification, help: Option<&str>) -> io::Result<()> {
        writeln!(self.out, "ERROR: {}", err)?;
        if let Some(frames) = err.backtrace() {
            writeln!(self.out, "Backtrace:")?;
            for frame in frames {
                writeln!(self.out, "\t{}", frame)?;
            }
        }
        if let Some(help) = help {
            writeln!(self.out)?;
            writeln!(self.out, "Here is some help for this command:")?;
            writeln!(self.out, "{}", help)?;
        }
        Ok(())
    }

    /// Write a free-form line (listings, banners).
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            let _ = write!(line, "{:<width$}  ", cell, width = widths[i]);
        }
    }
    line
}

/// `N row(s) in S.SSSS seconds`
pub fn footer(rows: usize, elapsed: Duration) -> String {
    format!("{} row(s) in {:.4} seconds", rows, elapsed.as_secs_f64())
}

/// Printable form of a binary value: printable ASCII as is, every other
/// byte as `\xNN`. A backslash is escaped too, so the output always
/// unescapes to the original bytes.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'\\' {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "\\x{:02X}", b);
        }
    }
    out
}

/// Inverse of [`escape_bytes`]; `\xNN` sequences become raw bytes.
pub fn unescape_bytes(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && bytes[i + 1] == b'x' {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 2]), hex_digit(bytes[i + 3])) {
                out.push(hi << 4 | lo);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}

/// Clonable in-memory sink.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl OutputBuffer {
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output buffer lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::EntityKind;

    fn result(outcome: Result<CommandOutput, ErrorClassification>) -> CommandResult {
        CommandResult {
            command: "list".into(),
            outcome,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_footer_format() {
        assert_eq!(footer(3, Duration::from_millis(1500)), "3 row(s) in 1.5000 seconds");
    }

    #[test]
    fn test_rows_render_header_and_footer() {
        let (mut formatter, buffer) = Formatter::buffered();
        let output = CommandOutput::rows(["TABLE"], vec![vec!["t1".into()], vec!["t2".into()]]);
        formatter.render(&result(Ok(output)), None).unwrap();

        let text = buffer.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "TABLE");
        assert_eq!(lines[1], " t1");
        assert!(lines[3].starts_with("2 row(s) in 0.0120 seconds"));
    }

    #[test]
    fn test_error_block_with_help() {
        let (mut formatter, buffer) = Formatter::buffered();
        let err = ErrorClassification::not_found(EntityKind::Table, "t9");
        formatter
            .render(&result(Err(err)), Some("Drop the named table."))
            .unwrap();

        let text = buffer.contents();
        assert!(text.starts_with("ERROR: Unknown table t9!\n"));
        assert!(text.contains("\n\nHere is some help for this command:\nDrop the named table.\n"));
    }

    #[test]
    fn test_error_block_with_backtrace() {
        let (mut formatter, buffer) = Formatter::buffered();
        let err = ErrorClassification::Unclassified {
            message: "boom".into(),
            backtrace: Some(vec!["frame1".into()]),
        };
        formatter.render(&result(Err(err)), None).unwrap();
        assert_eq!(buffer.contents(), "ERROR: boom\nBacktrace:\n\tframe1\n");
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"abc"), "abc");
        assert_eq!(escape_bytes(&[0, 0, 0, 1]), "\\x00\\x00\\x00\\x01");
        assert_eq!(unescape_bytes("\\x00\\x01z"), vec![0, 1, b'z']);
        assert_eq!(unescape_bytes("plain"), b"plain".to_vec());
    }

    #[test]
    fn test_escape_backslash_is_unambiguous() {
        let stored = b"a\\x41".to_vec();
        let shown = escape_bytes(&stored);
        assert_eq!(shown, "a\\x5Cx41");
        assert_ne!(shown, escape_bytes(b"aA"));
        assert_eq!(unescape_bytes(&shown), stored);
    }
}
