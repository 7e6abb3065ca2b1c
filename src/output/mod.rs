use console::style;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Width of the `=` / `-` rules framing reports
pub const RULE_WIDTH: usize = 80;

type Sink = Mutex<Box<dyn Write + Send>>;

/// User-facing console output.
///
/// Every adapter writes through a `Reporter` instead of printing directly, so the
/// same code runs against the terminal or an in-memory buffer.
pub struct Reporter {
    out: Sink,
    err: Sink,
    styled_out: bool,
    styled_err: bool,
}

impl Reporter {
    /// Reporter bound to the process stdout/stderr
    pub fn stdio() -> Self {
        Self::from_sinks(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            console::colors_enabled(),
            console::colors_enabled_stderr(),
        )
    }

    /// Reporter writing into memory, with handles to read what was written
    pub fn in_memory() -> (Self, Captured) {
        let captured = Captured::default();
        let reporter = Self::from_sinks(
            Box::new(captured.stdout.clone()),
            Box::new(captured.stderr.clone()),
            false,
            false,
        );
        (reporter, captured)
    }

    fn from_sinks(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        styled_out: bool,
        styled_err: bool,
    ) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
            styled_out,
            styled_err,
        }
    }

    /// `ℹ message` on stdout
    pub fn info(&self, message: impl Display) {
        let prefix = if self.styled_out { style("ℹ").blue().to_string() } else { "ℹ".to_string() };
        self.write_out(format_args!("{} {}\n", prefix, message));
    }

    /// `✓ message` on stdout
    pub fn success(&self, message: impl Display) {
        let prefix = if self.styled_out { style("✓").green().to_string() } else { "✓".to_string() };
        self.write_out(format_args!("{} {}\n", prefix, message));
    }

    /// `Error: message` on stderr
    pub fn error(&self, message: impl Display) {
        let prefix = if self.styled_err {
            style("Error:").for_stderr().red().bold().to_string()
        } else {
            "Error:".to_string()
        };
        self.write_err(format_args!("{} {}\n", prefix, message));
    }

    /// Plain line on stdout
    pub fn line(&self, message: impl Display) {
        self.write_out(format_args!("{}\n", message));
    }

    /// Full-width rule made of `ch`
    pub fn rule(&self, ch: char) {
        self.line(ch.to_string().repeat(RULE_WIDTH));
    }

    fn write_out(&self, args: std::fmt::Arguments<'_>) {
        let mut out = lock(&self.out);
        let _ = out.write_fmt(args);
        let _ = out.flush();
    }

    fn write_err(&self, args: std::fmt::Arguments<'_>) {
        let mut err = lock(&self.err);
        let _ = err.write_fmt(args);
        let _ = err.flush();
    }
}

fn lock(sink: &Sink) -> MutexGuard<'_, Box<dyn Write + Send>> {
    sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared in-memory buffer
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captured output of an in-memory reporter
#[derive(Clone, Default)]
pub struct Captured {
    pub stdout: MemorySink,
    pub stderr: MemorySink,
}

impl Captured {
    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    pub fn stderr(&self) -> String {
        self.stderr.contents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefix_follows_stderr_styling() {
        let captured = Captured::default();
        let reporter = Reporter::from_sinks(
            Box::new(captured.stdout.clone()),
            Box::new(captured.stderr.clone()),
            true,
            false,
        );

        reporter.error("boom");
        assert_eq!(captured.stderr(), "Error: boom\n");
    }

    #[test]
    fn test_prefixes_and_streams() {
        let (reporter, captured) = Reporter::in_memory();
        reporter.info("Fetching");
        reporter.success("Done");
        reporter.error("Broken");

        assert_eq!(captured.stdout(), "ℹ Fetching\n✓ Done\n");
        assert_eq!(captured.stderr(), "Error: Broken\n");
    }

    #[test]
    fn test_rule_width() {
        let (reporter, captured) = Reporter::in_memory();
        reporter.rule('=');
        assert_eq!(captured.stdout().trim_end().len(), RULE_WIDTH);
    }
}
