use std::io::Write;
use tracing::warn;

/// Completions between two progress notices.
pub const PROGRESS_INTERVAL: usize = 100;

/// Receives live progress from the controller.
pub trait Progress {
    /// Called each time `completed` reaches a positive multiple of
    /// [`PROGRESS_INTERVAL`].
    fn update(&mut self, completed: usize, total: usize);

    /// Called once when the run has finished, before any report is printed.
    fn finish(&mut self);
}

/// Writes an overwriting `\r`-prefixed progress line.
pub struct ConsoleProgress<W: Write> {
    out: W,
    emitted: bool,
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            emitted: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = write!(self.out, "\r{}", line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Could not write progress line");
        }
    }
}

impl<W: Write> Progress for ConsoleProgress<W> {
    fn update(&mut self, completed: usize, total: usize) {
        self.emitted = true;
        self.write_line(&format!("Completed {} from {} requests", completed, total));
    }

    fn finish(&mut self) {
        // Nothing to clean up if the line was never drawn.
        if self.emitted {
            self.write_line(&" ".repeat(34));
        }
    }
}
