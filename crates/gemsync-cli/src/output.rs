//! Terminal output: run summary and fatal error reports

use std::env;
use std::io::{self, IsTerminal};

use gemsync_core::SyncError;
use gemsync_pipeline::SyncReport;

/// Formats what the binary prints itself; everything else goes through `tracing`
pub struct Output {
    colors: bool,
}

impl Output {
    /// Colors only on a terminal, and never when NO_COLOR is set
    pub fn detect() -> Self {
        let colors = env::var_os("NO_COLOR").is_none()
            && io::stdout().is_terminal()
            && io::stderr().is_terminal();
        Self { colors }
    }

    pub fn plain() -> Self {
        Self { colors: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    pub fn summary(&self, report: &SyncReport) -> String {
        let mark = if report.incomplete() == 0 {
            self.paint("32", "done")
        } else {
            self.paint("33", "done with gaps")
        };
        format!("{}: {}", mark, report)
    }

    /// Error message, then a suggestion when one applies, then every underlying cause
    pub fn error(&self, error: &anyhow::Error) -> String {
        let mut output = format!("{}: {}\n", self.paint("31", "error"), error);

        let suggestion = error
            .downcast_ref::<SyncError>()
            .and_then(SyncError::suggestion);
        if let Some(suggestion) = suggestion {
            output.push_str(&format!("\n{}: {}\n", self.paint("2", "help"), suggestion));
        }

        for cause in error.chain().skip(1) {
            output.push_str(&format!("\n{}: {}", self.paint("2", "caused by"), cause));
        }

        output
    }
}
