//! Terminal output for fanjoin
//!
//! Run results go to stdout unstyled so they can be piped. Everything else (status,
//! warnings, errors) goes to stderr with console styling.

use console::style;

/// Output handler shared by all commands
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a run result. Shown even in quiet mode.
    pub fn result(&self, line: &str) {
        println!("{line}");
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are always shown, even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Only shown with `-v`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if !self.quiet {
            eprintln!("  {:<14} {}", style(key).dim(), value);
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
