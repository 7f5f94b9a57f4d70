use std::io::{self, Stderr, Stdout, Write};

use colored::Colorize;

use crate::failure::FailureKind;

pub const SEE_HELP: &str = "See --help for available actions.";

const FAILURE_HEADER: &str = "An error occurred. Error info below:";

/// Terminal output for one command run.
///
/// Write errors are ignored: there is nowhere left to report them.
#[derive(Debug)]
pub struct Console<O, E> {
    pub out: O,
    pub err: E,
}

impl Console<Stdout, Stderr> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub const fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn success(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message.green());
    }

    pub fn line(&mut self, message: &str) {
        let _ = writeln!(self.out, "{message}");
    }

    /// Reports a validation or usage problem.
    pub fn die(&mut self, message: &str) {
        let _ = writeln!(self.err, "{}", message.cyan());
    }

    pub fn hint(&mut self, message: &str) {
        let _ = writeln!(self.err, "{message}");
    }

    /// Reports an execution failure; the last line is the bare failure tag.
    pub fn failure(&mut self, kind: FailureKind, message: &str) {
        let _ = writeln!(self.err, "{}", FAILURE_HEADER.red());
        let _ = writeln!(self.err, "{message}");
        let _ = writeln!(self.err, "{}", kind.tag());
    }
}
