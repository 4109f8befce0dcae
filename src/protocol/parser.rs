//! FTP command parsing
//!
//! Splits a raw command line into a verb, an optional first argument,
//! and a count of trailing tokens. Every supported command takes zero
//! or one argument, so a non-zero trailing count always signals a
//! malformed call.

/// An FTP command parsed from one client input line.
///
/// Recreated for every line; never persisted across commands.
#[derive(Debug, PartialEq, Eq)]
pub struct Command {
    /// First token, upper-cased for case-insensitive dispatch
    pub verb: String,
    /// Second token, verbatim (empty if absent)
    pub arg: String,
    /// Number of tokens strictly after the second
    pub extra_args: usize,
}

impl Command {
    /// Shape check for commands taking exactly one argument.
    pub fn has_one_arg(&self) -> bool {
        !self.arg.is_empty() && self.extra_args == 0
    }

    /// Shape check for commands taking no arguments.
    pub fn has_no_args(&self) -> bool {
        self.arg.is_empty() && self.extra_args == 0
    }
}

/// Parses a raw command line (CRLF already stripped) into a `Command`.
///
/// Tokenizes on whitespace; the argument is left as-is since paths are
/// case-sensitive. An empty line yields an empty verb, which dispatch
/// treats as unrecognized.
pub fn parse_command(raw: &str) -> Command {
    let mut parts = raw.split_whitespace();
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").to_string();
    let extra_args = parts.count();

    Command {
        verb,
        arg,
        extra_args,
    }
}
