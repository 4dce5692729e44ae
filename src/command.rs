// SPDX-License-Identifier: MIT

//! Command entity and risky-command detection.
//!
//! Every completed line of input (terminated by the client sending CR) is
//! recorded as a `Command` and checked against a fixed denylist of
//! regular expressions. A match fires an alert through the `Alerter`
//! collaborator (see `collab.rs`) without blocking the shell.

use std::sync::LazyLock;

use regex::Regex;

/// A single command line the user submitted inside a session.
#[derive(Debug, Clone)]
pub struct Command {
    pub session_id: String,
    pub user: String,
    pub content: String,
}

impl Command {
    pub fn new(session_id: impl Into<String>, user: impl Into<String>, content: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), user: user.into(), content: content.into() }
    }

    pub fn is_risky(&self) -> bool {
        is_risky(&self.content)
    }
}

/// Word-boundary-matched patterns covering: credential/password editing,
/// permission relaxation, network sniffing, reverse shells, history
/// clearing, destructive removals, and system shutdown.
static RISKY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // credential/password editing
        r"\bpasswd\b",
        r"\bvipw\b",
        r"\bvigr\b",
        // permission relaxation
        r"\bchmod\b",
        r"\bchown\b",
        // network sniffing
        r"\btcpdump\b",
        r"\bwireshark\b",
        r"\bngrep\b",
        // reverse shells
        r"\bnc\b.*-e\b",
        r"\bbash\s+-i\s*>&\s*/dev/tcp\b",
        // history clearing
        r"\bhistory\s+-c\b",
        r">\s*~?/?\.bash_history\b",
        r"\bunset\s+HISTFILE\b",
        // destructive removals
        r"\brm\s+-rf\s+/\*?\b",
        r"\bmkfs\b",
        r"\bdd\s+if=.*\s+of=/dev/",
        // shutdown
        r"\bshutdown\b",
        r"\breboot\b",
        r"\bhalt\b",
        r"\binit\s+0\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("risky command pattern is valid"))
    .collect()
});

/// Whether `content` matches any pattern in the risky-command denylist.
pub fn is_risky(content: &str) -> bool {
    RISKY_PATTERNS.iter().any(|re| re.is_match(content))
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
