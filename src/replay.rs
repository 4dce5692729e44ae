// SPDX-License-Identifier: MIT

//! Replay recorder (C5): writes a `scriptreplay`-compatible transcript and
//! timing file pair for a session, so an operator can later replay exactly
//! what was sent to the terminal and when.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Derived on-disk paths for one session's replay artifacts.
#[derive(Debug, Clone)]
pub struct ReplayPaths {
    pub data_path: PathBuf,
    pub typescript_file: PathBuf,
    pub timing_file: PathBuf,
}

impl ReplayPaths {
    pub fn new(session_data_root: &Path, session_id: &str) -> Self {
        let data_path = session_data_root.join(session_id);
        Self {
            typescript_file: data_path.join("typescript"),
            timing_file: data_path.join("timing.txt"),
            data_path,
        }
    }
}

/// Recorder for one session's transcript + timing files.
///
/// `record` must be called with only the bytes destined for the client (the
/// valid-UTF-8 prefix already carved off by the byte classifier), in the
/// same order they were written to the WebSocket.
pub struct ReplayRecorder {
    typescript_file: File,
    timing_file: File,
    last_record_at: Instant,
}

impl ReplayRecorder {
    pub fn create(paths: &ReplayPaths) -> std::io::Result<Self> {
        std::fs::create_dir_all(&paths.data_path)?;

        let mut typescript_file = File::create(&paths.typescript_file)?;
        writeln!(typescript_file, "Script started on {}", humantime_now())?;

        let timing_file = match File::create(&paths.timing_file) {
            Ok(f) => f,
            Err(e) => {
                drop(typescript_file);
                return Err(e);
            }
        };

        Ok(Self { typescript_file, timing_file, last_record_at: Instant::now() })
    }

    /// Append `data` to the transcript and its elapsed-time/length line to
    /// the timing file.
    pub fn record(&mut self, data: &[u8]) -> std::io::Result<()> {
        let now = Instant::now();
        let delay = now.duration_since(self.last_record_at);
        self.last_record_at = now;

        self.typescript_file.write_all(data)?;
        writeln!(self.timing_file, "{:.6} {}", delay.as_secs_f64(), data.len())?;
        Ok(())
    }

    pub fn close(mut self) -> std::io::Result<()> {
        writeln!(self.typescript_file, "Script done on {}", humantime_now())?;
        self.typescript_file.flush()?;
        self.timing_file.flush()?;
        Ok(())
    }
}

/// A `date`(1)-like rendering good enough for a human reading the transcript
/// header; `scriptreplay` itself ignores these lines.
fn humantime_now() -> String {
    let now = std::time::SystemTime::now();
    let since_epoch =
        now.duration_since(std::time::UNIX_EPOCH).unwrap_or(std::time::Duration::ZERO);
    format!("{}", since_epoch.as_secs())
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
