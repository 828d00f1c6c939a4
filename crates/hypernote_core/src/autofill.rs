//! Sources for values derived during note autofill.
//!
//! # Responsibility
//! - Detect a tool's version by running it.
//! - Provide the current timestamp for new actions.
//!
//! # Invariants
//! - A version probe never blocks longer than `VERSION_PROBE_GRACE`; hung
//!   children are killed.

use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How long a version probe may run before it is killed.
pub const VERSION_PROBE_GRACE: Duration = Duration::from_millis(500);
const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(20);
const VERSION_FLAGS: &[&str] = &["--version", "-V"];

/// Values autofill may derive from the outside world.
pub trait AutofillSource {
    /// First line of the tool's version output, if it can be detected.
    fn detect_version(&self, cmd: &str) -> Option<String>;
    /// Current time as a parseable timestamp string.
    fn timestamp(&self) -> String;
}

/// Autofill backed by child processes and the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAutofill;

impl AutofillSource for SystemAutofill {
    fn detect_version(&self, cmd: &str) -> Option<String> {
        let cmd = cmd.trim();
        if cmd.is_empty() {
            return None;
        }
        let started_at = Instant::now();
        for flag in VERSION_FLAGS {
            if let Some(version) = probe(cmd, flag) {
                debug!(
                    "event=version_detect module=autofill status=ok flag={} duration_ms={}",
                    flag,
                    started_at.elapsed().as_millis()
                );
                return Some(version);
            }
        }
        debug!(
            "event=version_detect module=autofill status=error duration_ms={} error_code=no_version",
            started_at.elapsed().as_millis()
        );
        None
    }

    fn timestamp(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn probe(cmd: &str, flag: &str) -> Option<String> {
    let mut child = match Command::new(cmd)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            debug!(
                "event=version_detect module=autofill status=error flag={} error_code=spawn_failed error={}",
                flag, err
            );
            return None;
        }
    };

    let deadline = Instant::now() + VERSION_PROBE_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() < deadline => thread::sleep(PROBE_POLL_INTERVAL),
            Ok(None) => {
                warn!(
                    "event=version_detect module=autofill status=error flag={} error_code=probe_timeout",
                    flag
                );
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Err(err) => {
                warn!(
                    "event=version_detect module=autofill status=error flag={} error_code=wait_failed error={}",
                    flag, err
                );
                let _ = child.kill();
                return None;
            }
        }
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    first_line(&output.stdout).or_else(|| first_line(&output.stderr))
}

fn first_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
