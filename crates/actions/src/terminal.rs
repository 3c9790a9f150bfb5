//! One-way delivery of invocation lines to a shared terminal session.
//!
//! Dispatch needs exactly one capability from its environment: "submit this
//! line of text to the Claude session". The [`Terminal`] trait captures that
//! seam so the registry stays testable without a real terminal; the concrete
//! backings are a named reusable tmux session when tmux is installed, and a
//! throwaway shell child otherwise.

use std::process::{Command, Stdio};

use {
    anyhow::{Context, Result, bail},
    tracing::{debug, info},
};

/// Name of the shared session every dispatch reuses.
pub const SESSION_NAME: &str = "claude-palette";

/// One-way message send into a terminal session.
pub trait Terminal: Send + Sync {
    /// Submit a single line of text to the session. Fire and forget: the
    /// line's outcome is never awaited or surfaced.
    fn send_line(&self, line: &str) -> Result<()>;

    /// Make the session visible to the user.
    fn show(&self) -> Result<()>;
}

/// Pick the terminal backing for this host: the named tmux session when tmux
/// is available, a throwaway shell child otherwise.
pub fn default_terminal() -> Box<dyn Terminal> {
    if which::which("tmux").is_ok() {
        Box::new(TmuxTerminal::new(SESSION_NAME))
    } else {
        debug!("tmux not found, falling back to ephemeral dispatch");
        Box::new(EphemeralTerminal)
    }
}

/// A named, reusable tmux session shared by every dispatch.
///
/// Created on demand and never torn down by this process; its lifecycle
/// belongs to the user and the host.
pub struct TmuxTerminal {
    session: String,
}

impl TmuxTerminal {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    fn ensure_session(&self) -> Result<()> {
        let has = Command::new("tmux")
            .args(["has-session", "-t", &self.session])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to probe for the tmux session")?;
        if has.success() {
            return Ok(());
        }

        let created = Command::new("tmux")
            .args(["new-session", "-d", "-s", &self.session])
            .status()
            .context("failed to create the tmux session")?;
        if !created.success() {
            bail!("tmux new-session exited with {created}");
        }
        debug!(session = %self.session, "created tmux session");
        Ok(())
    }
}

impl Terminal for TmuxTerminal {
    fn send_line(&self, line: &str) -> Result<()> {
        self.ensure_session()?;
        // The line goes through as a literal argument; tmux types it and
        // presses Enter.
        let status = Command::new("tmux")
            .args(["send-keys", "-t", &self.session, line, "Enter"])
            .status()
            .context("failed to send keys to the tmux session")?;
        if !status.success() {
            bail!("tmux send-keys exited with {status}");
        }
        Ok(())
    }

    fn show(&self) -> Result<()> {
        self.ensure_session()?;
        // A detached session cannot be forced onto the user's screen; the
        // attach hint is the visibility we can offer.
        info!(session = %self.session, "attach with: tmux attach -t {}", self.session);
        Ok(())
    }
}

/// Fallback when tmux is missing: every line gets its own detached shell
/// child with inherited output.
pub struct EphemeralTerminal;

impl Terminal for EphemeralTerminal {
    fn send_line(&self, line: &str) -> Result<()> {
        let shell = std::env::var("SHELL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "/bin/sh".to_string());
        Command::new(shell)
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn a shell for the invocation")?;
        Ok(())
    }

    fn show(&self) -> Result<()> {
        Ok(())
    }
}

/// Test double that records sent lines instead of reaching a terminal.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingTerminal {
    lines: std::sync::Mutex<Vec<String>>,
    shown: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl RecordingTerminal {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn shown(&self) -> bool {
        self.shown.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl Terminal for RecordingTerminal {
    fn send_line(&self, line: &str) -> Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn show(&self) -> Result<()> {
        self.shown.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
