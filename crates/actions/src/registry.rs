//! Action registration and dispatch.
//!
//! Every discovery pass is followed by a registration cycle: the palette
//! tears down all previously registered handlers and registers one handler
//! per discovered action, keyed by a stable identifier. Dispatch resolves the
//! identifier and sends the action's invocation line to a terminal session,
//! fire and forget; nothing about the CLI's outcome is awaited.

use std::collections::HashMap;

use {
    anyhow::Result,
    serde::Serialize,
    tracing::{info, warn},
};

use crate::{
    terminal::Terminal,
    types::{ActionKind, ActionScope, DiscoveredAction},
};

/// Namespace prefix of every registered action identifier.
pub const ID_PREFIX: &str = "claude-palette";

/// Derive the globally-unique identifier for an action:
/// `claude-palette.run.<kind>.<scope>.<name>`.
pub fn action_id(action: &DiscoveredAction) -> String {
    format!(
        "{ID_PREFIX}.run.{}.{}.{}",
        action.kind, action.scope, action.name
    )
}

/// Derive the human-readable palette title for an action.
pub fn action_title(action: &DiscoveredAction) -> String {
    match (action.kind, action.scope) {
        (ActionKind::Skill, _) => format!("Use skill: {}", action.name),
        (ActionKind::Command, ActionScope::Project) => {
            format!("Run project command: {}", action.name)
        },
        (ActionKind::Command, ActionScope::User) => format!("Run user command: {}", action.name),
    }
}

/// The one line of text sent to the terminal session for an action.
pub fn invocation_line(action: &DiscoveredAction, claude_bin: &str) -> String {
    match action.kind {
        ActionKind::Command => format!("{claude_bin} /{}:{}", action.scope, action.name),
        ActionKind::Skill => format!("{claude_bin} \"use {} skill\"", action.name),
    }
}

/// A registered dispatch handler: delivers one action's invocation to a
/// terminal session.
type HandlerFn = Box<dyn Fn(&dyn Terminal) -> Result<()> + Send + Sync>;

/// One palette entry, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub id: String,
    pub title: String,
    pub action: DiscoveredAction,
}

/// The registered action set.
///
/// Owned state, threaded explicitly through the registration cycle: the
/// entries and handlers are replaced wholesale by [`sync`](Self::sync), never
/// patched incrementally, so the palette always mirrors the latest discovery
/// pass.
pub struct ActionPalette {
    claude_bin: String,
    entries: Vec<PaletteEntry>,
    handlers: HashMap<String, HandlerFn>,
}

impl ActionPalette {
    /// `claude_bin` is the CLI binary named in every invocation line.
    pub fn new(claude_bin: impl Into<String>) -> Self {
        Self {
            claude_bin: claude_bin.into(),
            entries: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Run a full registration cycle: release every previous registration,
    /// then register one handler per action.
    ///
    /// Releasing is idempotent: syncing twice with an unchanged set leaves
    /// the palette value-equal. Duplicate (kind, scope, name) tuples resolve
    /// deterministically: the later registration wins and the overwrite is
    /// logged.
    pub fn sync(&mut self, actions: Vec<DiscoveredAction>) {
        self.entries.clear();
        self.handlers.clear();

        for action in actions {
            let id = action_id(&action);
            let title = action_title(&action);

            if let Some(shadowed) = self.entries.iter().position(|entry| entry.id == id) {
                warn!(
                    id = %id,
                    kept = %action.source_path.display(),
                    shadowed = %self.entries[shadowed].action.source_path.display(),
                    "duplicate action identifier; later registration wins"
                );
                self.entries.remove(shadowed);
            }

            let line = invocation_line(&action, &self.claude_bin);
            let name = action.name.clone();
            self.handlers.insert(
                id.clone(),
                Box::new(move |terminal| {
                    terminal.show()?;
                    terminal.send_line(&line)?;
                    info!(action = %name, "dispatched to Claude session");
                    Ok(())
                }),
            );
            self.entries.push(PaletteEntry { id, title, action });
        }
    }

    /// Dispatch a registered action to the given terminal session.
    ///
    /// Identifiers not present in the latest cycle (including ones whose
    /// backing file has since been deleted) are an error.
    pub fn dispatch(&self, id: &str, terminal: &dyn Terminal) -> Result<()> {
        let handler = self
            .handlers
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("no action registered for '{id}'"))?;
        handler(terminal)
    }

    /// Current entries in presentation order.
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
