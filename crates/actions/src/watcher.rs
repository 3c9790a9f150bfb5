//! Filesystem watcher for the command and skill directories.
//!
//! Watches the discovery directories (and their subtrees) for markdown
//! create/modify/delete events and coalesces everything inside a debounce
//! window into a single change signal; consumers react by re-running a full
//! discovery pass, never by diffing. The watcher is created once at startup
//! and lives for the whole process: a project root that appears later is not
//! picked up, a constraint inherited from the host environment.

use std::path::PathBuf;

use {
    anyhow::Result,
    notify_debouncer_full::{
        DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache, new_debouncer,
        notify::{EventKind, RecursiveMode},
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

/// Events emitted by the action watcher.
#[derive(Debug, Clone)]
pub enum ActionWatchEvent {
    /// Some command file or skill manifest was created, modified, or deleted.
    Changed,
}

/// Returns true when the event touches a markdown file — either a flat
/// command file or a `SKILL.md` manifest.
fn touches_markdown(event: &DebouncedEvent) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".md"))
    })
}

/// Watches discovery directories for markdown changes with debouncing.
pub struct ActionWatcher {
    _debouncer: Debouncer<notify_debouncer_full::notify::RecommendedWatcher, RecommendedCache>,
}

impl ActionWatcher {
    /// Start watching the given directories. Returns the watcher and a
    /// receiver for change signals.
    ///
    /// Directories that do not exist are skipped; pass the output of
    /// [`crate::discover::SearchPaths::existing_dirs`]. The watcher must be
    /// kept alive (not dropped) for signals to continue.
    pub fn start(dirs: Vec<PathBuf>) -> Result<(Self, mpsc::UnboundedReceiver<ActionWatchEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(
            std::time::Duration::from_millis(500),
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let mut changed = false;
                    for event in events.iter().filter(|e| touches_markdown(e)) {
                        debug!(paths = ?event.paths, "action watcher event");
                        changed = true;
                    }
                    if changed {
                        let _ = tx.send(ActionWatchEvent::Changed);
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "action watcher error");
                    }
                },
            },
        )?;

        let mut watcher = Self {
            _debouncer: debouncer,
        };

        for dir in dirs.iter().filter(|dir| dir.exists()) {
            watcher._debouncer.watch(dir, RecursiveMode::Recursive)?;
            info!(dir = %dir.display(), "action watcher: watching directory");
        }

        Ok((watcher, rx))
    }
}
