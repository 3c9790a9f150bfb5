//! Claude command palette engine: discovery, registration, and dispatch.
//!
//! Commands are flat markdown files under `.claude/commands/`; skills are
//! directories under `.claude/skills/` carrying a `SKILL.md` manifest. Both
//! tiers (project and user) are scanned into a single action list, registered
//! under stable identifiers, and dispatched to the Claude CLI through a
//! shared terminal session.

pub mod discover;
pub mod frontmatter;
pub mod registry;
pub mod terminal;
pub mod types;
#[cfg(feature = "file-watcher")]
pub mod watcher;
