use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Which tier an action was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionScope {
    /// Workspace-local: `<project>/.claude/`.
    Project,
    /// Global: `~/.claude/`.
    User,
}

/// What backs an action on disk, and how it is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A flat markdown file, invoked with slash syntax.
    Command,
    /// A directory with a `SKILL.md` manifest, invoked by name.
    Skill,
}

impl fmt::Display for ActionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::User => write!(f, "user"),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Skill => write!(f, "skill"),
        }
    }
}

/// A single invokable palette action.
///
/// Instances are value objects rebuilt from disk on every discovery pass and
/// discarded wholesale on the next one; identity comes from the
/// (kind, scope, name) tuple, never from `source_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredAction {
    /// File stem (commands) or manifest name with a directory-name fallback
    /// (skills).
    pub name: String,
    pub scope: ActionScope,
    pub kind: ActionKind,
    /// Originating file, kept for diagnostics only.
    pub source_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
