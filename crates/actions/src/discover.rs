use std::path::{Path, PathBuf};

use {anyhow::Result, async_trait::async_trait, tracing::warn};

use crate::{
    frontmatter::{self, Frontmatter},
    types::{ActionKind, ActionScope, DiscoveredAction},
};

/// Manifest file that marks a subdirectory as a skill.
pub const SKILL_MANIFEST: &str = "SKILL.md";

/// The four discovery locations, in presentation order.
///
/// The project pair exists only when a project root is known; the user pair
/// always resolves, whether or not the directories exist on disk.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    pub project_commands: Option<PathBuf>,
    pub user_commands: PathBuf,
    pub project_skills: Option<PathBuf>,
    pub user_skills: PathBuf,
}

impl SearchPaths {
    /// Resolve directories from an optional project root and the user-level
    /// `.claude` base directory.
    pub fn new(project_root: Option<&Path>, user_base: &Path) -> Self {
        let claude = |root: &Path, leaf: &str| root.join(".claude").join(leaf);
        Self {
            project_commands: project_root.map(|r| claude(r, "commands")),
            user_commands: user_base.join("commands"),
            project_skills: project_root.map(|r| claude(r, "skills")),
            user_skills: user_base.join("skills"),
        }
    }

    /// Default user base: `~/.claude`.
    pub fn default_user_base() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".claude"))
    }

    /// The subset of directories that exist on disk right now; this is the
    /// set handed to the change watcher.
    pub fn existing_dirs(&self) -> Vec<PathBuf> {
        [
            self.project_commands.as_deref(),
            Some(self.user_commands.as_path()),
            self.project_skills.as_deref(),
            Some(self.user_skills.as_path()),
        ]
        .into_iter()
        .flatten()
        .filter(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .collect()
    }
}

/// Discovers palette actions from filesystem paths.
#[async_trait]
pub trait ActionDiscoverer: Send + Sync {
    /// Scan all locations and return the current action list.
    async fn discover(&self) -> Result<Vec<DiscoveredAction>>;
}

/// Default filesystem-based discoverer.
pub struct FsActionDiscoverer {
    paths: SearchPaths,
}

impl FsActionDiscoverer {
    pub fn new(paths: SearchPaths) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl ActionDiscoverer for FsActionDiscoverer {
    /// The four scans run concurrently; the result is always concatenated in
    /// the fixed order project commands, user commands, project skills, user
    /// skills, each group sorted by name so palette order is reproducible.
    async fn discover(&self) -> Result<Vec<DiscoveredAction>> {
        let (mut project_commands, mut user_commands, mut project_skills, mut user_skills) = tokio::join!(
            scan_commands(self.paths.project_commands.as_deref(), ActionScope::Project),
            scan_commands(Some(self.paths.user_commands.as_path()), ActionScope::User),
            scan_skills(self.paths.project_skills.as_deref(), ActionScope::Project),
            scan_skills(Some(self.paths.user_skills.as_path()), ActionScope::User),
        );

        let mut actions = Vec::new();
        for group in [
            &mut project_commands,
            &mut user_commands,
            &mut project_skills,
            &mut user_skills,
        ] {
            group.sort_by(|a, b| a.name.cmp(&b.name));
            actions.append(group);
        }
        Ok(actions)
    }
}

/// Scan one directory for flat `*.md` command files. Subdirectories are not
/// entered; an unreadable file still yields an action, just without a
/// description.
async fn scan_commands(dir: Option<&Path>, scope: ActionScope) -> Vec<DiscoveredAction> {
    let Some(dir) = dir else {
        return Vec::new();
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        // A missing directory contributes zero actions.
        Err(_) => return Vec::new(),
    };

    let mut actions = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(stem) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".md"))
        else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }

        let description = match tokio::fs::read_to_string(&path).await {
            Ok(content) => frontmatter::parse(&content).description,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable command file");
                None
            },
        };
        actions.push(DiscoveredAction {
            name: stem.to_string(),
            scope,
            kind: ActionKind::Command,
            source_path: path,
            description,
        });
    }
    actions
}

/// Scan one directory for skill subdirectories. A subdirectory qualifies only
/// if it carries a `SKILL.md` manifest; the manifest's `name:` wins over the
/// directory name when present.
async fn scan_skills(dir: Option<&Path>, scope: ActionScope) -> Vec<DiscoveredAction> {
    let Some(dir) = dir else {
        return Vec::new();
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut actions = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let manifest = entry.path().join(SKILL_MANIFEST);
        if !manifest.is_file() {
            continue;
        }
        let Ok(dir_name) = entry.file_name().into_string() else {
            continue;
        };

        let meta = match tokio::fs::read_to_string(&manifest).await {
            Ok(content) => frontmatter::parse(&content),
            Err(e) => {
                warn!(path = %manifest.display(), error = %e, "unreadable skill manifest");
                Frontmatter::default()
            },
        };
        actions.push(DiscoveredAction {
            name: meta.name.unwrap_or(dir_name),
            scope,
            kind: ActionKind::Skill,
            source_path: manifest,
            description: meta.description,
        });
    }
    actions
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn paths_in(root: &Path, with_project: bool) -> SearchPaths {
        let project = with_project.then(|| root.join("project"));
        SearchPaths::new(project.as_deref(), &root.join("home/.claude"))
    }

    fn write_file(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn command_without_frontmatter_has_no_description() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);
        write_file(
            &paths.project_commands.clone().unwrap().join("test-command.md"),
            "# Test Command\nJust instructions.\n",
        );

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "test-command");
        assert_eq!(actions[0].kind, ActionKind::Command);
        assert_eq!(actions[0].scope, ActionScope::Project);
        assert!(actions[0].description.is_none());
    }

    #[tokio::test]
    async fn command_description_comes_from_frontmatter() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), false);
        write_file(
            &paths.user_commands.join("deploy.md"),
            "---\ndescription: Ship it\n---\nSteps.\n",
        );

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].scope, ActionScope::User);
        assert_eq!(actions[0].description.as_deref(), Some("Ship it"));
    }

    #[tokio::test]
    async fn skill_uses_manifest_name_and_description() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);
        write_file(
            &paths.project_skills.clone().unwrap().join("test-skill/SKILL.md"),
            "---\nname: test-skill\ndescription: A test skill for testing\n---\nbody\n",
        );

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "test-skill");
        assert_eq!(actions[0].kind, ActionKind::Skill);
        assert_eq!(actions[0].description.as_deref(), Some("A test skill for testing"));
    }

    #[tokio::test]
    async fn skill_name_falls_back_to_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), false);
        write_file(
            &paths.user_skills.join("unnamed-skill/SKILL.md"),
            "---\ndescription: no name field\n---\n",
        );

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "unnamed-skill");
    }

    #[tokio::test]
    async fn missing_directories_contribute_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn no_project_root_scans_user_tier_only() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), false);
        assert!(paths.project_commands.is_none());
        write_file(&paths.user_commands.join("only-user.md"), "text\n");

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].scope, ActionScope::User);
    }

    #[tokio::test]
    async fn non_markdown_and_nested_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);
        let commands = paths.project_commands.clone().unwrap();
        write_file(&commands.join("notes.txt"), "not a command\n");
        write_file(&commands.join("nested/inner.md"), "not discovered\n");
        write_file(&commands.join("real.md"), "a command\n");

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "real");
    }

    #[tokio::test]
    async fn directories_without_manifest_are_not_skills() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), false);
        write_file(&paths.user_skills.join("not-a-skill/README.md"), "hello\n");

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn groups_keep_fixed_order_and_sort_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);
        write_file(&paths.user_commands.join("zz.md"), "\n");
        write_file(&paths.user_commands.join("aa.md"), "\n");
        write_file(&paths.project_commands.clone().unwrap().join("mid.md"), "\n");
        write_file(&paths.user_skills.join("sk/SKILL.md"), "---\nname: sk\n---\n");

        let actions = FsActionDiscoverer::new(paths).discover().await.unwrap();
        let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
        // Project commands, then user commands sorted by name, then skills.
        assert_eq!(names, vec!["mid", "aa", "zz", "sk"]);
    }

    #[tokio::test]
    async fn deleted_files_vanish_on_the_next_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), false);
        let file = paths.user_commands.join("fleeting.md");
        write_file(&file, "gone soon\n");

        let discoverer = FsActionDiscoverer::new(paths);
        assert_eq!(discoverer.discover().await.unwrap().len(), 1);

        std::fs::remove_file(&file).unwrap();
        assert!(discoverer.discover().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_dirs_filters_to_present_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path(), true);
        std::fs::create_dir_all(&paths.user_commands).unwrap();

        let dirs = paths.existing_dirs();
        assert_eq!(dirs, vec![paths.user_commands.clone()]);
    }
}
