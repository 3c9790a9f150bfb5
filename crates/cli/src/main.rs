use std::path::PathBuf;

use {
    anyhow::Result,
    clap::{Parser, Subcommand, ValueEnum},
    palette_actions::{
        discover::{ActionDiscoverer, FsActionDiscoverer, SearchPaths},
        registry::{ActionPalette, PaletteEntry, action_id, action_title, invocation_line},
        terminal::default_terminal,
        types::{ActionKind, ActionScope},
        watcher::{ActionWatchEvent, ActionWatcher},
    },
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "palette",
    about = "Claude command palette — discover and run .claude commands and skills"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Project root holding a `.claude` directory (defaults to the current
    /// directory).
    #[arg(long, global = true, env = "PALETTE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Scan the user-level tree only, as if no project were open.
    #[arg(long, global = true, default_value_t = false)]
    no_project: bool,

    /// Override the user-level `.claude` base directory.
    #[arg(long, global = true, env = "PALETTE_USER_DIR")]
    user_dir: Option<PathBuf>,

    /// Claude CLI binary named in invocation lines.
    #[arg(long, global = true, env = "PALETTE_CLAUDE_BIN", default_value = "claude")]
    claude_bin: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the currently discoverable commands and skills.
    List {
        /// Emit the action list as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch one action to the shared Claude terminal session.
    Run {
        /// Action name, or a full `claude-palette.run.*` identifier.
        name: String,
        /// Restrict the match to one action kind.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Restrict the match to one scope.
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
    },
    /// Show details for actions with the given name.
    Info { name: String },
    /// Re-run discovery and registration once and report the action count.
    Refresh,
    /// Watch the discovery directories and keep the palette in sync.
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Command,
    Skill,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Project,
    User,
}

impl From<KindArg> for ActionKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Command => Self::Command,
            KindArg::Skill => Self::Skill,
        }
    }
}

impl From<ScopeArg> for ActionScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Project => Self::Project,
            ScopeArg::User => Self::User,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Resolve the four discovery directories from the CLI flags.
fn search_paths(cli: &Cli) -> Result<SearchPaths> {
    let project_root = if cli.no_project {
        None
    } else {
        match cli.project_dir.clone() {
            Some(dir) => Some(dir),
            None => Some(std::env::current_dir()?),
        }
    };

    let user_base = match cli.user_dir.clone() {
        Some(dir) => dir,
        None => SearchPaths::default_user_base()
            .ok_or_else(|| anyhow::anyhow!("could not resolve the home directory"))?,
    };

    Ok(SearchPaths::new(project_root.as_deref(), &user_base))
}

/// One discovery + registration cycle.
async fn refreshed_palette(cli: &Cli, discoverer: &FsActionDiscoverer) -> Result<ActionPalette> {
    let actions = discoverer.discover().await?;
    let mut palette = ActionPalette::new(&cli.claude_bin);
    palette.sync(actions);
    Ok(palette)
}

async fn handle_list(cli: &Cli, discoverer: &FsActionDiscoverer, json: bool) -> Result<()> {
    let palette = refreshed_palette(cli, discoverer).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(palette.entries())?);
        return Ok(());
    }
    if palette.is_empty() {
        println!("No Claude commands or skills found.");
        return Ok(());
    }
    for entry in palette.entries() {
        println!("  {}  [{}]", entry.title, entry.id);
        if let Some(description) = &entry.action.description {
            println!("      {description}");
        }
    }
    Ok(())
}

async fn handle_run(
    cli: &Cli,
    discoverer: &FsActionDiscoverer,
    name: &str,
    kind: Option<KindArg>,
    scope: Option<ScopeArg>,
) -> Result<()> {
    let palette = refreshed_palette(cli, discoverer).await?;

    let kind = kind.map(ActionKind::from);
    let scope = scope.map(ActionScope::from);
    let matches: Vec<&PaletteEntry> = palette
        .entries()
        .iter()
        .filter(|entry| {
            entry.id == name
                || (entry.action.name == name
                    && kind.is_none_or(|k| entry.action.kind == k)
                    && scope.is_none_or(|s| entry.action.scope == s))
        })
        .collect();

    match matches.as_slice() {
        [] => println!("No Claude command or skill named '{name}' found."),
        [entry] => {
            let terminal = default_terminal();
            palette.dispatch(&entry.id, terminal.as_ref())?;
            println!("Running Claude: {}", entry.action.name);
        },
        many => {
            println!("'{name}' matches more than one action:");
            for entry in many {
                println!("  {}  [{}]", entry.title, entry.id);
            }
            println!("Narrow it down with --kind/--scope, or pass the full identifier.");
        },
    }
    Ok(())
}

async fn handle_info(cli: &Cli, discoverer: &FsActionDiscoverer, name: &str) -> Result<()> {
    let actions = discoverer.discover().await?;
    let matched: Vec<_> = actions.iter().filter(|a| a.name == name).collect();
    if matched.is_empty() {
        println!("No Claude command or skill named '{name}' found.");
        return Ok(());
    }

    for action in matched {
        println!("Name:        {}", action.name);
        println!("Kind:        {}", action.kind);
        println!("Scope:       {}", action.scope);
        println!("Identifier:  {}", action_id(action));
        println!("Title:       {}", action_title(action));
        println!("Invocation:  {}", invocation_line(action, &cli.claude_bin));
        if let Some(description) = &action.description {
            println!("Description: {description}");
        }
        println!("Path:        {}", action.source_path.display());
        println!();
    }
    Ok(())
}

async fn handle_watch(
    cli: &Cli,
    paths: SearchPaths,
    discoverer: &FsActionDiscoverer,
) -> Result<()> {
    let mut palette = refreshed_palette(cli, discoverer).await?;
    println!("Registered {} actions.", palette.len());

    let (_watcher, mut rx) = ActionWatcher::start(paths.existing_dirs())?;
    println!("Watching for command and skill changes. Ctrl-C to stop.");

    while let Some(ActionWatchEvent::Changed) = rx.recv().await {
        match discoverer.discover().await {
            Ok(actions) => {
                palette.sync(actions);
                println!("Registered {} actions.", palette.len());
            },
            Err(e) => warn!(error = %e, "discovery failed, keeping previous registrations"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "palette starting");

    let paths = search_paths(&cli)?;
    let discoverer = FsActionDiscoverer::new(paths.clone());

    match &cli.command {
        Commands::List { json } => handle_list(&cli, &discoverer, *json).await,
        Commands::Run { name, kind, scope } => {
            handle_run(&cli, &discoverer, name, *kind, *scope).await
        },
        Commands::Info { name } => handle_info(&cli, &discoverer, name).await,
        Commands::Refresh => {
            let palette = refreshed_palette(&cli, &discoverer).await?;
            println!("Registered {} actions.", palette.len());
            Ok(())
        },
        Commands::Watch => handle_watch(&cli, paths, &discoverer).await,
    }
}
