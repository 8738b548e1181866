//! Sigex CLI - Command-line interface for sigex
//!
//! Provides `sigex config collab`, `sigex config api`, `sigex config extensions`
//! and the type listings. The `config collab edit <api>` subcommands are
//! generated at startup from the registered collab schemas.

mod commands;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sigex_core::command::CommandSurface;
use sigex_core::extension::ExtensionCatalog;
use sigex_core::storage::Database;
use sigex_core::{Settings, SigexError};

use commands::api::ApiCommands;
use commands::collab::CollabCommands;
use commands::extensions::ExtensionCommands;
use commands::types::ListAction;

const DATA_DIR_FLAG: &str = "--data-dir";
const DB_FILE: &str = "sigex.db";

#[derive(Parser)]
#[command(name = "sigex")]
#[command(about = "sigex - signal exchange configuration")]
#[command(version)]
struct Cli {
    /// Directory holding the sigex database (default: $SIGEX_HOME or ~/.sigex)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Create, edit, list and delete collaborations (lists by default)
    Collab {
        #[command(subcommand)]
        action: Option<CollabCommands>,
    },
    /// View available signal types
    Signal {
        #[arg(value_enum, default_value = "list")]
        action: ListAction,
    },
    /// View available content types
    Content {
        #[arg(value_enum, default_value = "list")]
        action: ListAction,
    },
    /// Configure and view available signal exchange APIs
    Api {
        #[command(subcommand)]
        action: Option<ApiCommands>,
    },
    /// Manage extension modules
    Extensions {
        #[command(subcommand)]
        action: ExtensionCommands,
    },
}

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    init_logging(args.iter().any(|a| a == "-v" || a == "--verbose"));

    let data_dir = match get_data_dir(data_dir_arg(&args)) {
        Ok(dir) => dir,
        Err(e) => exit_with(e.as_ref()),
    };
    let db = match open_database(&data_dir) {
        Ok(db) => db,
        Err(e) => exit_with(e.as_ref()),
    };
    let settings = match Settings::load(&db, ExtensionCatalog::builtin()) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    let surfaces = match settings.apis().surfaces() {
        Ok(surfaces) => surfaces,
        Err(e) => exit_with(&e),
    };
    let command = match commands::collab::with_edit_surfaces(Cli::command(), &surfaces) {
        Ok(command) => command,
        Err(e) => exit_with(&e),
    };
    let matches = command.try_get_matches_from(args).unwrap_or_else(|e| e.exit());
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    debug!(
        flag = ?cli.data_dir,
        data_dir = %data_dir.display(),
        verbose = cli.verbose,
        "Parsed command line"
    );

    let result = match cli.command {
        Commands::Config { action } => run_config_command(action, &settings, &surfaces, &matches),
    };
    if let Err(e) = result {
        exit_with(e.as_ref());
    }
}

fn run_config_command(
    action: ConfigCommands,
    settings: &Settings<'_>,
    surfaces: &[CommandSurface],
    matches: &clap::ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigCommands::Collab { action } => commands::collab::execute(
            action.unwrap_or(CollabCommands::List),
            settings,
            surfaces,
            matches,
        ),
        ConfigCommands::Signal { action } => commands::types::execute_signal(action, settings),
        ConfigCommands::Content { action } => commands::types::execute_content(action, settings),
        ConfigCommands::Api { action } => commands::api::execute(action, settings),
        ConfigCommands::Extensions { action } => commands::extensions::execute(action, settings),
    }
}

/// Initialise stderr logging: `RUST_LOG` wins, then `--verbose`, else warnings only
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print the error and exit with its code
fn exit_with(e: &(dyn std::error::Error + 'static)) -> ! {
    eprintln!("Error: {e}");
    let code = e.downcast_ref::<SigexError>().map_or(1, SigexError::exit_code);
    std::process::exit(code);
}

/// `--data-dir` has to be known before the full command can be built
fn data_dir_arg(args: &[OsString]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let arg = arg.to_string_lossy();
        if arg == "--" {
            break;
        }
        if arg == DATA_DIR_FLAG {
            return iter.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--data-dir=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

/// Resolve the data directory: flag, then `SIGEX_HOME`, then `~/.sigex`
fn get_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os("SIGEX_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    // Try HOME first (Unix), then USERPROFILE (Windows)
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or("HOME or USERPROFILE environment variable not set")?;
    Ok(home.join(".sigex"))
}

fn open_database(data_dir: &std::path::Path) -> Result<Database, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    Ok(Database::open(&data_dir.join(DB_FILE))?)
}
