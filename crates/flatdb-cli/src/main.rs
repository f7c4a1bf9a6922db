//! FlatDB Command-Line Interface
//!
//! An interactive shell and script runner for FlatDB databases.
//!
//! # Usage
//!
//! ```bash
//! # Start interactive REPL on the current directory
//! flatdb
//!
//! # Use another data directory
//! flatdb -d /var/lib/flatdb
//!
//! # Execute a single command
//! flatdb -c "select from users where name = Ann"
//!
//! # Execute commands from a file, answering yes to confirmations
//! flatdb -y -f setup.fdb
//!
//! # Output as JSON
//! flatdb -o json -c "select from users"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flatdb_store::Database;

mod commands;
mod config;
mod formatter;
mod parser;
mod repl;
mod session;

use config::CliConfig;
use formatter::OutputFormat;
use repl::Repl;
use session::{AssumeYes, Confirm, Outcome, Session, StdinConfirm};

/// FlatDB command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "flatdb",
    author = "FlatDB Team",
    version,
    about = "Command-line interface for FlatDB",
    long_about = "A command interpreter for FlatDB, a flat-file table store.\n\n\
                  Tables live as JSON files in the data directory. Use this tool\n\
                  interactively, for one-off commands, or to run command files."
)]
struct Args {
    /// Data directory holding db_meta.json and the table files
    #[arg(short = 'd', long, value_name = "DIR", env = "FLATDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute commands from file (one per line) and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Answer "yes" to every confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Disable the query cache
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress banner (for scripting)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
    /// Display raw values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => config.output_format()?,
    };

    let db = Database::open(config.store_config())
        .with_context(|| format!("failed to open database in {}", config.data_dir.display()))?;
    let session = Session::new(db, format)?
        .with_timing(config.timing)
        .with_confirmation(config.confirm_destructive);

    if let Some(command) = &args.command {
        execute_command(session, command, args.yes)
    } else if let Some(file) = &args.file {
        execute_file(session, file, args.yes)
    } else {
        run_repl(session, &config, args.quiet)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("flatdb=debug,flatdb_cli=debug,flatdb_store=debug,flatdb_cache=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    // Command-line arguments win over the file
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if args.no_cache {
        config.cache_capacity = 0;
    }
    if args.yes {
        config.confirm_destructive = false;
    }

    Ok(config)
}

fn confirmer(assume_yes: bool) -> Box<dyn Confirm> {
    if assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    }
}

fn execute_command(mut session: Session, command: &str, assume_yes: bool) -> Result<()> {
    info!("Executing command: {}", command);

    let mut confirm = confirmer(assume_yes);
    session.execute_line(command, confirm.as_mut(), &mut std::io::stdout())?;

    if session.failures() > 0 {
        bail!("command failed");
    }
    Ok(())
}

fn execute_file(mut session: Session, path: &Path, assume_yes: bool) -> Result<()> {
    info!("Executing file: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut confirm = confirmer(assume_yes);
    let mut stdout = std::io::stdout();

    for line in script_lines(&content) {
        if session.execute_line(line, confirm.as_mut(), &mut stdout)? == Outcome::Exit {
            break;
        }
    }

    match session.failures() {
        0 => Ok(()),
        n => bail!("{n} command(s) in {} failed", path.display()),
    }
}

fn run_repl(session: Session, config: &CliConfig, quiet: bool) -> Result<()> {
    let mut repl = Repl::new(session, config.history_path(), config.history_size)?;

    if !quiet {
        repl.print_banner();
    }

    repl.run()
}

/// Returns the command lines of a script, skipping blanks and comments.
fn script_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("--"))
}
