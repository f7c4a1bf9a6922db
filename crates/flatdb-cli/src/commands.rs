//! Special backslash commands for the REPL.
//!
//! Provides `\timing`, `\format`, `\cache`, `\q` and `\?`.

/// A parsed backslash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    /// Quit the REPL.
    Quit,
    /// Show help.
    Help,
    /// Toggle timing.
    Timing,
    /// Show or set the output format.
    Format(Option<String>),
    /// Show query cache statistics.
    Cache,
    /// Drop every cached result.
    ClearCache,
    /// Show version.
    Version,
    /// Unknown command.
    Unknown(String),
}

impl MetaCommand {
    /// Returns true if `input` is a backslash command.
    pub fn is_meta(input: &str) -> bool {
        input.trim_start().starts_with('\\')
    }

    /// Parses a command string.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let cmd = input.strip_prefix('\\').unwrap_or(input);

        let mut parts = cmd.splitn(2, char::is_whitespace);
        let cmd_name = parts.next().unwrap_or_default().to_lowercase();
        let args = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match cmd_name.as_str() {
            "q" | "quit" | "exit" => MetaCommand::Quit,
            "?" | "h" | "help" => MetaCommand::Help,
            "timing" | "t" => MetaCommand::Timing,
            "format" | "f" => MetaCommand::Format(args),
            "cache" => match args.as_deref() {
                Some("clear") => MetaCommand::ClearCache,
                _ => MetaCommand::Cache,
            },
            "version" | "v" => MetaCommand::Version,
            _ => MetaCommand::Unknown(cmd_name),
        }
    }
}

/// Returns help text.
pub fn help_text() -> &'static str {
    r#"FlatDB Commands
===============

Tables:
  create_table <name> <column:type> ...   Create a table (types: int, bool, string)
  drop_table <name>                       Drop a table and its records
  list_tables                             List all tables
  info <name>                             Show columns and record count

Records:
  insert into <name> values (<value>, ...)
  select from <name> [where <column> = <value>]
  update <name> set <column> = <value> where <column> = <value>
  delete from <name> where <column> = <value>

  Conditions compare the stored value as text, so booleans match
  only as lowercase `true` or `false`.

General:
  help                                    Show this help
  exit                                    Exit the program

Display:
  \t, \timing       Toggle timing display
  \f [FORMAT]       Show or set output format (table, json, csv, raw)
  \cache [clear]    Show query cache statistics, or empty the cache
  \v, \version      Show version information
  \q, \quit         Exit the CLI
"#
}
