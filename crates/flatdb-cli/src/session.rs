//! Command execution against an open database.
//!
//! A `Session` turns command lines into database calls and writes what the
//! user sees. The presentation concerns live here, around the calls:
//!
//! - core errors are rendered by kind and never end the session
//! - `drop_table` and `delete` ask for confirmation first
//! - `insert` and `select` report their elapsed time when timing is on

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use flatdb_common::{FlatError, FlatResult};
use flatdb_store::{ColumnType, Database};

use crate::commands::{help_text, MetaCommand};
use crate::formatter::{format_records, format_schema, format_table_list, OutputFormat};
use crate::parser::{Statement, StatementParser};

const CANCELLED: &str = "Operation cancelled.";

/// What the caller should do after a line ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Read the next line.
    Continue,
    /// Stop reading input.
    Exit,
}

/// Answers "are you sure" questions for destructive commands.
pub trait Confirm {
    /// Returns true if `action` may proceed.
    fn confirm(&mut self, action: &str) -> bool;
}

/// Confirms everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _action: &str) -> bool {
        true
    }
}

/// Asks on stdout and reads the answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, action: &str) -> bool {
        print!("{}", confirm_prompt(action));
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

/// Returns the confirmation question for `action`.
pub fn confirm_prompt(action: &str) -> String {
    format!("Are you sure you want to \"{action}\"? [y/n]: ")
}

/// Only `y` confirms; anything else cancels.
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Renders a database error for the user.
pub fn render_error(err: &FlatError) -> String {
    match err {
        FlatError::TableNotFound { table } | FlatError::StorageNotFound { table, .. } => {
            format!("Error: table or column '{table}' not found.")
        }
        FlatError::ColumnNotFound { column, .. } => {
            format!("Error: table or column '{column}' not found.")
        }
        FlatError::TableExists { .. } => format!("Error: {err}."),
        _ if err.is_validation() => format!("Validation error: {err}"),
        _ => format!("Unexpected error: {err}"),
    }
}

/// An interactive or scripted session on one database.
#[derive(Debug)]
pub struct Session {
    db: Database,
    parser: StatementParser,
    format: OutputFormat,
    timing: bool,
    confirm_destructive: bool,
    failures: usize,
}

impl Session {
    /// Creates a session with timing and confirmations enabled.
    pub fn new(db: Database, format: OutputFormat) -> Result<Self> {
        Ok(Self {
            db,
            parser: StatementParser::new()?,
            format,
            timing: true,
            confirm_destructive: true,
            failures: 0,
        })
    }

    /// Enables or disables elapsed-time reports.
    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.timing = enabled;
        self
    }

    /// Enables or disables confirmation of destructive commands.
    pub fn with_confirmation(mut self, enabled: bool) -> Self {
        self.confirm_destructive = enabled;
        self
    }

    /// Returns the database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the current output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns true if timing is reported.
    pub fn timing(&self) -> bool {
        self.timing
    }

    /// Returns how many commands failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Returns the names of all tables.
    pub fn table_names(&self) -> Vec<String> {
        self.db.list_tables().into_iter().map(str::to_string).collect()
    }

    /// Runs one input line and writes its output.
    ///
    /// Only failures to write `out` are returned as errors.
    pub fn execute_line<W: Write>(
        &mut self,
        line: &str,
        confirm: &mut dyn Confirm,
        out: &mut W,
    ) -> io::Result<Outcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }

        if MetaCommand::is_meta(line) {
            return self.execute_meta(MetaCommand::parse(line), out);
        }

        match self.parser.parse(line) {
            Ok(statement) => self.execute(statement, confirm, out),
            Err(e) => {
                self.failures += 1;
                writeln!(out, "Error: {e}")?;
                Ok(Outcome::Continue)
            }
        }
    }

    /// Executes a parsed statement.
    pub fn execute<W: Write>(
        &mut self,
        statement: Statement,
        confirm: &mut dyn Confirm,
        out: &mut W,
    ) -> io::Result<Outcome> {
        debug!(?statement, "executing statement");

        match statement {
            Statement::Exit => return Ok(Outcome::Exit),
            Statement::Help => writeln!(out, "{}", help_text().trim_end())?,
            Statement::ListTables => {
                let listing = format_table_list(&self.db.list_tables(), self.format);
                writeln!(out, "{listing}")?;
            }
            Statement::CreateTable { table, columns } => {
                let result = self
                    .create_table(&table, columns)
                    .map(|()| format!("Table '{table}' created."));
                self.report(out, result, None)?;
            }
            Statement::DropTable { table } => {
                if !self.confirmed(confirm, "drop_table") {
                    writeln!(out, "{CANCELLED}")?;
                } else {
                    let result = self
                        .db
                        .drop_table(&table)
                        .map(|()| format!("Table '{table}' dropped."));
                    self.report(out, result, None)?;
                }
            }
            Statement::Insert { table, values } => {
                let start = Instant::now();
                let result = self.db.insert(&table, &values).map(|record| {
                    format!("Record with ID={} added to table '{table}'.", record.id())
                });
                self.report(out, result, Some(("insert", start)))?;
            }
            Statement::Select { table, predicate } => {
                let start = Instant::now();
                let result = self
                    .db
                    .select(&table, predicate.as_ref())
                    .and_then(|records| {
                        let schema = self.db.describe_table(&table)?;
                        Ok(format_records(schema, &records, self.format))
                    });
                self.report(out, result, Some(("select", start)))?;
            }
            Statement::Update {
                table,
                column,
                value,
                predicate,
            } => {
                let result = self
                    .db
                    .update(&table, &column, &value, &predicate)
                    .map(|n| format!("Updated records: {n}"));
                self.report(out, result, None)?;
            }
            Statement::Delete { table, predicate } => {
                if !self.confirmed(confirm, "delete") {
                    writeln!(out, "{CANCELLED}")?;
                } else {
                    let result = self
                        .db
                        .delete(&table, &predicate)
                        .map(|n| format!("Deleted records: {n}"));
                    self.report(out, result, None)?;
                }
            }
            Statement::Info { table } => {
                let result = self
                    .db
                    .describe_table(&table)
                    .map(|schema| format_schema(&table, schema, self.format));
                self.report(out, result, None)?;
            }
        }

        Ok(Outcome::Continue)
    }

    fn create_table(&mut self, table: &str, columns: Vec<(String, String)>) -> FlatResult<()> {
        let columns = columns
            .into_iter()
            .map(|(name, ty)| Ok((name, ty.parse::<ColumnType>()?)))
            .collect::<FlatResult<Vec<_>>>()?;
        self.db.create_table(table, columns)
    }

    fn confirmed(&self, confirm: &mut dyn Confirm, action: &str) -> bool {
        !self.confirm_destructive || confirm.confirm(action)
    }

    /// Writes a command's result, or its rendered error, then the timing
    /// line for timed commands that succeeded.
    fn report<W: Write>(
        &mut self,
        out: &mut W,
        result: FlatResult<String>,
        timed: Option<(&str, Instant)>,
    ) -> io::Result<()> {
        match result {
            Ok(text) => {
                writeln!(out, "{text}")?;
                if let (true, Some((name, start))) = (self.timing, timed) {
                    writeln!(
                        out,
                        "Function {name} executed in {:.3} seconds",
                        start.elapsed().as_secs_f64()
                    )?;
                }
            }
            Err(e) => {
                self.failures += 1;
                debug!(error = %e, code = e.code().as_u16(), "command failed");
                writeln!(out, "{}", render_error(&e))?;
            }
        }
        Ok(())
    }

    fn execute_meta<W: Write>(&mut self, command: MetaCommand, out: &mut W) -> io::Result<Outcome> {
        match command {
            MetaCommand::Quit => return Ok(Outcome::Exit),
            MetaCommand::Help => writeln!(out, "{}", help_text().trim_end())?,
            MetaCommand::Timing => {
                self.timing = !self.timing;
                let state = if self.timing { "on" } else { "off" };
                writeln!(out, "Timing is {state}.")?;
            }
            MetaCommand::Format(None) => writeln!(out, "Output format is {}.", self.format)?,
            MetaCommand::Format(Some(name)) => match name.parse::<OutputFormat>() {
                Ok(format) => {
                    self.format = format;
                    writeln!(out, "Output format set to {format}.")?;
                }
                Err(e) => {
                    self.failures += 1;
                    writeln!(out, "Error: {e}")?;
                }
            },
            MetaCommand::Cache => {
                if self.db.cache_enabled() {
                    writeln!(
                        out,
                        "Query cache: {} of {} entries used\n{}",
                        self.db.cached_results(),
                        self.db.config().cache.capacity,
                        self.db.cache_stats()
                    )?;
                } else {
                    writeln!(out, "Query cache is disabled.")?;
                }
            }
            MetaCommand::ClearCache => {
                self.db.clear_cache();
                writeln!(out, "Query cache cleared.")?;
            }
            MetaCommand::Version => {
                writeln!(out, "FlatDB CLI v{}", env!("CARGO_PKG_VERSION"))?;
            }
            MetaCommand::Unknown(name) => {
                self.failures += 1;
                writeln!(out, "Unknown command '\\{name}'. Type \\? for help.")?;
            }
        }
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers confirmations from a fixed script.
    struct Scripted(Vec<bool>);

    impl Confirm for Scripted {
        fn confirm(&mut self, _action: &str) -> bool {
            self.0.pop().unwrap_or(false)
        }
    }

    fn session() -> Session {
        Session::new(Database::open_memory().unwrap(), OutputFormat::Table)
            .unwrap()
            .with_timing(false)
    }

    fn run(session: &mut Session, line: &str) -> String {
        run_with(session, line, &mut AssumeYes)
    }

    fn run_with(session: &mut Session, line: &str, confirm: &mut dyn Confirm) -> String {
        let mut out = Vec::new();
        session.execute_line(line, confirm, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_scenario() {
        let mut s = session();

        assert_eq!(
            run(&mut s, "create_table users name:string age:int"),
            "Table 'users' created.\n"
        );
        assert_eq!(
            run(&mut s, r#"insert into users values ("Ann", 30)"#),
            "Record with ID=1 added to table 'users'.\n"
        );
        assert_eq!(
            run(&mut s, "insert into users values (Bo, 25)"),
            "Record with ID=2 added to table 'users'.\n"
        );

        let found = run(&mut s, "select from users where name = Ann");
        assert!(found.contains("Ann"));
        assert!(!found.contains("Bo"));
        assert!(found.contains("(1 row)"));

        assert_eq!(
            run(&mut s, "update users set age = 31 where name = Ann"),
            "Updated records: 1\n"
        );
        assert_eq!(
            run(&mut s, "delete from users where age = 31"),
            "Deleted records: 1\n"
        );
        assert!(run(&mut s, "info users").contains("Records: 1"));
        assert_eq!(s.failures(), 0);
    }

    #[test]
    fn test_error_rendering() {
        let mut s = session();
        run(&mut s, "create_table users name:string age:int");

        assert_eq!(
            run(&mut s, "select from ghost"),
            "Error: table or column 'ghost' not found.\n"
        );
        assert_eq!(
            run(&mut s, "update users set email = x where name = Ann"),
            "Error: table or column 'email' not found.\n"
        );
        assert_eq!(
            run(&mut s, "insert into users values (Ann, thirty)"),
            "Validation error: invalid value 'thirty' for column 'age' of type int\n"
        );
        assert!(run(&mut s, "create_table t a:float").starts_with("Validation error: unknown column type"));
        assert_eq!(
            run(&mut s, "create_table users x:int"),
            "Error: table 'users' already exists.\n"
        );
        assert!(run(&mut s, "insert into users").starts_with("Error: invalid insert syntax"));
        assert!(run(&mut s, "frobnicate").starts_with("Error: unknown command 'frobnicate'"));
        assert_eq!(s.failures(), 7);
    }

    #[test]
    fn test_render_unexpected() {
        let err = FlatError::internal("boom");
        assert_eq!(render_error(&err), "Unexpected error: internal error: boom");
    }

    #[test]
    fn test_confirmation() {
        let mut s = session();
        run(&mut s, "create_table users name:string");
        run(&mut s, "insert into users values (Ann)");

        let mut refuse = Scripted(vec![false]);
        assert_eq!(
            run_with(&mut s, "delete from users where name = Ann", &mut refuse),
            "Operation cancelled.\n"
        );
        assert_eq!(
            run_with(&mut s, "drop_table users", &mut Scripted(vec![])),
            "Operation cancelled.\n"
        );
        assert_eq!(s.table_names(), vec!["users"]);

        assert_eq!(
            run_with(&mut s, "drop_table users", &mut Scripted(vec![true])),
            "Table 'users' dropped.\n"
        );
        assert!(s.table_names().is_empty());
    }

    #[test]
    fn test_confirmation_disabled() {
        let mut s = session().with_confirmation(false);
        run(&mut s, "create_table users name:string");

        assert_eq!(
            run_with(&mut s, "drop_table users", &mut Scripted(vec![])),
            "Table 'users' dropped.\n"
        );
    }

    #[test]
    fn test_timing() {
        let mut s = session().with_timing(true);
        run(&mut s, "create_table users name:string");

        let out = run(&mut s, "insert into users values (Ann)");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Function insert executed in "));
        assert!(lines[1].ends_with(" seconds"));

        assert!(run(&mut s, "select from users").contains("Function select executed in "));
        assert!(!run(&mut s, "info users").contains("executed in"));
        assert!(!run(&mut s, "select from ghost").contains("executed in"));
    }

    #[test]
    fn test_meta_commands() {
        let mut s = session();

        assert_eq!(run(&mut s, "\\timing"), "Timing is on.\n");
        assert!(s.timing());
        assert_eq!(run(&mut s, "\\format json"), "Output format set to json.\n");
        assert_eq!(s.format(), OutputFormat::Json);
        assert!(run(&mut s, "\\format xml").starts_with("Error: unknown format"));
        assert!(run(&mut s, "\\cache").starts_with("Query cache: 0 of 64 entries used"));
        assert_eq!(run(&mut s, "\\cache clear"), "Query cache cleared.\n");

        let mut out = Vec::new();
        assert_eq!(
            s.execute_line("\\q", &mut AssumeYes, &mut out).unwrap(),
            Outcome::Exit
        );
        assert_eq!(
            s.execute_line("exit", &mut AssumeYes, &mut out).unwrap(),
            Outcome::Exit
        );
    }

    #[test]
    fn test_json_output() {
        let mut s = session();
        run(&mut s, "create_table flags on:bool");
        run(&mut s, "insert into flags values (yes)");
        run(&mut s, "\\format json");

        let out = run(&mut s, "select from flags");
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["on"], serde_json::json!(true));
    }

    #[test]
    fn test_list_tables() {
        let mut s = session();
        assert_eq!(run(&mut s, "list_tables"), "No tables.\n");
        run(&mut s, "create_table b x:int");
        run(&mut s, "create_table a x:int");
        assert_eq!(run(&mut s, "list_tables"), "Tables:\n - b\n - a\n");
    }

    #[test]
    fn test_confirm_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes("Y"));
        assert!(!is_yes("yes"));
        assert!(!is_yes(""));
        assert_eq!(
            confirm_prompt("delete"),
            "Are you sure you want to \"delete\"? [y/n]: "
        );
    }
}
