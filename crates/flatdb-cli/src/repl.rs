//! Interactive REPL (Read-Eval-Print-Loop) for FlatDB.
//!
//! Provides an interactive command shell with history, line editing and
//! completion of command words and table names.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use tracing::{debug, error};

use crate::session::{confirm_prompt, is_yes, Confirm, Outcome, Session};

/// The REPL prompt shown when waiting for input.
const PROMPT: &str = "flatdb> ";

/// Words offered by tab completion.
const KEYWORDS: &[&str] = &[
    "create_table",
    "drop_table",
    "list_tables",
    "insert",
    "into",
    "values",
    "select",
    "from",
    "where",
    "update",
    "set",
    "delete",
    "info",
    "help",
    "exit",
    "int",
    "bool",
    "string",
];

/// REPL helper for rustyline.
struct ReplHelper {
    /// Known table names, refreshed after every command.
    tables: Vec<String>,
}

impl ReplHelper {
    fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    fn candidates<'a>(&'a self, word: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        KEYWORDS
            .iter()
            .copied()
            .chain(self.tables.iter().map(String::as_str))
            .filter(move |candidate| candidate.starts_with(word))
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Find the word being typed
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',' || c == ':')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word = &line[start..pos];
        let matches = self
            .candidates(word)
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

type ReplEditor = Editor<ReplHelper, DefaultHistory>;

/// Confirms destructive commands through the line editor.
struct EditorConfirm<'a>(&'a mut ReplEditor);

impl Confirm for EditorConfirm<'_> {
    fn confirm(&mut self, action: &str) -> bool {
        match self.0.readline(&confirm_prompt(action)) {
            Ok(answer) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

/// Interactive REPL for FlatDB.
pub struct Repl {
    /// Command execution.
    session: Session,
    /// The rustyline editor.
    editor: ReplEditor,
    /// History file path.
    history_file: Option<PathBuf>,
}

impl Repl {
    /// Creates a new REPL instance.
    pub fn new(session: Session, history_file: Option<PathBuf>, history_size: usize) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(history_size)?
            .build();

        let mut editor: ReplEditor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper::new(session.table_names())));

        if let Some(ref path) = history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    debug!("Failed to load history: {}", e);
                }
            }
        }

        Ok(Self {
            session,
            editor,
            history_file,
        })
    }

    /// Prints the welcome banner.
    pub fn print_banner(&self) {
        let db = self.session.database();
        println!("FlatDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "Database at {} ({} tables)",
            db.config().root().display(),
            db.list_tables().len()
        );
        println!(
            "Output format: {}, timing {}",
            self.session.format(),
            if self.session.timing() { "on" } else { "off" }
        );
        println!("Type help for commands, \\q to quit.\n");
    }

    /// Runs the main REPL loop.
    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    let mut confirm = EditorConfirm(&mut self.editor);
                    if self.session.execute_line(line, &mut confirm, &mut stdout)? == Outcome::Exit {
                        break;
                    }

                    let tables = self.session.table_names();
                    if let Some(helper) = self.editor.helper_mut() {
                        helper.tables = tables;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("exit");
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    break;
                }
            }
        }

        self.save_history();
        println!("Goodbye!");
        Ok(())
    }

    /// Saves command history.
    fn save_history(&mut self) {
        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = self.editor.save_history(path) {
                debug!("Failed to save history: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates() {
        let helper = ReplHelper::new(vec!["users".to_string(), "uploads".to_string()]);

        let found: Vec<&str> = helper.candidates("up").collect();
        assert_eq!(found, vec!["update", "uploads"]);

        let found: Vec<&str> = helper.candidates("se").collect();
        assert_eq!(found, vec!["select", "set"]);

        assert_eq!(helper.candidates("").count(), KEYWORDS.len() + 2);
    }
}
