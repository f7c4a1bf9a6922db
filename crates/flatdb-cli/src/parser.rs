//! Line-oriented command grammar.
//!
//! Each input line is one command, recognized by regular expressions:
//!
//! ```text
//! create_table <name> <col:type> ...
//! drop_table <name>
//! list_tables
//! insert into <name> values (<v1>, <v2>, ...)
//! select from <name> [where <col> = <value>]
//! update <name> set <col> = <value> where <col> = <value>
//! delete from <name> where <col> = <value>
//! info <name>
//! help
//! exit
//! ```
//!
//! Values may be wrapped in single or double quotes. Inside `values (...)`
//! a comma within quotes does not separate values.

use regex::Regex;
use thiserror::Error;

use flatdb_store::Predicate;

/// Errors produced while recognizing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The command word is known but the rest of the line is not.
    #[error("invalid {command} syntax, expected: {usage}")]
    Syntax {
        /// The command word.
        command: &'static str,
        /// Expected form of the command.
        usage: &'static str,
    },

    /// A column definition is not `<name>:<type>`.
    #[error("invalid column definition '{0}', expected <name>:<type>")]
    ColumnSpec(String),

    /// A quoted value is never closed.
    #[error("unterminated quote in '{0}'")]
    UnterminatedQuote(String),

    /// The line does not start with a known command.
    #[error("unknown command '{0}'. Type help for usage.")]
    Unknown(String),
}

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `create_table <name> <col:type>...`
    CreateTable {
        /// Table name.
        table: String,
        /// Column names and raw type names, in order.
        columns: Vec<(String, String)>,
    },
    /// `drop_table <name>`
    DropTable {
        /// Table name.
        table: String,
    },
    /// `list_tables`
    ListTables,
    /// `insert into <name> values (...)`
    Insert {
        /// Table name.
        table: String,
        /// Raw values with quotes removed.
        values: Vec<String>,
    },
    /// `select from <name> [where <col> = <value>]`
    Select {
        /// Table name.
        table: String,
        /// Optional filter.
        predicate: Option<Predicate>,
    },
    /// `update <name> set <col> = <value> where <col> = <value>`
    Update {
        /// Table name.
        table: String,
        /// Column to set.
        column: String,
        /// Raw new value.
        value: String,
        /// Records to change.
        predicate: Predicate,
    },
    /// `delete from <name> where <col> = <value>`
    Delete {
        /// Table name.
        table: String,
        /// Records to remove.
        predicate: Predicate,
    },
    /// `info <name>`
    Info {
        /// Table name.
        table: String,
    },
    /// `help`
    Help,
    /// `exit`
    Exit,
}

const CREATE_USAGE: &str = "create_table <name> <column:type> ...";
const DROP_USAGE: &str = "drop_table <name>";
const INSERT_USAGE: &str = "insert into <name> values (<value>, ...)";
const SELECT_USAGE: &str = "select from <name> [where <column> = <value>]";
const UPDATE_USAGE: &str = "update <name> set <column> = <value> where <column> = <value>";
const DELETE_USAGE: &str = "delete from <name> where <column> = <value>";
const INFO_USAGE: &str = "info <name>";

/// Compiled command patterns.
#[derive(Debug, Clone)]
pub struct StatementParser {
    create: Regex,
    drop: Regex,
    insert: Regex,
    select: Regex,
    update: Regex,
    delete: Regex,
    info: Regex,
}

impl StatementParser {
    /// Compiles the command patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            create: Regex::new(r"^create_table\s+(\w+)((?:\s+\S+)+)$")?,
            drop: Regex::new(r"^drop_table\s+(\w+)$")?,
            insert: Regex::new(r"^insert\s+into\s+(\w+)\s+values\s*\((.*)\)$")?,
            select: Regex::new(r"^select\s+from\s+(\w+)(?:\s+where\s+(\w+)\s*=\s*(.+))?$")?,
            update: Regex::new(
                r"^update\s+(\w+)\s+set\s+(\w+)\s*=\s*(.+?)\s+where\s+(\w+)\s*=\s*(.+)$",
            )?,
            delete: Regex::new(r"^delete\s+from\s+(\w+)\s+where\s+(\w+)\s*=\s*(.+)$")?,
            info: Regex::new(r"^info\s+(\w+)$")?,
        })
    }

    /// Parses one command line.
    pub fn parse(&self, line: &str) -> Result<Statement, ParseError> {
        let line = line.trim();
        let word = line.split_whitespace().next().unwrap_or_default();

        match word {
            "create_table" => {
                let caps = self.create.captures(line).ok_or(ParseError::Syntax {
                    command: "create_table",
                    usage: CREATE_USAGE,
                })?;
                let columns = caps[2]
                    .split_whitespace()
                    .map(parse_column_spec)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Statement::CreateTable {
                    table: caps[1].to_string(),
                    columns,
                })
            }
            "drop_table" => {
                let caps = self.drop.captures(line).ok_or(ParseError::Syntax {
                    command: "drop_table",
                    usage: DROP_USAGE,
                })?;
                Ok(Statement::DropTable {
                    table: caps[1].to_string(),
                })
            }
            "list_tables" if line == word => Ok(Statement::ListTables),
            "insert" => {
                let caps = self.insert.captures(line).ok_or(ParseError::Syntax {
                    command: "insert",
                    usage: INSERT_USAGE,
                })?;
                Ok(Statement::Insert {
                    table: caps[1].to_string(),
                    values: split_values(&caps[2])?,
                })
            }
            "select" => {
                let caps = self.select.captures(line).ok_or(ParseError::Syntax {
                    command: "select",
                    usage: SELECT_USAGE,
                })?;
                let predicate = match (caps.get(2), caps.get(3)) {
                    (Some(column), Some(value)) => {
                        Some(Predicate::new(column.as_str(), unquote(value.as_str())?))
                    }
                    _ => None,
                };
                Ok(Statement::Select {
                    table: caps[1].to_string(),
                    predicate,
                })
            }
            "update" => {
                let caps = self.update.captures(line).ok_or(ParseError::Syntax {
                    command: "update",
                    usage: UPDATE_USAGE,
                })?;
                Ok(Statement::Update {
                    table: caps[1].to_string(),
                    column: caps[2].to_string(),
                    value: unquote(&caps[3])?,
                    predicate: Predicate::new(&caps[4], unquote(&caps[5])?),
                })
            }
            "delete" => {
                let caps = self.delete.captures(line).ok_or(ParseError::Syntax {
                    command: "delete",
                    usage: DELETE_USAGE,
                })?;
                Ok(Statement::Delete {
                    table: caps[1].to_string(),
                    predicate: Predicate::new(&caps[2], unquote(&caps[3])?),
                })
            }
            "info" => {
                let caps = self.info.captures(line).ok_or(ParseError::Syntax {
                    command: "info",
                    usage: INFO_USAGE,
                })?;
                Ok(Statement::Info {
                    table: caps[1].to_string(),
                })
            }
            "help" if line == word => Ok(Statement::Help),
            "exit" if line == word => Ok(Statement::Exit),
            _ => Err(ParseError::Unknown(word.to_string())),
        }
    }
}

fn parse_column_spec(spec: &str) -> Result<(String, String), ParseError> {
    match spec.split_once(':') {
        Some((name, ty)) if !name.is_empty() && !ty.is_empty() => {
            Ok((name.to_string(), ty.to_string()))
        }
        _ => Err(ParseError::ColumnSpec(spec.to_string())),
    }
}

/// Removes surrounding whitespace and one pair of matching quotes.
fn unquote(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(quote @ ('"' | '\'')) => {
            if trimmed.len() >= 2 && trimmed.ends_with(quote) {
                Ok(trimmed[1..trimmed.len() - 1].to_string())
            } else {
                Err(ParseError::UnterminatedQuote(trimmed.to_string()))
            }
        }
        _ => Ok(trimmed.to_string()),
    }
}

/// Splits a `values (...)` list on commas outside quotes.
fn split_values(list: &str) -> Result<Vec<String>, ParseError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in list.chars() {
        match (quote, c) {
            (None, '"' | '\'') if current.trim().is_empty() => {
                quote = Some(c);
                current.push(c);
            }
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, ',') => values.push(unquote(&std::mem::take(&mut current))?),
            _ => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote(list.trim().to_string()));
    }
    values.push(unquote(&current)?);
    Ok(values)
}
