//! Token scanners recognising the CREATE and ALTER ... ADD CONSTRAINT
//! statements this crate generates.

use super::tokenizer::{is_terminator, strip_terminator};

/// Object kinds a CREATE statement can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Sequence,
    Synonym,
    Table,
    Index,
    Constraint,
    Trigger,
    Function,
    Package,
    Procedure,
    View,
}

impl ObjectType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "SEQUENCE" => Some(ObjectType::Sequence),
            "SYNONYM" => Some(ObjectType::Synonym),
            "TABLE" => Some(ObjectType::Table),
            "INDEX" => Some(ObjectType::Index),
            "CONSTRAINT" => Some(ObjectType::Constraint),
            "TRIGGER" => Some(ObjectType::Trigger),
            "FUNCTION" => Some(ObjectType::Function),
            "PACKAGE" => Some(ObjectType::Package),
            "PROCEDURE" => Some(ObjectType::Procedure),
            "VIEW" => Some(ObjectType::View),
            _ => None,
        }
    }

    pub fn drop_keyword(&self) -> &'static str {
        match self {
            ObjectType::Sequence => "DROP SEQUENCE",
            ObjectType::Synonym => "DROP SYNONYM",
            ObjectType::Table => "DROP TABLE",
            ObjectType::Index => "DROP INDEX",
            ObjectType::Constraint => "DROP CONSTRAINT",
            ObjectType::Trigger => "DROP TRIGGER",
            ObjectType::Function => "DROP FUNCTION",
            ObjectType::Package => "DROP PACKAGE",
            ObjectType::Procedure => "DROP PROCEDURE",
            ObjectType::View => "DROP VIEW",
        }
    }
}

/// Words between CREATE and the object type that carry no name
const CREATE_MODIFIERS: [&str; 6] = ["OR", "REPLACE", "EDITIONABLE", "UNIQUE", "BODY", "FORCE"];

/// An object found by the CREATE scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedObject {
    pub kind: ObjectType,
    pub name: String,
}

/// A constraint added by an ALTER TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedConstraint {
    pub table: String,
    pub constraint: String,
}

#[derive(Debug)]
enum CreateState {
    Idle,
    /// Inside a CREATE, before the name; the type resets for every statement
    Open { kind: Option<ObjectType> },
}

/// Collect `(type, name)` for every CREATE statement in a token stream.
///
/// A statement whose name arrives before any recognised type is dropped.
pub fn scan_creates(tokens: &[String]) -> Vec<CreatedObject> {
    let mut found = Vec::new();
    let mut state = CreateState::Idle;
    for token in tokens {
        let token = token.as_str();
        state = match state {
            _ if token == "CREATE" => {
                log::debug!("Found CREATE statement. Parsing for details...");
                CreateState::Open { kind: None }
            }
            CreateState::Idle => CreateState::Idle,
            CreateState::Open { kind } => {
                let next = if CREATE_MODIFIERS.contains(&token) {
                    CreateState::Open { kind }
                } else if let Some(parsed) = ObjectType::parse(token) {
                    CreateState::Open { kind: Some(parsed) }
                } else {
                    let name = strip_terminator(token);
                    match kind {
                        Some(kind) if !name.is_empty() => found.push(CreatedObject {
                            kind,
                            name: name.to_string(),
                        }),
                        _ => log::debug!("CREATE statement without a recognised type near {}; ignoring", token),
                    }
                    CreateState::Idle
                };
                match next {
                    CreateState::Open { .. } if is_terminator(token) => CreateState::Idle,
                    other => other,
                }
            }
        };
    }
    found
}

#[derive(Debug)]
enum AlterState {
    Idle,
    Open {
        saw_add: bool,
        saw_constraint: bool,
        table: Option<String>,
    },
}

/// Collect `(table, constraint)` for every `ALTER TABLE ... ADD CONSTRAINT` statement.
///
/// An ALTER missing either ADD or CONSTRAINT before the constraint name, or
/// terminated before the name, is discarded.
pub fn scan_alters(tokens: &[String]) -> Vec<AddedConstraint> {
    let mut found = Vec::new();
    let mut state = AlterState::Idle;
    for token in tokens {
        let token = token.as_str();
        state = match state {
            _ if token == "ALTER" => {
                log::debug!("Found ALTER statement. Parsing for CONSTRAINT details...");
                AlterState::Open {
                    saw_add: false,
                    saw_constraint: false,
                    table: None,
                }
            }
            AlterState::Idle => AlterState::Idle,
            AlterState::Open {
                mut saw_add,
                mut saw_constraint,
                table,
            } => {
                let next = match token {
                    "ADD" => {
                        saw_add = true;
                        AlterState::Open { saw_add, saw_constraint, table }
                    }
                    "CONSTRAINT" => {
                        saw_constraint = true;
                        AlterState::Open { saw_add, saw_constraint, table }
                    }
                    "TABLE" => AlterState::Open { saw_add, saw_constraint, table },
                    word => match table {
                        None => AlterState::Open {
                            saw_add,
                            saw_constraint,
                            table: Some(strip_terminator(word).to_string()),
                        },
                        Some(table) => {
                            if saw_add && saw_constraint {
                                found.push(AddedConstraint {
                                    table,
                                    constraint: strip_terminator(word).to_string(),
                                });
                            } else {
                                log::debug!("Invalid CONSTRAINT statement on {}, ignoring...", table);
                            }
                            AlterState::Idle
                        }
                    },
                };
                match next {
                    AlterState::Open { .. } if is_terminator(token) => {
                        log::debug!("ALTER statement ended before a constraint name, ignoring...");
                        AlterState::Idle
                    }
                    other => other,
                }
            }
        };
    }
    found
}
