//! Join types and join fragments.

use std::fmt;
use std::str::FromStr;

use crate::predicate::Condition;
use crate::select::Column;
use crate::select::writer::SqlWriter;
use crate::JoineryError;

// =============================================================================
// Join Type Enum
// =============================================================================

/// The type of JOIN operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Natural,
}

impl JoinType {
    pub const fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::Natural => "NATURAL JOIN",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Cross => "cross",
            JoinType::Natural => "natural",
        }
    }

    /// Cross and natural joins render without an `ON` clause.
    pub const fn takes_condition(self) -> bool {
        !matches!(self, JoinType::Cross | JoinType::Natural)
    }

    /// Joins a row count may skip when nothing filters on them.
    pub const fn is_optional(self) -> bool {
        matches!(self, JoinType::Left)
    }
}

impl FromStr for JoinType {
    type Err = JoineryError;

    /// Accepts the bare kind (`left`), SQL spelling (`LEFT OUTER JOIN`) and
    /// method-style names (`joinLeft`, `join_left`); `join` alone is an inner
    /// join. `OUTER` is only accepted for left, right and full joins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || JoineryError::InvalidJoinType(s.to_string());

        let words: Vec<String> = s
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let (kind, outer) = match words.as_slice() {
            ["join"] => ("inner", false),
            [word] => (word.strip_prefix("join").unwrap_or(*word), false),
            ["join", kind] | [kind, "join"] => (*kind, false),
            [kind, "outer", "join"] => (*kind, true),
            _ => return Err(invalid()),
        };

        let join_type = match kind {
            "inner" => JoinType::Inner,
            "left" => JoinType::Left,
            "right" => JoinType::Right,
            "full" => JoinType::Full,
            "cross" => JoinType::Cross,
            "natural" => JoinType::Natural,
            _ => return Err(invalid()),
        };
        if outer && !matches!(join_type, JoinType::Left | JoinType::Right | JoinType::Full) {
            return Err(invalid());
        }
        Ok(join_type)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Table references
// =============================================================================

/// A table, optionally under a correlation name (`table AS alias`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// `{alias: table}`
    pub fn aliased(alias: impl Into<String>, name: impl Into<String>) -> Self {
        let alias = alias.into();
        let name = name.into();
        Self {
            alias: (alias != name).then_some(alias),
            name,
        }
    }

    /// The name later clauses refer to: the alias if any, else the table.
    pub fn correlation(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) {
        w.push_str(&self.name);
        if let Some(alias) = &self.alias {
            w.push_str(" AS ");
            w.push_str(alias);
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::new(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::new(name)
    }
}

impl From<(&str, &str)> for TableRef {
    /// `(alias, table)`
    fn from((alias, name): (&str, &str)) -> Self {
        TableRef::aliased(alias, name)
    }
}

// =============================================================================
// Join fragment
// =============================================================================

/// One accumulated join
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Condition,
    pub columns: Vec<Column>,
}

impl Join {
    pub fn correlation(&self) -> &str {
        self.table.correlation()
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) {
        w.push_str(self.join_type.keyword());
        w.push(' ');
        self.table.write(w);
        if self.join_type.takes_condition() && !self.on.is_empty() {
            w.push_str(" ON ");
            self.on.write(w);
        }
    }
}
