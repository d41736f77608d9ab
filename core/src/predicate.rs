//! WHERE, HAVING and ON fragments.
//!
//! Predicates are structured ([`Predicate::Compare`], [`Predicate::Columns`])
//! whenever the caller builds them that way, so the tables they touch are
//! known without parsing. Free-form [`Predicate::Raw`] fragments fall back to
//! a small lexer that recovers `qualifier.column` references.

use std::fmt;

use smallvec::SmallVec;

use crate::select::writer::SqlWriter;
use crate::{JoineryError, Result, Value};

/// Boolean connective joining a fragment to the ones before it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub const fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// Comparison operator of a structured predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompareOp {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// A possibly table-qualified column reference
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Splits `qualifier.column` at the last dot.
    pub fn parse(reference: &str) -> Self {
        match reference.rsplit_once('.') {
            Some((table, column)) => Self::qualified(table, column),
            None => Self {
                table: None,
                column: reference.trim().to_string(),
            },
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into().trim().to_string()),
            column: column.into().trim().to_string(),
        }
    }

    /// Fills in the qualifier if the reference has none.
    pub fn or_table(mut self, table: &str) -> Self {
        if self.table.is_none() {
            self.table = Some(table.to_string());
        }
        self
    }

    /// The table or alias part of the qualifier (`schema.table` yields `table`).
    pub fn correlation(&self) -> Option<&str> {
        self.table
            .as_deref()
            .map(|t| t.rsplit_once('.').map_or(t, |(_, name)| name))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// A single boolean fragment
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Free-form SQL, rendered verbatim
    Raw(String),
    /// `column op ?` with a bound value
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    /// `left op right` between two columns
    Columns {
        left: ColumnRef,
        op: CompareOp,
        right: ColumnRef,
    },
}

impl Predicate {
    pub fn raw(sql: impl Into<String>) -> Self {
        Predicate::Raw(sql.into())
    }

    /// `column = ?`; `column` may be qualified as `table.column`.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn compare(column: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            column: ColumnRef::parse(column),
            op,
            value: value.into(),
        }
    }

    pub fn columns_eq(left: ColumnRef, right: ColumnRef) -> Self {
        Predicate::Columns {
            left,
            op: CompareOp::Eq,
            right,
        }
    }

    pub const fn is_raw(&self) -> bool {
        matches!(self, Predicate::Raw(_))
    }

    /// Qualifies bare structured column references with `table`.
    /// Raw fragments are returned untouched.
    pub fn or_table(self, table: &str) -> Self {
        match self {
            Predicate::Compare { column, op, value } => Predicate::Compare {
                column: column.or_table(table),
                op,
                value,
            },
            other => other,
        }
    }

    /// Tables or aliases this predicate reads through qualified columns.
    pub fn tables(&self) -> Result<Vec<String>> {
        match self {
            Predicate::Raw(sql) => qualified_tables(sql),
            Predicate::Compare { column, .. } => {
                Ok(column.correlation().map(str::to_string).into_iter().collect())
            }
            Predicate::Columns { left, right, .. } => Ok(left
                .correlation()
                .into_iter()
                .chain(right.correlation())
                .map(str::to_string)
                .collect()),
        }
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>, parenthesize_raw: bool) {
        match self {
            Predicate::Raw(sql) if parenthesize_raw => {
                w.push('(');
                w.push_str(sql);
                w.push(')');
            }
            Predicate::Raw(sql) => w.push_str(sql),
            Predicate::Compare { column, op, value } => {
                w.push_str(&column.to_string());
                w.push(' ');
                w.push_str(op.as_str());
                w.push(' ');
                w.param(value);
            }
            Predicate::Columns { left, op, right } => {
                w.push_str(&left.to_string());
                w.push(' ');
                w.push_str(op.as_str());
                w.push(' ');
                w.push_str(&right.to_string());
            }
        }
    }
}

impl From<&str> for Predicate {
    fn from(sql: &str) -> Self {
        Predicate::raw(sql)
    }
}

impl From<String> for Predicate {
    fn from(sql: String) -> Self {
        Predicate::Raw(sql)
    }
}

/// Caller input for `where`/`having`: a free-form string, column/value
/// pairs rendered as bound equalities, or a prepared predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Raw(String),
    Pairs(Vec<(String, Value)>),
    Predicate(Predicate),
}

impl Filter {
    pub(crate) fn into_predicates(self) -> Vec<Predicate> {
        match self {
            Filter::Raw(sql) => vec![Predicate::Raw(sql)],
            Filter::Pairs(pairs) => pairs
                .into_iter()
                .map(|(column, value)| Predicate::eq(&column, value))
                .collect(),
            Filter::Predicate(predicate) => vec![predicate],
        }
    }
}

impl From<&str> for Filter {
    fn from(sql: &str) -> Self {
        Filter::Raw(sql.to_string())
    }
}

impl From<String> for Filter {
    fn from(sql: String) -> Self {
        Filter::Raw(sql)
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter::Predicate(predicate)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Filter {
    fn from(pairs: [(K, V); N]) -> Self {
        Filter::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Filter {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Filter::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An `ON` condition: predicates joined with `AND`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Condition {
    predicates: SmallVec<[Predicate; 2]>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: impl Into<Predicate>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) {
        let nested = self.predicates.len() > 1;
        for (idx, predicate) in self.predicates.iter().enumerate() {
            if idx > 0 {
                w.push_str(" AND ");
            }
            predicate.write(w, nested);
        }
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::new().and(sql)
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::new().and(sql)
    }
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::new().and(predicate)
    }
}

impl From<Option<Condition>> for Condition {
    fn from(condition: Option<Condition>) -> Self {
        condition.unwrap_or_default()
    }
}

// =============================================================================
// Lexical scan of free-form fragments
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Quoted(&'a str),
    Dot,
    LParen,
    RParen,
    Other,
}

fn malformed(fragment: &str, reason: &str) -> JoineryError {
    JoineryError::MalformedPredicate {
        predicate: fragment.to_string(),
        reason: reason.to_string(),
    }
}

fn tokenize(fragment: &str) -> Result<Vec<Token<'_>>> {
    let bytes = fragment.as_bytes();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'\'' => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(malformed(fragment, "unterminated string literal")),
                        Some(b'\'') if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                        Some(b'\'') => break,
                        Some(_) => i += 1,
                    }
                }
                i += 1;
                tokens.push(Token::Other);
            }
            b'"' | b'`' | b'[' => {
                let close = if c == b'[' { b']' } else { c };
                let start = i + 1;
                let Some(len) = bytes[start..].iter().position(|&b| b == close) else {
                    return Err(malformed(fragment, "unterminated quoted identifier"));
                };
                tokens.push(Token::Quoted(&fragment[start..start + len]));
                i = start + len + 1;
            }
            b'(' => {
                depth += 1;
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(fragment, "unbalanced parentheses"))?;
                tokens.push(Token::RParen);
                i += 1;
            }
            b'.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            b'0'..=b'9' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                    i += 1;
                }
                tokens.push(Token::Other);
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric()
                        || bytes[i] == b'_'
                        || bytes[i] == b'$'
                        || bytes[i] >= 0x80)
                {
                    i += 1;
                }
                tokens.push(Token::Word(&fragment[start..i]));
            }
            _ => {
                i += 1;
                tokens.push(Token::Other);
            }
        }
    }

    if depth != 0 {
        return Err(malformed(fragment, "unbalanced parentheses"));
    }
    Ok(tokens)
}

fn name_of<'a>(token: &Token<'a>) -> Option<&'a str> {
    match token {
        Token::Word(word) | Token::Quoted(word) => Some(word),
        _ => None,
    }
}

fn is_keyword(token: &Token<'_>, keyword: &str) -> bool {
    matches!(token, Token::Word(word) if word.eq_ignore_ascii_case(keyword))
}

/// Qualifiers of every `qualifier.column` reference in a free-form fragment.
///
/// String literals, numbers and function names are skipped; for three-part
/// names (`schema.table.column`) the table part is reported. Subqueries and
/// unbalanced fragments are rejected with [`JoineryError::MalformedPredicate`]
/// since their references cannot be attributed to the outer query.
pub fn qualified_tables(fragment: &str) -> Result<Vec<String>> {
    let tokens = tokenize(fragment)?;
    if tokens.iter().any(|t| is_keyword(t, "SELECT")) {
        return Err(malformed(fragment, "subqueries are not scanned"));
    }

    let mut tables: Vec<String> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let Some(first) = name_of(&tokens[i]) else {
            i += 1;
            continue;
        };

        let mut chain = vec![first];
        let mut j = i + 1;
        while j + 1 < tokens.len() && tokens[j] == Token::Dot {
            match name_of(&tokens[j + 1]) {
                Some(part) => {
                    chain.push(part);
                    j += 2;
                }
                None => break,
            }
        }

        let is_call = tokens.get(j) == Some(&Token::LParen);
        if chain.len() > 1 && !is_call {
            let qualifier = chain[chain.len() - 2].to_string();
            if !tables.contains(&qualifier) {
                tables.push(qualifier);
            }
        }
        i = j;
    }
    Ok(tables)
}

/// True when the fragment joins several comparisons with `AND` or `OR`.
pub fn has_connective(fragment: &str) -> bool {
    match tokenize(fragment) {
        Ok(tokens) => tokens
            .iter()
            .any(|t| is_keyword(t, "AND") || is_keyword(t, "OR")),
        Err(_) => fragment.contains(" AND ") || fragment.contains(" OR "),
    }
}

/// True when the fragment opens with a `qualifier.column` reference.
pub fn starts_qualified(fragment: &str) -> bool {
    match tokenize(fragment) {
        Ok(tokens) => match tokens.as_slice() {
            [first, Token::Dot, second, ..] => {
                name_of(first).is_some() && name_of(second).is_some()
            }
            _ => false,
        },
        Err(_) => fragment
            .split_whitespace()
            .next()
            .is_some_and(|word| word.contains('.')),
    }
}
