use std::fmt;

use crate::select::writer::SqlWriter;

/// A projected column: a plain name qualified at render time, or an
/// expression rendered verbatim, with an optional alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    expr: String,
    raw: bool,
    alias: Option<String>,
}

impl Column {
    /// A column name. Anything that looks like an expression (calls, dotted
    /// names, spaces) is kept verbatim rather than qualified.
    pub fn new(name: impl Into<String>) -> Self {
        let expr = name.into();
        let raw = expr.contains(['(', '.', ' ']);
        Self {
            expr,
            raw,
            alias: None,
        }
    }

    /// Every column of the owning table (`table.*`).
    pub fn all() -> Self {
        Self::new("*")
    }

    /// An expression rendered verbatim, never qualified.
    pub fn expr(sql: impl Into<String>) -> Self {
        Self {
            expr: sql.into(),
            raw: true,
            alias: None,
        }
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.expr
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>, correlation: Option<&str>) {
        match correlation {
            Some(table) if !self.raw => {
                w.push_str(table);
                w.push('.');
                w.push_str(&self.expr);
            }
            _ => w.push_str(&self.expr),
        }
        if let Some(alias) = &self.alias {
            w.push_str(" AS ");
            w.push_str(alias);
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::new(name)
    }
}

/// Conversion into a projection list. `()` selects every column.
pub trait IntoColumns {
    fn into_columns(self) -> Vec<Column>;
}

impl IntoColumns for () {
    fn into_columns(self) -> Vec<Column> {
        vec![Column::all()]
    }
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<Column> {
        vec![Column::new(self)]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<Column> {
        vec![Column::new(self)]
    }
}

impl IntoColumns for Column {
    fn into_columns(self) -> Vec<Column> {
        vec![self]
    }
}

impl<T: Into<Column>, const N: usize> IntoColumns for [T; N] {
    fn into_columns(self) -> Vec<Column> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Column>> IntoColumns for Vec<T> {
    fn into_columns(self) -> Vec<Column> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    Asc,
    Desc,
}

impl OrderBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// One ORDER BY term
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub expr: String,
    pub direction: Option<OrderBy>,
}

impl OrderTerm {
    /// Splits a trailing `ASC`/`DESC` off `spec`.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some((expr, last)) = spec.rsplit_once(char::is_whitespace) {
            let direction = if last.eq_ignore_ascii_case("ASC") {
                Some(OrderBy::Asc)
            } else if last.eq_ignore_ascii_case("DESC") {
                Some(OrderBy::Desc)
            } else {
                None
            };
            if direction.is_some() {
                return Self {
                    expr: expr.trim_end().to_string(),
                    direction,
                };
            }
        }
        Self {
            expr: spec.to_string(),
            direction: None,
        }
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{} {}", self.expr, direction.as_str()),
            None => f.write_str(&self.expr),
        }
    }
}

/// LIMIT with optional OFFSET
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub offset: Option<u64>,
}

impl Limit {
    /// The LIMIT for 1-based `page` of `page_size` rows. Pages below 1 read as 1.
    pub fn page(page: u64, page_size: u64) -> Self {
        let page = page.max(1);
        Self {
            count: page_size,
            offset: Some(page_size.saturating_mul(page - 1)),
        }
    }
}

/// Clause categories that [`SelectQuery::reset`](super::SelectQuery::reset) clears
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clause {
    Distinct,
    /// Base and joined projections
    Columns,
    /// Base table and every join
    From,
    Joins,
    Where,
    Group,
    Having,
    Order,
    Limit,
}
