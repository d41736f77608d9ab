//! The SELECT builder.
//!
//! [`SelectQuery`] keeps one ordered list of fragments per clause category
//! and renders them in a fixed order: columns, FROM, joins in insertion
//! order, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT. Empty categories are
//! omitted. Every mutation is local; cloning deep-copies all state.

mod count;
mod parts;
pub(crate) mod writer;

use std::fmt;

pub use parts::{Clause, Column, IntoColumns, Limit, OrderBy, OrderTerm};

use crate::join::{Join, JoinType, TableRef};
use crate::predicate::{Condition, Connective, Filter, Predicate};
use crate::{JoineryError, Result, Value};
use writer::SqlWriter;

/// Builds a SELECT statement from clause fragments.
///
/// ```
/// use joinery_core::{JoinType, SelectQuery};
///
/// let mut query = SelectQuery::new();
/// query
///     .from("users", ["id", "name"])
///     .join(
///         JoinType::Left,
///         ("p", "users_profile"),
///         "p.user_id = users.id",
///         ["about"],
///     )
///     .unwrap()
///     .r#where([("status", 1)])
///     .order("name DESC")
///     .limit(10, None);
///
/// assert_eq!(
///     query.render(),
///     "SELECT users.id, users.name, p.about FROM users \
///      LEFT JOIN users_profile AS p ON p.user_id = users.id \
///      WHERE status = ? ORDER BY name DESC LIMIT 10"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    distinct: bool,
    from: Option<TableRef>,
    columns: Vec<Column>,
    joins: Vec<Join>,
    predicates: Vec<(Connective, Predicate)>,
    group: Vec<String>,
    having: Vec<(Connective, Predicate)>,
    order: Vec<OrderTerm>,
    limit: Option<Limit>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base table and its projected columns, replacing any previous base.
    pub fn from(&mut self, table: impl Into<TableRef>, columns: impl IntoColumns) -> &mut Self {
        self.from = Some(table.into());
        self.columns = columns.into_columns();
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Appends a join. The joined table's correlation name (its alias, or its
    /// name when unaliased) must not already be in use by the query.
    pub fn join(
        &mut self,
        join_type: JoinType,
        table: impl Into<TableRef>,
        on: impl Into<Condition>,
        columns: impl IntoColumns,
    ) -> Result<&mut Self> {
        let table = table.into();
        if self.has_correlation(table.correlation()) {
            return Err(JoineryError::JoinFailed {
                relation: table.name.clone(),
                reason: format!(
                    "correlation name {} is already in use",
                    table.correlation()
                ),
            });
        }
        self.joins.push(Join {
            join_type,
            table,
            on: on.into(),
            columns: columns.into_columns(),
        });
        Ok(self)
    }

    /// [`join`](Self::join) with the join type given by name (`"left"`, `"joinLeft"`, ...).
    pub fn join_named(
        &mut self,
        join_type: &str,
        table: impl Into<TableRef>,
        on: impl Into<Condition>,
        columns: impl IntoColumns,
    ) -> Result<&mut Self> {
        let join_type = join_type.parse()?;
        self.join(join_type, table, on, columns)
    }

    /// Appends `AND`-connected predicates. Column/value pairs become bound
    /// equalities, one predicate per pair.
    pub fn r#where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.push_predicates(Connective::And, filter.into())
    }

    /// Appends `OR`-connected predicates.
    pub fn or_where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.push_predicates(Connective::Or, filter.into())
    }

    pub fn group(&mut self, column: impl Into<String>) -> &mut Self {
        self.group.push(column.into());
        self
    }

    /// Appends an ORDER BY term; a trailing `ASC`/`DESC` is split off.
    pub fn order(&mut self, spec: &str) -> &mut Self {
        self.order.push(OrderTerm::parse(spec));
        self
    }

    pub fn having(&mut self, filter: impl Into<Filter>) -> &mut Self {
        for predicate in filter.into().into_predicates() {
            self.having.push((Connective::And, predicate));
        }
        self
    }

    pub fn or_having(&mut self, filter: impl Into<Filter>) -> &mut Self {
        for predicate in filter.into().into_predicates() {
            self.having.push((Connective::Or, predicate));
        }
        self
    }

    pub fn limit(&mut self, count: u64, offset: impl Into<Option<u64>>) -> &mut Self {
        self.limit = Some(Limit {
            count,
            offset: offset.into(),
        });
        self
    }

    /// Limits to 1-based `page` of `page_size` rows.
    pub fn limit_page(&mut self, page: u64, page_size: u64) -> &mut Self {
        self.limit = Some(Limit::page(page, page_size));
        self
    }

    /// Clears one clause category, or everything with `None`.
    pub fn reset(&mut self, clause: Option<Clause>) -> &mut Self {
        match clause {
            None => *self = Self::default(),
            Some(Clause::Distinct) => self.distinct = false,
            Some(Clause::Columns) => {
                self.columns.clear();
                for join in &mut self.joins {
                    join.columns.clear();
                }
            }
            Some(Clause::From) => {
                self.from = None;
                self.joins.clear();
            }
            Some(Clause::Joins) => self.joins.clear(),
            Some(Clause::Where) => self.predicates.clear(),
            Some(Clause::Group) => self.group.clear(),
            Some(Clause::Having) => self.having.clear(),
            Some(Clause::Order) => self.order.clear(),
            Some(Clause::Limit) => self.limit = None,
        }
        self
    }

    // ==================== accessors ====================

    pub fn base_table(&self) -> Option<&TableRef> {
        self.from.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn predicates(&self) -> &[(Connective, Predicate)] {
        &self.predicates
    }

    pub fn having_predicates(&self) -> &[(Connective, Predicate)] {
        &self.having
    }

    pub fn group_terms(&self) -> &[String] {
        &self.group
    }

    pub fn order_terms(&self) -> &[OrderTerm] {
        &self.order
    }

    pub fn limit_clause(&self) -> Option<Limit> {
        self.limit
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// True if `name` is the base table's or a join's correlation name.
    pub fn has_correlation(&self, name: &str) -> bool {
        self.from.as_ref().is_some_and(|t| t.correlation() == name)
            || self.joins.iter().any(|j| j.correlation() == name)
    }

    // ==================== rendering ====================

    /// The statement text with `?` placeholders.
    pub fn render(&self) -> String {
        self.to_sql().0
    }

    /// The statement text and its bound values in placeholder order.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new();
        self.write(&mut w);
        w.finish()
    }

    /// The statement with every bound value inlined through `quote`.
    pub fn to_inline_sql(&self, quote: &dyn Fn(&Value) -> String) -> String {
        let mut w = SqlWriter::inlining(quote);
        self.write(&mut w);
        w.finish().0
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.to_sql().1
    }

    fn push_predicates(&mut self, connective: Connective, filter: Filter) -> &mut Self {
        for predicate in filter.into_predicates() {
            self.predicates.push((connective, predicate));
        }
        self
    }

    fn write(&self, w: &mut SqlWriter<'_>) {
        w.push_str("SELECT ");
        if self.distinct {
            w.push_str("DISTINCT ");
        }
        self.write_projection(w);

        if let Some(from) = &self.from {
            w.push_str(" FROM ");
            from.write(w);
        }

        for join in &self.joins {
            w.push(' ');
            join.write(w);
        }

        if !self.predicates.is_empty() {
            w.push_str(" WHERE ");
            write_predicates(w, &self.predicates);
        }

        if !self.group.is_empty() {
            w.push_str(" GROUP BY ");
            w.push_str(&self.group.join(", "));
        }

        if !self.having.is_empty() {
            w.push_str(" HAVING ");
            write_predicates(w, &self.having);
        }

        if !self.order.is_empty() {
            w.push_str(" ORDER BY ");
            for (idx, term) in self.order.iter().enumerate() {
                if idx > 0 {
                    w.push_str(", ");
                }
                w.push_str(&term.to_string());
            }
        }

        if let Some(limit) = self.limit {
            w.push_str(&format!(" LIMIT {}", limit.count));
            if let Some(offset) = limit.offset {
                w.push_str(&format!(" OFFSET {offset}"));
            }
        }
    }

    fn write_projection(&self, w: &mut SqlWriter<'_>) {
        let base = self.from.as_ref().map(TableRef::correlation);
        let projected = self
            .columns
            .iter()
            .map(|c| (c, base))
            .chain(
                self.joins
                    .iter()
                    .flat_map(|j| j.columns.iter().map(move |c| (c, Some(j.correlation())))),
            );

        let mut any = false;
        for (idx, (column, correlation)) in projected.enumerate() {
            if idx > 0 {
                w.push_str(", ");
            }
            column.write(w, correlation);
            any = true;
        }
        if !any {
            w.push('*');
        }
    }
}

fn write_predicates(w: &mut SqlWriter<'_>, predicates: &[(Connective, Predicate)]) {
    let nested = predicates.len() > 1;
    for (idx, (connective, predicate)) in predicates.iter().enumerate() {
        if idx > 0 {
            w.push(' ');
            w.push_str(connective.as_str());
            w.push(' ');
        }
        predicate.write(w, nested);
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
