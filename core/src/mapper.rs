//! Relation-aware query composition over one base table.
//!
//! A [`Mapper`] owns a base table, an adapter and exactly one live
//! [`SelectQuery`]. Joins are named by relation rather than spelled out:
//!
//! ```
//! use joinery_core::{Mapper, RelationMap, RelationshipDescriptor, Row, Value, Adapter, Result};
//!
//! struct NoDb;
//! impl Adapter for NoDb {
//!     fn fetch_all(&self, _: &str, _: &[Value]) -> Result<Vec<Row>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let relations = RelationMap::new()
//!     .relation("Users", RelationshipDescriptor::new("user_id", "users", "id"));
//! let mut conversations = Mapper::new(NoDb, "conversations", relations);
//!
//! conversations
//!     .get(())
//!     .by("Users", ["name"])?
//!     .r#where([("user_id", 1)]);
//!
//! assert_eq!(
//!     conversations.to_string(),
//!     "SELECT conversations.*, users.name FROM conversations \
//!      INNER JOIN users ON users.id = conversations.user_id \
//!      WHERE conversations.user_id = ?"
//! );
//! # Ok::<(), joinery_core::JoineryError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::paginator::{fetch_count, page_count};
use crate::predicate::{ColumnRef, has_connective, starts_qualified};
use crate::relation::TargetCache;
use crate::select::IntoColumns;
use crate::{
    Adapter, Clause, Column, Condition, DEFAULT_COUNT_ALIAS, DEFAULT_PAGE_SIZE, Filter, JoinType,
    JoineryError, Paginator, Predicate, RelationMap, Result, Row, SelectQuery, TableRef,
    TableResolver,
};

// =============================================================================
// Join cursor
// =============================================================================

/// The base table and the correlation name most recently joined.
///
/// Cursors are values: [`joined`](Self::joined) returns the next cursor and
/// leaves the receiver as it was.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JoinCursor {
    base: CompactString,
    last_joined: Option<CompactString>,
}

impl JoinCursor {
    pub fn new(base: &str) -> Self {
        Self {
            base: CompactString::from(base),
            last_joined: None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn last_joined(&self) -> Option<&str> {
        self.last_joined.as_deref()
    }

    /// The table chained joins start from: the last join, or the base table.
    pub fn source(&self) -> &str {
        self.last_joined().unwrap_or(self.base())
    }

    #[must_use]
    pub fn joined(&self, correlation: &str) -> Self {
        Self {
            base: self.base.clone(),
            last_joined: Some(CompactString::from(correlation)),
        }
    }
}

// =============================================================================
// Table hints
// =============================================================================

/// Which table unqualified column names in a clause belong to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TableHint {
    /// The mapper's base table
    #[default]
    Base,
    /// The table joined last, or the base table before any join
    LastJoined,
    /// A table or alias name, used as given
    Table(String),
    /// A gateway identifier, resolved to its table name
    Target(String),
    /// The table a declared relation joins
    Relation(String),
    /// Leave the clause as written
    Unqualified,
}

// =============================================================================
// Relation references
// =============================================================================

/// A relation to join: its name, the correlation name to join it under,
/// the join type and an optional extra `ON` condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    name: String,
    alias: Option<String>,
    join_type: JoinType,
    extra: Option<Filter>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            join_type: JoinType::Inner,
            extra: None,
        }
    }

    /// Joins relation `name` under the correlation name `alias`.
    pub fn aliased(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// [`join_type`](Self::join_type) by name; fails with [`JoineryError::InvalidJoinType`].
    pub fn with_join_type_name(self, join_type: &str) -> Result<Self> {
        Ok(self.join_type(join_type.parse()?))
    }

    /// Extra `ON` condition, `AND`-ed after the relation's own. Column/value
    /// pairs are qualified with the joined table.
    pub fn on(mut self, extra: impl Into<Filter>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl From<&str> for Relation {
    fn from(name: &str) -> Self {
        Relation::new(name)
    }
}

impl From<String> for Relation {
    fn from(name: String) -> Self {
        Relation::new(name)
    }
}

/// `(alias, relation)`
impl From<(&str, &str)> for Relation {
    fn from((alias, name): (&str, &str)) -> Self {
        Relation::aliased(alias, name)
    }
}

// =============================================================================
// Construction
// =============================================================================

type SharedResolver = Arc<dyn TableResolver + Send + Sync>;

#[derive(Clone, Debug)]
enum BaseTable {
    Table(String),
    Gateway(String),
}

/// Configures a [`Mapper`]. [`build`](Self::build) resolves a gateway base
/// table up front, so unknown identifiers fail here rather than on first use.
pub struct MapperBuilder<A> {
    adapter: A,
    base: BaseTable,
    relations: RelationMap,
    resolver: Option<SharedResolver>,
    page_size: u64,
}

impl<A: Adapter> MapperBuilder<A> {
    pub fn new(adapter: A, table: impl Into<String>) -> Self {
        Self {
            adapter,
            base: BaseTable::Table(table.into()),
            relations: RelationMap::new(),
            resolver: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn adapter<B: Adapter>(self, adapter: B) -> MapperBuilder<B> {
        MapperBuilder {
            adapter,
            base: self.base,
            relations: self.relations,
            resolver: self.resolver,
            page_size: self.page_size,
        }
    }

    /// Physical base table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.base = BaseTable::Table(table.into());
        self
    }

    /// Base table given as a gateway identifier for the resolver. The
    /// gateway's relations are merged under the explicitly given ones.
    pub fn gateway(mut self, id: impl Into<String>) -> Self {
        self.base = BaseTable::Gateway(id.into());
        self
    }

    /// Relations declared on the base table; repeated calls accumulate.
    pub fn relations(mut self, relations: RelationMap) -> Self {
        self.relations.extend(relations);
        self
    }

    pub fn resolver(mut self, resolver: impl TableResolver + Send + Sync + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn build(self) -> Result<Mapper<A>> {
        let MapperBuilder {
            adapter,
            base,
            mut relations,
            resolver,
            page_size,
        } = self;

        let table = match base {
            BaseTable::Table(table) => table,
            BaseTable::Gateway(id) => {
                let Some(resolver) = resolver.as_deref() else {
                    return Err(JoineryError::UnknownTarget(id));
                };
                let definition = resolver.resolve(&id)?;
                let added = relations.merge_missing(&definition.relations);
                crate::joinery_trace_merge!(id, added);
                definition.name
            }
        };

        let mut mapper = Mapper::new(adapter, table, relations);
        mapper.resolver = resolver;
        mapper.page_size = page_size;
        Ok(mapper)
    }
}

// =============================================================================
// Mapper
// =============================================================================

/// Composes one query at a time against a base table.
///
/// Composition methods return `&mut Self` for chaining; the ones that resolve
/// relations or targets return `Result<&mut Self>` and leave the query as it
/// was when they fail.
pub struct Mapper<A> {
    adapter: A,
    table: String,
    relations: RelationMap,
    resolver: Option<SharedResolver>,
    targets: TargetCache,
    cursor: JoinCursor,
    select: SelectQuery,
    page_size: u64,
}

impl<A: Adapter> Mapper<A> {
    /// A mapper over `table` whose relation targets are physical table names.
    pub fn new(adapter: A, table: impl Into<String>, relations: RelationMap) -> Self {
        let table = table.into();
        let mut select = SelectQuery::new();
        select.from(TableRef::new(table.as_str()), ());
        Self {
            adapter,
            cursor: JoinCursor::new(&table),
            table,
            relations,
            resolver: None,
            targets: TargetCache::new(),
            select,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn builder(adapter: A, table: impl Into<String>) -> MapperBuilder<A> {
        MapperBuilder::new(adapter, table)
    }

    // ==================== query lifecycle ====================

    /// Starts a new query: `SELECT columns FROM base`. The previous query
    /// and join cursor are discarded.
    pub fn get(&mut self, columns: impl IntoColumns) -> &mut Self {
        self.select = SelectQuery::new();
        self.select.from(TableRef::new(self.table.as_str()), columns);
        self.cursor = JoinCursor::new(&self.table);
        self
    }

    /// [`get`](Self::get) followed by a base-table [`where`](Self::where).
    pub fn get_where(&mut self, columns: impl IntoColumns, filter: impl Into<Filter>) -> &mut Self {
        self.get(columns).r#where(filter)
    }

    pub fn select(&self) -> &SelectQuery {
        &self.select
    }

    pub fn select_mut(&mut self) -> &mut SelectQuery {
        &mut self.select
    }

    /// Replaces the live query. The cursor follows the query's last join.
    pub fn set_select(&mut self, select: SelectQuery) -> &mut Self {
        let cursor = JoinCursor::new(&self.table);
        self.cursor = match select.joins().last() {
            Some(join) => cursor.joined(join.correlation()),
            None => cursor,
        };
        self.select = select;
        self
    }

    /// Clears one clause of the live query, or starts over with `None`.
    pub fn reset(&mut self, clause: Option<Clause>) -> &mut Self {
        match clause {
            None | Some(Clause::From) => return self.get(()),
            Some(Clause::Joins) => self.cursor = JoinCursor::new(&self.table),
            Some(_) => {}
        }
        self.select.reset(clause);
        self
    }

    // ==================== joins ====================

    /// Joins `relation` from the base table.
    pub fn by(
        &mut self,
        relation: impl Into<Relation>,
        columns: impl IntoColumns,
    ) -> Result<&mut Self> {
        let source = self.cursor.base().to_string();
        self.join_relation(relation.into(), columns.into_columns(), &source)
    }

    /// Joins `relation` from the table joined last (the base table before
    /// any join), so relations can be chained.
    pub fn with(
        &mut self,
        relation: impl Into<Relation>,
        columns: impl IntoColumns,
    ) -> Result<&mut Self> {
        let source = self.cursor.source().to_string();
        self.join_relation(relation.into(), columns.into_columns(), &source)
    }

    fn join_relation(
        &mut self,
        relation: Relation,
        columns: Vec<Column>,
        source: &str,
    ) -> Result<&mut Self> {
        let descriptor = self
            .relations
            .get(&relation.name)
            .cloned()
            .ok_or_else(|| JoineryError::UnknownRelation(relation.name.clone()))?;
        let table = self.target_table(&relation.name, &descriptor.target)?;

        let table = match relation.alias {
            Some(alias) => TableRef::aliased(alias, table),
            None => TableRef::new(table),
        };
        let correlation = table.correlation().to_string();

        let mut on = Condition::new().and(Predicate::columns_eq(
            ColumnRef::qualified(correlation.as_str(), descriptor.target_column.as_str()),
            ColumnRef::qualified(source, descriptor.local_column.as_str()),
        ));
        if let Some(extra) = relation.extra {
            for predicate in extra.into_predicates() {
                on = on.and(predicate.or_table(&correlation));
            }
        }

        self.select
            .join(relation.join_type, table, on, columns)
            .map_err(|err| match err {
                JoineryError::JoinFailed { reason, .. } => JoineryError::JoinFailed {
                    relation: relation.name.clone(),
                    reason,
                },
                other => other,
            })?;

        crate::joinery_trace_join!(relation.name, correlation, source);
        self.cursor = self.cursor.joined(&correlation);
        Ok(self)
    }

    // ==================== clauses ====================

    /// `AND`s a filter qualified against the base table.
    pub fn r#where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        let table = self.table.clone();
        self.push_where(filter.into(), Some(table.as_str()), false)
    }

    pub fn where_on(&mut self, filter: impl Into<Filter>, hint: TableHint) -> Result<&mut Self> {
        let table = self.hint_table(hint)?;
        Ok(self.push_where(filter.into(), table.as_deref(), false))
    }

    /// `OR`s a filter qualified against the base table.
    pub fn or_where(&mut self, filter: impl Into<Filter>) -> &mut Self {
        let table = self.table.clone();
        self.push_where(filter.into(), Some(table.as_str()), true)
    }

    pub fn or_where_on(&mut self, filter: impl Into<Filter>, hint: TableHint) -> Result<&mut Self> {
        let table = self.hint_table(hint)?;
        Ok(self.push_where(filter.into(), table.as_deref(), true))
    }

    pub fn group(&mut self, column: &str) -> &mut Self {
        let column = qualify_term(column, Some(self.table.as_str()));
        self.select.group(column);
        self
    }

    pub fn group_on(&mut self, column: &str, hint: TableHint) -> Result<&mut Self> {
        let table = self.hint_table(hint)?;
        self.select.group(qualify_term(column, table.as_deref()));
        Ok(self)
    }

    /// Appends an ORDER BY term such as `"created DESC"`.
    pub fn order(&mut self, spec: &str) -> &mut Self {
        let spec = qualify_term(spec, Some(self.table.as_str()));
        self.select.order(&spec);
        self
    }

    pub fn order_on(&mut self, spec: &str, hint: TableHint) -> Result<&mut Self> {
        let table = self.hint_table(hint)?;
        self.select.order(&qualify_term(spec, table.as_deref()));
        Ok(self)
    }

    pub fn having(&mut self, filter: impl Into<Filter>) -> &mut Self {
        let table = self.table.clone();
        for predicate in qualify_filter(filter.into(), Some(table.as_str())) {
            self.select.having(predicate);
        }
        self
    }

    pub fn having_on(&mut self, filter: impl Into<Filter>, hint: TableHint) -> Result<&mut Self> {
        let table = self.hint_table(hint)?;
        for predicate in qualify_filter(filter.into(), table.as_deref()) {
            self.select.having(predicate);
        }
        Ok(self)
    }

    pub fn limit(&mut self, count: u64, offset: impl Into<Option<u64>>) -> &mut Self {
        self.select.limit(count, offset);
        self
    }

    /// Limits to 1-based `page`; `page_size` also becomes the size used by
    /// [`page_count`](Self::page_count) and [`paginator`](Self::paginator).
    pub fn limit_page(&mut self, page: u64, page_size: u64) -> &mut Self {
        self.page_size = page_size.max(1);
        self.select.limit_page(page, self.page_size);
        self
    }

    fn push_where(&mut self, filter: Filter, table: Option<&str>, or: bool) -> &mut Self {
        for predicate in qualify_filter(filter, table) {
            if or {
                self.select.or_where(predicate);
            } else {
                self.select.r#where(predicate);
            }
        }
        self
    }

    fn hint_table(&mut self, hint: TableHint) -> Result<Option<String>> {
        Ok(match hint {
            TableHint::Base => Some(self.table.clone()),
            TableHint::LastJoined => Some(self.cursor.source().to_string()),
            TableHint::Table(name) => Some(name),
            TableHint::Target(id) => Some(self.table_name(&id)?),
            TableHint::Relation(name) => {
                let target = self
                    .relations
                    .get(&name)
                    .map(|d| d.target.clone())
                    .ok_or_else(|| JoineryError::UnknownRelation(name.clone()))?;
                Some(self.target_table(&name, &target)?)
            }
            TableHint::Unqualified => None,
        })
    }

    // ==================== relations ====================

    /// Declares relations; entries replace same-named ones.
    pub fn add_map(&mut self, relations: RelationMap) -> &mut Self {
        self.relations.extend(relations);
        self
    }

    pub fn relations(&self) -> &RelationMap {
        &self.relations
    }

    /// Physical table name of a gateway identifier. The first lookup of an
    /// identifier merges that gateway's relations into this mapper's.
    pub fn table_name(&mut self, target: &str) -> Result<String> {
        let resolver = self.resolver.as_deref().map(|r| r as &dyn TableResolver);
        self.targets.table_for(resolver, target, &mut self.relations)
    }

    /// Resolves every target reachable through the relation graph now,
    /// instead of on first join. Returns how many targets were resolved.
    pub fn discover_relations(&mut self) -> Result<usize> {
        let resolver = self.resolver.as_deref().map(|r| r as &dyn TableResolver);
        self.targets.discover(resolver, &mut self.relations)
    }

    fn target_table(&mut self, relation: &str, target: &str) -> Result<String> {
        self.table_name(target).map_err(|err| match err {
            JoineryError::UnknownTarget(target) => JoineryError::MissingTargetTable {
                relation: relation.to_string(),
                target,
            },
            other => other,
        })
    }

    // ==================== accessors ====================

    pub fn base_table(&self) -> &str {
        &self.table
    }

    pub fn cursor(&self) -> &JoinCursor {
        &self.cursor
    }

    pub fn last_joined(&self) -> Option<&str> {
        self.cursor.last_joined()
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    // ==================== execution ====================

    pub fn query(&self) -> Result<Vec<Row>> {
        let (sql, params) = self.select.to_sql();
        crate::joinery_trace_query!(sql, params.len());
        self.adapter.fetch_all(&sql, &params)
    }

    pub fn query_one(&self) -> Result<Option<Row>> {
        let (sql, params) = self.select.to_sql();
        crate::joinery_trace_query!(sql, params.len());
        self.adapter.fetch_row(&sql, &params)
    }

    /// Rows the live query matches, counted now by a rewritten copy.
    pub fn row_count(&self) -> Result<u64> {
        let mut count = self.select.clone();
        count.prepare_for_count(DEFAULT_COUNT_ALIAS);
        fetch_count(&self.adapter, &count)
    }

    pub fn page_count(&self) -> Result<u64> {
        Ok(page_count(self.row_count()?, self.page_size))
    }

    /// A paginator over the live query, using this mapper's page size.
    pub fn paginator(&self) -> Paginator<&A> {
        Paginator::new(&self.adapter, &self.select).with_page_size(self.page_size)
    }
}

impl<A: Clone> Clone for Mapper<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            table: self.table.clone(),
            relations: self.relations.clone(),
            resolver: self.resolver.clone(),
            targets: self.targets.clone(),
            cursor: self.cursor.clone(),
            select: self.select.clone(),
            page_size: self.page_size,
        }
    }
}

impl<A> fmt::Debug for Mapper<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("table", &self.table)
            .field("relations", &self.relations)
            .field("cursor", &self.cursor)
            .field("select", &self.select)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<A> fmt::Display for Mapper<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.select, f)
    }
}

// =============================================================================
// Qualification
// =============================================================================

fn qualify_filter(filter: Filter, table: Option<&str>) -> Vec<Predicate> {
    let predicates = filter.into_predicates();
    let Some(table) = table else {
        return predicates;
    };
    predicates
        .into_iter()
        .map(|predicate| match predicate {
            Predicate::Raw(sql) => Predicate::Raw(qualify_fragment(&sql, table)),
            other => other.or_table(table),
        })
        .collect()
}

/// Prefixes a free-form fragment's leading column with `table`. Fragments
/// joining several comparisons, already qualified ones and ones opening with
/// anything but a bare column are left alone.
fn qualify_fragment(sql: &str, table: &str) -> String {
    if has_connective(sql) || starts_qualified(sql) {
        return sql.to_string();
    }
    let trimmed = sql.trim_start();
    let ident_len = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let starts_with_column = ident_len > 0
        && trimmed.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && !trimmed[ident_len..].trim_start().starts_with(['(', '.']);
    if starts_with_column {
        format!("{table}.{trimmed}")
    } else {
        sql.to_string()
    }
}

/// Qualifies a GROUP BY column or ORDER BY term naming a bare column.
fn qualify_term(term: &str, table: Option<&str>) -> String {
    let term = term.trim();
    let Some(table) = table else {
        return term.to_string();
    };
    let column = term.split_whitespace().next().unwrap_or_default();
    let bare = !column.is_empty()
        && column.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        format!("{table}.{term}")
    } else {
        term.to_string()
    }
}
