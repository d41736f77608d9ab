//! Relationship-aware SELECT composition.
//!
//! The pieces, leaves first:
//!
//! - [`SelectQuery`] accumulates clause fragments and renders them, and can
//!   rewrite itself into a row-count query ([`SelectQuery::prepare_for_count`]).
//! - [`RelationMap`] declares named joins between tables; a [`TableResolver`]
//!   (usually a [`Catalog`]) maps gateway identifiers to physical tables.
//! - [`Mapper`] owns one base table, one adapter and one live query, and joins
//!   by relation name with [`Mapper::by`] and [`Mapper::with`].
//! - [`Paginator`] counts rows and pages from a private, rewritten clone.

pub mod adapter;
pub mod error;
pub mod join;
pub mod mapper;
pub mod paginator;
pub mod predicate;
pub mod relation;
pub mod select;
pub mod trace;
pub mod value;

pub use adapter::{Adapter, Row};
pub use error::{ConfigError, JoineryError, Result};
pub use join::{Join, JoinType, TableRef};
pub use mapper::{JoinCursor, Mapper, MapperBuilder, Relation, TableHint};
pub use paginator::{Paginator, page_count};
pub use predicate::{Condition, Connective, Filter, Predicate};
pub use relation::{Catalog, RelationMap, RelationshipDescriptor, TableDefinition, TableResolver};
pub use select::{Clause, Column, Limit, OrderBy, OrderTerm, SelectQuery};
pub use value::Value;

/// Column alias used by count rewrites when the caller does not pick one.
pub const DEFAULT_COUNT_ALIAS: &str = "count";

/// Page size used by paginators when none is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
