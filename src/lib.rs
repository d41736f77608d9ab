//! # joinery
//!
//! Relationship-aware SELECT composition with count-optimized pagination.
//!
//! ## Quick Start
//!
//! ```rust
//! use joinery::prelude::*;
//!
//! struct NoDb;
//!
//! impl Adapter for NoDb {
//!     fn fetch_all(&self, _sql: &str, _params: &[Value]) -> joinery::Result<Vec<Row>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # fn main() -> joinery::Result<()> {
//! let relations = RelationMap::new()
//!     .relation("Author", RelationshipDescriptor::new("author_id", "users", "id"));
//! let mut posts = Mapper::new(NoDb, "posts", relations);
//!
//! posts
//!     .get(["id", "title"])
//!     .by(Relation::new("Author").join_type(JoinType::Left), ["name"])?
//!     .r#where([("published", 1)])
//!     .order("created DESC")
//!     .limit_page(2, 20);
//!
//! assert_eq!(
//!     posts.to_string(),
//!     "SELECT posts.id, posts.title, users.name FROM posts \
//!      LEFT JOIN users ON users.id = posts.author_id \
//!      WHERE posts.published = ? ORDER BY posts.created DESC LIMIT 20 OFFSET 20"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature    | Enables                                      |
//! |------------|----------------------------------------------|
//! | `config`   | `Catalog::parse` / `Catalog::from_file` (TOML) |
//! | `rusqlite` | [`sqlite::SqliteAdapter`]                    |
//! | `tracing`  | structured events for queries, joins, pruning |

/// Result type for joinery operations
pub use joinery_core::Result;

/// Error types
pub mod error {
    pub use joinery_core::error::{ConfigError, JoineryError};
}

/// Query composition: builder, relations, mapper, paginator.
pub mod core {
    pub use joinery_core::{
        Adapter, Catalog, Clause, Column, Condition, Connective, DEFAULT_COUNT_ALIAS,
        DEFAULT_PAGE_SIZE, Filter, Join, JoinCursor, JoinType, Limit, Mapper, MapperBuilder,
        OrderBy, OrderTerm, Paginator, Predicate, Relation, RelationMap, RelationshipDescriptor,
        Row, SelectQuery, TableDefinition, TableHint, TableRef, TableResolver, Value, page_count,
    };

    /// Predicate types and the free-form fragment scanner
    pub use joinery_core::predicate;

    pub use joinery_core::select::IntoColumns;

    #[doc(hidden)]
    pub use joinery_core::{
        joinery_trace_join, joinery_trace_merge, joinery_trace_prune, joinery_trace_query,
        joinery_trace_warn,
    };
}

/// SQLite adapter over rusqlite.
#[cfg(feature = "rusqlite")]
pub mod sqlite {
    pub use joinery_sqlite::SqliteAdapter;

    pub use ::rusqlite;
}

pub mod prelude {
    pub use crate::core::{
        Adapter, Catalog, Clause, Column, Filter, IntoColumns, JoinType, Mapper, MapperBuilder,
        Paginator, Predicate, Relation, RelationMap, RelationshipDescriptor, Row, SelectQuery,
        TableDefinition, TableHint, TableResolver, Value,
    };
    pub use crate::error::JoineryError;

    #[cfg(feature = "rusqlite")]
    pub use crate::sqlite::SqliteAdapter;
}
