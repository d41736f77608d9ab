//! Row and page counts for a composed query.

use crate::{Adapter, DEFAULT_COUNT_ALIAS, DEFAULT_PAGE_SIZE, JoineryError, Result, SelectQuery};

/// Number of pages needed for `total` rows, `page_size` rows per page.
///
/// An empty result still has one (empty) page. A page size of 0 reads as 1.
///
/// ```
/// use joinery_core::page_count;
///
/// assert_eq!(page_count(12, 10), 2);
/// assert_eq!(page_count(0, 10), 1);
/// ```
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if total == 0 {
        return 1;
    }
    (total - 1) / page_size.max(1) + 1
}

/// Runs a count query and reads its single value.
pub(crate) fn fetch_count<A: Adapter + ?Sized>(adapter: &A, query: &SelectQuery) -> Result<u64> {
    let (sql, params) = query.to_sql();
    crate::joinery_trace_query!(sql, params.len());

    match adapter.fetch_one(&sql, &params)? {
        None => Ok(0),
        Some(value) if value.is_null() => Ok(0),
        Some(value) => value
            .as_count()
            .ok_or_else(|| JoineryError::Mapping(format!("count query returned {value:?}"))),
    }
}

/// Counts the rows and pages of a query.
///
/// The paginator works on its own copy of the query, rewritten into count form
/// when the paginator is built; later changes to the caller's query are not
/// seen. Both counts are computed on first access and then cached.
#[derive(Clone, Debug)]
pub struct Paginator<A> {
    adapter: A,
    query: SelectQuery,
    page_size: u64,
    total: Option<u64>,
    pages: Option<u64>,
}

impl<A: Adapter> Paginator<A> {
    pub fn new(adapter: A, query: &SelectQuery) -> Self {
        let mut query = query.clone();
        query.prepare_for_count(DEFAULT_COUNT_ALIAS);
        Self {
            adapter,
            query,
            page_size: DEFAULT_PAGE_SIZE,
            total: None,
            pages: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.set_page_size(page_size);
        self
    }

    /// Counts `COUNT(column)` instead of `COUNT(*)`, e.g. `DISTINCT users.id`.
    pub fn count_column(mut self, column: &str) -> Self {
        if self.total.is_none() {
            self.query.prepare_for_count_column(DEFAULT_COUNT_ALIAS, column);
        }
        self
    }

    /// Has no effect once [`total`](Self::total) or [`pages`](Self::pages)
    /// has been computed. A size of 0 reads as 1.
    pub fn set_page_size(&mut self, page_size: u64) {
        if self.total.is_none() {
            self.page_size = page_size.max(1);
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The rewritten count query.
    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    /// Total number of rows the original query matches.
    pub fn total(&mut self) -> Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let total = fetch_count(&self.adapter, &self.query)?;
        self.total = Some(total);
        Ok(total)
    }

    /// Number of pages, at least 1.
    pub fn pages(&mut self) -> Result<u64> {
        if let Some(pages) = self.pages {
            return Ok(pages);
        }
        let pages = page_count(self.total()?, self.page_size);
        self.pages = Some(pages);
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::{JoinType, Row, Value};

    struct Counting {
        count: i64,
        calls: Cell<usize>,
        last_sql: RefCell<String>,
    }

    impl Counting {
        fn new(count: i64) -> Self {
            Self {
                count,
                calls: Cell::new(0),
                last_sql: RefCell::new(String::new()),
            }
        }
    }

    impl Adapter for Counting {
        fn fetch_all(&self, sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            self.calls.set(self.calls.get() + 1);
            *self.last_sql.borrow_mut() = sql.to_string();
            Ok(vec![Row::new(
                vec!["count".to_string()],
                vec![Value::Integer(self.count)],
            )])
        }
    }

    fn users() -> SelectQuery {
        let mut query = SelectQuery::new();
        query.from("users", ["id", "name"]).order("name");
        query
    }

    #[test]
    fn page_count_formula() {
        assert_eq!(page_count(12, 10), 2);
        assert_eq!(page_count(37, 10), 4);
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(59, 30), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn counts_are_computed_once() {
        let adapter = Counting::new(37);
        let mut paginator = Paginator::new(&adapter, &users());

        assert_eq!(paginator.total().unwrap(), 37);
        assert_eq!(paginator.pages().unwrap(), 4);
        assert_eq!(paginator.total().unwrap(), 37);
        assert_eq!(paginator.pages().unwrap(), 4);
        assert_eq!(adapter.calls.get(), 1);
        assert_eq!(
            adapter.last_sql.borrow().as_str(),
            "SELECT COUNT(*) AS count FROM users"
        );
    }

    #[test]
    fn page_size_is_fixed_after_counting() {
        let adapter = Counting::new(59);
        let mut paginator = Paginator::new(&adapter, &users()).with_page_size(30);
        assert_eq!(paginator.total().unwrap(), 59);

        paginator.set_page_size(10);
        assert_eq!(paginator.page_size(), 30);
        assert_eq!(paginator.pages().unwrap(), 2);
    }

    #[test]
    fn later_changes_to_the_source_query_are_not_seen() {
        let adapter = Counting::new(12);
        let mut query = users();
        let mut paginator = Paginator::new(&adapter, &query);
        let before = paginator.query().clone();

        query
            .join(JoinType::Inner, "posts", "posts.user_id = users.id", ["title"])
            .unwrap()
            .r#where("posts.published = 1");

        assert_eq!(paginator.query(), &before);
        assert_eq!(paginator.total().unwrap(), 12);
        assert!(!adapter.last_sql.borrow().contains("posts"));
    }

    #[test]
    fn custom_count_columns() {
        let adapter = Counting::new(3);
        let paginator = Paginator::new(&adapter, &users()).count_column("DISTINCT users.id");
        assert_eq!(
            paginator.query().render(),
            "SELECT COUNT(DISTINCT users.id) AS count FROM users"
        );
    }

    #[test]
    fn empty_results_count_as_zero() {
        struct Empty;
        impl Adapter for Empty {
            fn fetch_all(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
                Ok(Vec::new())
            }
        }

        let mut paginator = Paginator::new(Empty, &users());
        assert_eq!(paginator.total().unwrap(), 0);
        assert_eq!(paginator.pages().unwrap(), 1);
    }

    #[test]
    fn non_numeric_counts_are_mapping_errors() {
        struct Garbage;
        impl Adapter for Garbage {
            fn fetch_all(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
                Ok(vec![Row::new(vec!["count".into()], vec![Value::Text("many".into())])])
            }
        }

        let err = Paginator::new(Garbage, &users()).total().unwrap_err();
        assert!(matches!(err, JoineryError::Mapping(_)));
    }
}
