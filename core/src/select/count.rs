//! Row-count rewrite.
//!
//! A left join that no WHERE predicate reads from is dropped from the count
//! query. This assumes such joins match at most one row per base row; a
//! one-to-many left join can make the rewritten count differ from the row
//! count of the original statement, whether or not it is pruned.
//!
//! A left join stays whenever the `ON` condition of a join that stays reads
//! from it, so chained joins keep the tables they are joined through.
//! Correlation names are compared case-insensitively.

use hashbrown::HashSet;

use super::{Clause, Column, SelectQuery};
use crate::{Result, joinery_trace_prune, joinery_trace_warn};

impl SelectQuery {
    /// Tables and aliases that WHERE predicates read through qualified columns.
    ///
    /// HAVING and ON fragments are not consulted.
    pub fn try_filtering_tables(&self) -> Result<HashSet<String>> {
        let mut tables = HashSet::new();
        for (_, predicate) in &self.predicates {
            tables.extend(predicate.tables()?);
        }
        Ok(tables)
    }

    /// [`try_filtering_tables`](Self::try_filtering_tables), or `None` when a
    /// free-form predicate cannot be scanned.
    pub fn filtering_tables(&self) -> Option<HashSet<String>> {
        self.try_filtering_tables().ok()
    }

    /// Rewrites the query into `SELECT COUNT(*) AS {alias} ...`.
    pub fn prepare_for_count(&mut self, alias: &str) -> &mut Self {
        self.prepare_for_count_column(alias, "*")
    }

    /// Rewrites the query into a count of `column`.
    ///
    /// GROUP BY, ORDER BY, LIMIT and every projected column are cleared, and
    /// left joins nothing still needs are removed. When a WHERE or ON
    /// fragment cannot be scanned all joins are kept.
    pub fn prepare_for_count_column(&mut self, alias: &str, column: &str) -> &mut Self {
        self.reset(Some(Clause::Group))
            .reset(Some(Clause::Order))
            .reset(Some(Clause::Limit))
            .reset(Some(Clause::Columns));

        match self.required_correlations() {
            Ok(required) => self.joins.retain(|join| {
                let keep = !join.join_type.is_optional()
                    || required.contains(&join.correlation().to_ascii_lowercase());
                if !keep {
                    joinery_trace_prune!(join.correlation());
                }
                keep
            }),
            Err(err) => {
                joinery_trace_warn!("keeping every join in count query", err);
            }
        }

        self.columns = vec![Column::expr(format!("COUNT({column})")).aliased(alias)];
        self
    }

    /// Lowercased correlation names a count query must keep joined: the WHERE
    /// qualifiers, then whatever the `ON` of a kept join reads, until no
    /// more names are added.
    fn required_correlations(&self) -> Result<HashSet<String>> {
        let mut required: HashSet<String> = self
            .try_filtering_tables()?
            .iter()
            .map(|table| table.to_ascii_lowercase())
            .collect();

        loop {
            let mut grew = false;
            for join in &self.joins {
                let kept = !join.join_type.is_optional()
                    || required.contains(&join.correlation().to_ascii_lowercase());
                if !kept {
                    continue;
                }
                for predicate in join.on.predicates() {
                    for table in predicate.tables()? {
                        grew |= required.insert(table.to_ascii_lowercase());
                    }
                }
            }
            if !grew {
                return Ok(required);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{JoinType, SelectQuery, Value};

    fn users_with_profile() -> SelectQuery {
        let mut query = SelectQuery::new();
        query
            .from("users", ["name"])
            .join(
                JoinType::Left,
                "users_profile",
                "users_profile.user_id = users.id",
                ["about"],
            )
            .unwrap();
        query
    }

    #[test]
    fn count_drops_columns_grouping_order_and_limit() {
        let mut query = SelectQuery::new();
        query
            .from("users", ["name", "user"])
            .order("id DESC")
            .group("email")
            .limit_page(1, 10)
            .prepare_for_count("count");
        assert_eq!(query.render(), "SELECT COUNT(*) AS count FROM users");
    }

    #[test]
    fn filtering_left_joins_are_kept() {
        let mut query = users_with_profile();
        query.r#where("users_profile.status=1").prepare_for_count("count");
        assert_eq!(
            query.render(),
            "SELECT COUNT(*) AS count FROM users \
             LEFT JOIN users_profile ON users_profile.user_id = users.id \
             WHERE users_profile.status=1"
        );
    }

    #[test]
    fn non_filtering_left_joins_are_dropped() {
        let mut query = users_with_profile();
        query.prepare_for_count("count");
        assert_eq!(query.render(), "SELECT COUNT(*) AS count FROM users");
    }

    #[test]
    fn aliased_left_join_is_kept_by_alias() {
        let mut query = SelectQuery::new();
        query
            .from("orders", ())
            .join(JoinType::Left, ("p", "payments"), "p.order_id = orders.id", ())
            .unwrap()
            .join(JoinType::Left, ("s", "shipments"), "s.order_id = orders.id", ())
            .unwrap()
            .r#where("p.status=1");
        query.prepare_for_count("total");
        let joins: Vec<_> = query.joins().iter().map(|j| j.correlation()).collect();
        assert_eq!(joins, vec!["p"]);
    }

    #[test]
    fn inner_joins_survive_without_filters() {
        let mut query = SelectQuery::new();
        query
            .from("conversations", ())
            .join(JoinType::Inner, "users", "users.id = conversations.user_id", ())
            .unwrap();
        query.prepare_for_count("count");
        assert_eq!(query.joins().len(), 1);
    }

    #[test]
    fn structured_predicates_mark_their_tables() {
        let mut query = users_with_profile();
        query.r#where([("users_profile.status", 1)]);
        query.prepare_for_count("count");
        assert_eq!(query.joins().len(), 1);
        assert_eq!(query.params(), vec![Value::from(1)]);
    }

    #[test]
    fn unscannable_predicates_keep_every_join() {
        let mut query = users_with_profile();
        query.r#where("users.id IN (SELECT user_id FROM bans)");
        assert!(query.filtering_tables().is_none());
        query.prepare_for_count("count");
        assert_eq!(query.joins().len(), 1);
    }

    #[test]
    fn count_rewrite_is_idempotent() {
        let mut query = users_with_profile();
        query
            .join(JoinType::Left, ("p", "photos"), "p.user_id = users.id", ())
            .unwrap()
            .r#where("p.public = 1");
        query.prepare_for_count("count");
        let once = query.clone();
        query.prepare_for_count("count");
        assert_eq!(query, once);
        assert_eq!(query.columns().len(), 1);
    }

    #[test]
    fn count_of_a_column() {
        let mut query = SelectQuery::new();
        query.from("users", ()).prepare_for_count_column("n", "DISTINCT email");
        assert_eq!(query.render(), "SELECT COUNT(DISTINCT email) AS n FROM users");
    }

    #[test]
    fn left_joins_read_by_kept_joins_stay() {
        let mut query = SelectQuery::new();
        query
            .from("conversations", ())
            .join(
                JoinType::Left,
                ("p", "user_profiles"),
                "p.user_id = conversations.user_id",
                (),
            )
            .unwrap()
            .join(JoinType::Left, "avatars", "avatars.id = p.avatar_id", ())
            .unwrap()
            .join(JoinType::Left, ("s", "stats"), "s.user_id = conversations.user_id", ())
            .unwrap()
            .r#where("avatars.id IS NULL");
        query.prepare_for_count("count");
        assert_eq!(
            query.render(),
            "SELECT COUNT(*) AS count FROM conversations \
             LEFT JOIN user_profiles AS p ON p.user_id = conversations.user_id \
             LEFT JOIN avatars ON avatars.id = p.avatar_id \
             WHERE avatars.id IS NULL"
        );
    }

    #[test]
    fn inner_joins_keep_the_left_joins_they_read() {
        let mut query = SelectQuery::new();
        query
            .from("orders", ())
            .join(JoinType::Left, ("c", "customers"), "c.id = orders.customer_id", ())
            .unwrap()
            .join(JoinType::Inner, ("r", "regions"), "r.id = c.region_id", ())
            .unwrap();
        query.prepare_for_count("count");
        let joins: Vec<_> = query.joins().iter().map(|j| j.correlation()).collect();
        assert_eq!(joins, vec!["c", "r"]);
    }

    #[test]
    fn qualifier_case_does_not_matter() {
        let mut query = SelectQuery::new();
        query
            .from("orders", ())
            .join(JoinType::Left, ("p", "payments"), "p.order_id = orders.id", ())
            .unwrap()
            .r#where("P.status = 1");
        query.prepare_for_count("count");
        assert_eq!(query.joins().len(), 1);
    }

    #[test]
    fn filtering_tables_ignore_having() {
        let mut query = users_with_profile();
        query.having("users_profile.score > 3");
        assert!(query.filtering_tables().unwrap().is_empty());
    }
}
