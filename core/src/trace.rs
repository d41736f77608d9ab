//! Tracing utilities for query composition and execution.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// joinery_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! joinery_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(sql = %$sql, params = $param_count, "joinery.query");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$sql, &$param_count);
    };
}

/// Emit a debug-level event for a join resolved from a relation name.
#[macro_export]
macro_rules! joinery_trace_join {
    ($relation:expr, $alias:expr, $source:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(
            relation = %$relation,
            alias = %$alias,
            source = %$source,
            "joinery.join"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (&$relation, &$alias, &$source);
    };
}

/// Emit a debug-level event for a left join dropped by a count rewrite.
#[macro_export]
macro_rules! joinery_trace_prune {
    ($alias:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(alias = %$alias, "joinery.count.prune");
        #[cfg(not(feature = "tracing"))]
        let _ = &$alias;
    };
}

/// Emit a debug-level event when a target's relationships are merged in.
#[macro_export]
macro_rules! joinery_trace_merge {
    ($target:expr, $added:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target_table = %$target, added = $added, "joinery.relations.merge");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$target, &$added);
    };
}

/// Emit a warn-level event for a conservative fallback.
#[macro_export]
macro_rules! joinery_trace_warn {
    ($message:literal, $detail:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(detail = %$detail, $message);
        #[cfg(not(feature = "tracing"))]
        let _ = &$detail;
    };
}

#[cfg(test)]
#[deny(unused_variables)]
mod tests {
    #[test]
    fn arguments_are_used_with_or_without_tracing() {
        let sql = String::from("SELECT 1");
        let params = [1, 2];
        crate::joinery_trace_query!(sql, params.len());

        let (relation, alias, source) = ("Users", "u", "conversations");
        crate::joinery_trace_join!(relation, alias, source);

        let alias = "p";
        crate::joinery_trace_prune!(alias);

        let added = 2;
        crate::joinery_trace_merge!("Users", added);

        let err = crate::JoineryError::InvalidJoinType("outer".into());
        crate::joinery_trace_warn!("keeping every join in count query", err);

        assert_eq!(sql, "SELECT 1");
    }
}
