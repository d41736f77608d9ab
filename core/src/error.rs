use thiserror::Error;

#[derive(Debug, Error)]
pub enum JoineryError {
    /// The relation name is not declared in the mapper's relationship map
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// Join type outside inner/left/right/full/cross/natural
    #[error("Join type {0} is not valid")]
    InvalidJoinType(String),

    /// A join could not be applied to the query
    #[error("Join on relation \"{relation}\" failed: {reason}")]
    JoinFailed { relation: String, reason: String },

    /// The table resolver has no gateway registered under this identifier
    #[error("Unknown target table: {0}")]
    UnknownTarget(String),

    /// A relation points at a gateway the resolver cannot find
    #[error("Relation \"{relation}\" targets missing table gateway {target}")]
    MissingTargetTable { relation: String, target: String },

    /// A free-form predicate could not be scanned for table qualifiers
    #[error("Malformed predicate \"{predicate}\": {reason}")]
    MalformedPredicate { predicate: String, reason: String },

    /// Error executing a query
    #[error("Execution error: {0}")]
    Execution(String),

    /// Error mapping a result value
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Error loading a catalog
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl JoineryError {
    /// True for failures caused by how the query or mapper was set up, as
    /// opposed to failures reported by the database.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            JoineryError::UnknownRelation(_)
                | JoineryError::InvalidJoinType(_)
                | JoineryError::JoinFailed { .. }
                | JoineryError::UnknownTarget(_)
                | JoineryError::MissingTargetTable { .. }
                | JoineryError::MalformedPredicate { .. }
                | JoineryError::Config(_)
        )
    }
}

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for query composition and execution
pub type Result<T> = std::result::Result<T, JoineryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_distinguished_from_execution() {
        assert!(JoineryError::UnknownRelation("Users".into()).is_configuration());
        assert!(JoineryError::InvalidJoinType("sideways".into()).is_configuration());
        assert!(!JoineryError::Execution("disk I/O error".into()).is_configuration());
        assert!(!JoineryError::Mapping("not a number".into()).is_configuration());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = JoineryError::JoinFailed {
            relation: "Users".into(),
            reason: "correlation name us is already in use".into(),
        };
        assert_eq!(
            err.to_string(),
            "Join on relation \"Users\" failed: correlation name us is already in use"
        );
    }
}
