use hashbrown::HashMap;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use super::RelationMap;
use crate::{JoineryError, Result};

/// A table gateway: the physical table and the relations declared on it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct TableDefinition {
    /// Physical table name
    pub name: String,
    #[cfg_attr(feature = "config", serde(default))]
    pub relations: RelationMap,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: RelationMap::new(),
        }
    }

    pub fn with_relations(mut self, relations: RelationMap) -> Self {
        self.relations = relations;
        self
    }
}

/// Maps gateway identifiers to table definitions.
pub trait TableResolver {
    /// Fails with [`JoineryError::UnknownTarget`] for identifiers it does not know.
    fn resolve(&self, target: &str) -> Result<TableDefinition>;
}

impl<F> TableResolver for F
where
    F: Fn(&str) -> Option<TableDefinition>,
{
    fn resolve(&self, target: &str) -> Result<TableDefinition> {
        self(target).ok_or_else(|| JoineryError::UnknownTarget(target.to_string()))
    }
}

/// An in-memory registry of table gateways.
///
/// With the `config` feature a catalog can be loaded from TOML:
///
/// ```toml
/// [tables.Users]
/// name = "users"
///
/// [tables.Users.relations.Profile]
/// local_column = "id"
/// target = "Profiles"
/// target_column = "user_id"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct Catalog {
    #[cfg_attr(feature = "config", serde(default))]
    tables: HashMap<String, TableDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    pub fn table(mut self, id: impl Into<String>, definition: TableDefinition) -> Self {
        self.register(id, definition);
        self
    }

    pub fn register(&mut self, id: impl Into<String>, definition: TableDefinition) {
        self.tables.insert(id.into(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&TableDefinition> {
        self.tables.get(id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Load a catalog from a TOML file
    #[cfg(feature = "config")]
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, crate::ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::ConfigError::IoError(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse a catalog from a TOML string
    #[cfg(feature = "config")]
    pub fn parse(s: &str) -> std::result::Result<Self, crate::ConfigError> {
        toml::from_str(s).map_err(|e| crate::ConfigError::ParseError(e.to_string()))
    }
}

impl TableResolver for Catalog {
    fn resolve(&self, target: &str) -> Result<TableDefinition> {
        self.tables
            .get(target)
            .cloned()
            .ok_or_else(|| JoineryError::UnknownTarget(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationshipDescriptor;

    #[test]
    fn catalog_resolves_registered_gateways() {
        let catalog = Catalog::new().table("Users", TableDefinition::new("users"));
        assert_eq!(catalog.resolve("Users").unwrap().name, "users");
        assert!(matches!(
            catalog.resolve("Ghosts"),
            Err(JoineryError::UnknownTarget(id)) if id == "Ghosts"
        ));
    }

    #[test]
    fn closures_resolve_too() {
        let resolver = |id: &str| (id == "Users").then(|| TableDefinition::new("users"));
        assert_eq!(resolver.resolve("Users").unwrap().name, "users");
        assert!(resolver.resolve("Posts").is_err());
    }

    #[cfg(feature = "config")]
    #[test]
    fn parses_toml_catalogs() {
        let toml = r#"
[tables.Users]
name = "users"

[tables.Users.relations.Profile]
local_column = "id"
target = "Profiles"
target_column = "user_id"

[tables.Profiles]
name = "user_profiles"
"#;
        let catalog = Catalog::parse(toml).unwrap();
        assert_eq!(catalog.len(), 2);
        let users = catalog.get("Users").unwrap();
        assert_eq!(
            users.relations.get("Profile"),
            Some(&RelationshipDescriptor::new("id", "Profiles", "user_id"))
        );
        assert!(catalog.get("Profiles").unwrap().relations.is_empty());
    }

    #[cfg(feature = "config")]
    #[test]
    fn reports_parse_and_io_errors() {
        assert!(matches!(
            Catalog::parse("[tables.Users]\nname = 3"),
            Err(crate::ConfigError::ParseError(_))
        ));
        assert!(matches!(
            Catalog::from_file(std::path::Path::new("/nonexistent/joinery.toml")),
            Err(crate::ConfigError::IoError(_))
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn loads_catalog_files() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tables.Users]\nname = \"users\"").unwrap();
        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.resolve("Users").unwrap().name, "users");
    }
}
