#![cfg(feature = "config")]

use std::io::Write;

use joinery::error::ConfigError;
use joinery::prelude::*;

mod common;
use common::Recorder;

const CATALOG: &str = r#"
[tables.Conversations]
name = "conversations"

[tables.Conversations.relations.Users]
local_column = "user_id"
target = "Users"
target_column = "id"

[tables.Users]
name = "users"

[tables.Users.relations.Profile]
local_column = "id"
target = "Profiles"
target_column = "user_id"

[tables.Profiles]
name = "user_profiles"
"#;

#[test]
fn mappers_build_from_catalog_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();
    let catalog = Catalog::from_file(file.path()).unwrap();
    assert_eq!(catalog.len(), 3);

    let adapter = Recorder::default();
    let mut mapper = Mapper::builder(&adapter, "unused")
        .gateway("Conversations")
        .resolver(catalog)
        .build()
        .unwrap();

    mapper
        .get(["id"])
        .by("Users", ())
        .unwrap()
        .with("Profile", ["about"])
        .unwrap();

    assert_eq!(
        mapper.to_string(),
        "SELECT conversations.id, user_profiles.about FROM conversations \
         INNER JOIN users ON users.id = conversations.user_id \
         INNER JOIN user_profiles ON user_profiles.user_id = users.id"
    );
}

#[test]
fn catalog_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("catalog.toml");
    assert!(matches!(Catalog::from_file(&missing), Err(ConfigError::IoError(_))));

    let err = Catalog::parse("[tables.Users]\nrelations = 7").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));

    let err: JoineryError = err.into();
    assert!(err.is_configuration());
}
