#![cfg(feature = "rusqlite")]

use joinery::prelude::*;
use joinery::sqlite::rusqlite::Connection;

fn setup_db() -> SqliteAdapter {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE user_profiles (
            user_id INTEGER NOT NULL, about TEXT, public INTEGER NOT NULL, avatar_id INTEGER
         );
         CREATE TABLE avatars (id INTEGER PRIMARY KEY, url TEXT NOT NULL);
         CREATE TABLE conversations (
            id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, title TEXT, created INTEGER NOT NULL
         );

         INSERT INTO users (id, name) VALUES (1, 'ada'), (2, 'bob'), (3, 'cyd');
         INSERT INTO user_profiles (user_id, about, public, avatar_id) VALUES
            (1, 'engines', 1, 1), (2, 'builds', 0, NULL);
         INSERT INTO avatars (id, url) VALUES (1, 'ada.png');
         INSERT INTO conversations (id, user_id, title, created) VALUES
            (1, 1, 'first', 10), (2, 1, 'second', 20), (3, 2, 'third', 30),
            (4, 3, 'fourth', 40), (5, 1, 'fifth', 50);",
    )
    .expect("Failed to create tables");
    SqliteAdapter::new(conn)
}

fn conversations(adapter: &SqliteAdapter) -> Mapper<&SqliteAdapter> {
    Mapper::new(
        adapter,
        "conversations",
        RelationMap::new()
            .relation("Users", RelationshipDescriptor::new("user_id", "users", "id"))
            .relation(
                "Profile",
                RelationshipDescriptor::new("user_id", "user_profiles", "user_id"),
            )
            .relation("Avatar", RelationshipDescriptor::new("avatar_id", "avatars", "id")),
    )
}

#[test]
fn joined_rows_come_back_named() {
    let db = setup_db();
    let mut mapper = conversations(&db);
    mapper
        .get(["id", "title"])
        .by("Users", ["name"])
        .unwrap()
        .r#where([("user_id", 1)])
        .order("created DESC");

    let rows = mapper.query().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("title"), Some(&Value::Text("fifth".into())));
    assert_eq!(rows[0].get("name"), Some(&Value::Text("ada".into())));

    let first = mapper.query_one().unwrap().unwrap();
    assert_eq!(first.get("id"), Some(&Value::Integer(5)));
}

#[test]
fn counts_match_the_unpruned_query() {
    let db = setup_db();
    let mut mapper = conversations(&db);
    mapper
        .get(())
        .by(Relation::new("Profile").join_type(JoinType::Left), ["about"])
        .unwrap()
        .limit_page(1, 2);

    assert_eq!(mapper.query().unwrap().len(), 2);
    assert_eq!(mapper.row_count().unwrap(), 5);
    assert_eq!(mapper.page_count().unwrap(), 3);

    mapper.where_on([("public", 1)], TableHint::LastJoined).unwrap();
    let mut paginator = mapper.paginator();
    assert_eq!(paginator.total().unwrap(), 3);
    assert_eq!(paginator.pages().unwrap(), 2);
}

#[test]
fn extra_join_conditions_bind_parameters() {
    let db = setup_db();
    let mut mapper = conversations(&db);
    mapper
        .get(["id"])
        .by(
            Relation::aliased("p", "Profile")
                .join_type(JoinType::Left)
                .on([("public", 1)]),
            ["about"],
        )
        .unwrap()
        .order("id");

    let rows = mapper.query().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[2].get("about"), Some(&Value::Null));
    assert_eq!(rows[0].get("about"), Some(&Value::Text("engines".into())));
}

#[test]
fn counts_keep_left_joins_that_chained_joins_go_through() {
    let db = setup_db();
    let mut mapper = conversations(&db);
    mapper
        .get(())
        .by(Relation::aliased("p", "Profile").join_type(JoinType::Left), ())
        .unwrap()
        .with(Relation::new("Avatar").join_type(JoinType::Left), ["url"])
        .unwrap()
        .where_on("id IS NULL", TableHint::LastJoined)
        .unwrap();

    assert_eq!(mapper.query().unwrap().len(), 2);
    assert_eq!(mapper.row_count().unwrap(), 2);
    assert_eq!(mapper.paginator().total().unwrap(), 2);
}
