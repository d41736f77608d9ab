use joinery_core::{Adapter, Result, Row, Value};
use rusqlite::{Connection, params_from_iter};

/// An [`Adapter`] over a rusqlite connection.
///
/// Parameters bind positionally to `?` placeholders. Share one adapter
/// between several mappers by reference or through an `Rc`/`Arc`.
#[derive(Debug)]
pub struct SqliteAdapter {
    conn: Connection,
}

impl SqliteAdapter {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl From<Connection> for SqliteAdapter {
    fn from(conn: Connection) -> Self {
        Self::new(conn)
    }
}

impl Adapter for SqliteAdapter {
    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|idx| row.get_ref(idx).map(Value::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            results.push(Row::new(columns.clone(), values));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::JoineryError;

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::open_in_memory().unwrap();
        adapter
            .connection()
            .execute_batch(
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY, name TEXT NOT NULL, avatar BLOB, score REAL
                 );
                 INSERT INTO users (id, name, avatar, score) VALUES
                    (1, 'ada', x'0102', 1.5), (2, 'bob', NULL, NULL);",
            )
            .unwrap();
        adapter
    }

    #[test]
    fn rows_keep_column_names_and_types() {
        let adapter = adapter();
        let rows = adapter
            .fetch_all("SELECT id, name, avatar, score FROM users ORDER BY id", &[])
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns(), ["id", "name", "avatar", "score"]);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("ada".into())));
        assert_eq!(rows[0].get("avatar"), Some(&Value::Blob(vec![1, 2])));
        assert_eq!(rows[0].get("score"), Some(&Value::Real(1.5)));
        assert_eq!(rows[1].get("avatar"), Some(&Value::Null));
    }

    #[test]
    fn parameters_bind_positionally() {
        let adapter = adapter();
        let name = adapter
            .fetch_one(
                "SELECT name FROM users WHERE id = ? AND name <> ?",
                &[Value::Integer(2), Value::Text("ada".into())],
            )
            .unwrap();
        assert_eq!(name, Some(Value::Text("bob".into())));
    }

    #[test]
    fn driver_errors_surface() {
        let err = adapter().fetch_all("SELECT * FROM nowhere", &[]).unwrap_err();
        assert!(matches!(err, JoineryError::Rusqlite(_)));
        assert!(!err.is_configuration());
    }
}
