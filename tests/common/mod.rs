#![allow(dead_code)]

use std::cell::RefCell;

use joinery::prelude::*;

/// Records every statement and answers each with one canned row.
#[derive(Default)]
pub struct Recorder {
    pub statements: RefCell<Vec<(String, Vec<Value>)>>,
    pub answer: Option<Value>,
}

impl Recorder {
    pub fn answering(value: impl Into<Value>) -> Self {
        Self {
            answer: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements.borrow().iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn calls(&self) -> usize {
        self.statements.borrow().len()
    }
}

impl Adapter for Recorder {
    fn fetch_all(&self, sql: &str, params: &[Value]) -> joinery::Result<Vec<Row>> {
        self.statements
            .borrow_mut()
            .push((sql.to_string(), params.to_vec()));
        Ok(self
            .answer
            .iter()
            .map(|value| Row::new(vec!["count".to_string()], vec![value.clone()]))
            .collect())
    }
}

/// conversations -> users (Users) -> user_profiles (Profile)
pub fn catalog() -> Catalog {
    Catalog::new()
        .table(
            "Conversations",
            TableDefinition::new("conversations").with_relations(
                RelationMap::new()
                    .relation("Users", RelationshipDescriptor::new("user_id", "Users", "id"))
                    .relation(
                        "Messages",
                        RelationshipDescriptor::new("id", "Messages", "conversation_id"),
                    ),
            ),
        )
        .table(
            "Users",
            TableDefinition::new("users").with_relations(
                RelationMap::new()
                    .relation("Profile", RelationshipDescriptor::new("id", "Profiles", "user_id"))
                    .relation(
                        "Conversations",
                        RelationshipDescriptor::new("id", "Conversations", "user_id"),
                    ),
            ),
        )
        .table("Profiles", TableDefinition::new("user_profiles"))
        .table("Messages", TableDefinition::new("messages"))
}
