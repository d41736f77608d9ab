//! The database seam: anything that can run a rendered statement.

use std::rc::Rc;
use std::sync::Arc;

use crate::{Result, Value};

/// A result row: column names in select order with their values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Looks a value up by column name. The first matching column wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Executes rendered statements.
///
/// `params` bind positionally to the `?` placeholders of `sql`. Blocking,
/// retries and timeouts are the implementor's business.
pub trait Adapter {
    /// Runs the statement and returns every row.
    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Runs the statement and returns the first row, if any.
    fn fetch_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.fetch_all(sql, params)?.into_iter().next())
    }

    /// Runs the statement and returns the first column of the first row.
    fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        Ok(self
            .fetch_row(sql, params)?
            .and_then(|row| row.into_values().into_iter().next()))
    }

    /// Escapes a value as a literal for inlining.
    fn quote(&self, value: &Value) -> String {
        value.to_literal()
    }
}

macro_rules! impl_adapter_for_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<A: Adapter + ?Sized> Adapter for $ptr<A> {
                fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
                    (**self).fetch_all(sql, params)
                }

                fn fetch_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
                    (**self).fetch_row(sql, params)
                }

                fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
                    (**self).fetch_one(sql, params)
                }

                fn quote(&self, value: &Value) -> String {
                    (**self).quote(value)
                }
            }
        )*
    };
}

impl_adapter_for_pointer!(Box, Rc, Arc);

impl<A: Adapter + ?Sized> Adapter for &A {
    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).fetch_all(sql, params)
    }

    fn fetch_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        (**self).fetch_row(sql, params)
    }

    fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        (**self).fetch_one(sql, params)
    }

    fn quote(&self, value: &Value) -> String {
        (**self).quote(value)
    }
}
