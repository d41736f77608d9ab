use crate::Value;

/// Accumulates rendered SQL and the values bound to its placeholders, in
/// placeholder order. With an inliner set, values are written as literals.
pub(crate) struct SqlWriter<'q> {
    sql: String,
    params: Vec<Value>,
    inline: Option<&'q dyn Fn(&Value) -> String>,
}

impl<'q> SqlWriter<'q> {
    pub(crate) fn new() -> Self {
        Self {
            sql: String::with_capacity(128),
            params: Vec::new(),
            inline: None,
        }
    }

    pub(crate) fn inlining(quote: &'q dyn Fn(&Value) -> String) -> Self {
        Self {
            inline: Some(quote),
            ..Self::new()
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    #[inline]
    pub(crate) fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn param(&mut self, value: &Value) {
        match self.inline {
            Some(quote) => {
                let literal = quote(value);
                self.sql.push_str(&literal);
            }
            None => {
                self.sql.push('?');
                self.params.push(value.clone());
            }
        }
    }

    pub(crate) fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}
