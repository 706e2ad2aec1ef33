//! Parameterized SQL statements.
//!
//! The core never talks to a driver. Builders produce a [`SqlStatement`]:
//! SQL text with `$n` placeholders plus the values to bind, in order. Table
//! and column names only ever come from [`crate::ArtifactKind`].

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    BigInt(i64),
    BigIntArray(Vec<i64>),
    Text(String),
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its `$n` placeholder.
    pub fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }
}

/// Format an `ARRAY[...]` constructor over already-bound placeholders.
///
/// The driver cannot bind a list of text arrays as one `VALUES` parameter, so
/// array-typed rows are expanded to one placeholder per element and wrapped
/// here. An empty list still needs its element type.
pub fn array_constructor(placeholders: &[String], element_type: &str) -> String {
    if placeholders.is_empty() {
        return format!("ARRAY[]::{element_type}[]");
    }
    let elements: Vec<String> = placeholders
        .iter()
        .map(|p| format!("{p}::{element_type}"))
        .collect();
    format!("ARRAY[{}]", elements.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_numbers_placeholders_from_one() {
        let mut stmt = SqlStatement::new("");
        assert_eq!(stmt.bind(SqlParam::BigInt(1)), "$1");
        assert_eq!(stmt.bind(SqlParam::Text("x".to_string())), "$2");
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_array_constructor_casts_each_element() {
        let placeholders = vec!["$2".to_string(), "$3".to_string()];
        assert_eq!(
            array_constructor(&placeholders, "TEXT"),
            "ARRAY[$2::TEXT, $3::TEXT]"
        );
    }

    #[test]
    fn test_array_constructor_empty_keeps_type() {
        assert_eq!(array_constructor(&[], "TEXT"), "ARRAY[]::TEXT[]");
    }
}
