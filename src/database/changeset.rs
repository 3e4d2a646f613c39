use uuid::Uuid;

use crate::filter::filter_where::FilterWhere;
use crate::filter::{FilterError, SqlParam, SqlResult};

/// Ordered list of column assignments used for INSERT and UPDATE statements.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    values: Vec<(&'static str, SqlParam)>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<SqlParam>) -> &mut Self {
        self.values.push((column, value.into()));
        self
    }

    /// Set only when the field was present in the request
    pub fn set_opt<T: Into<SqlParam>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(c, _)| *c)
    }

    pub fn to_insert_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        FilterWhere::validate_column(table)?;
        if self.values.is_empty() {
            return Err(FilterError::InvalidOperatorData("insert without values".to_string()));
        }
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        for (i, (column, _)) in self.values.iter().enumerate() {
            FilterWhere::validate_column(column)?;
            columns.push(format!("\"{}\"", column));
            placeholders.push(format!("${}", i + 1));
        }
        let query = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(SqlResult { query, params: self.values.iter().map(|(_, v)| v.clone()).collect() })
    }

    /// UPDATE of one live row; bumps `updated_at`
    pub fn to_update_sql(&self, table: &str, id: Uuid) -> Result<SqlResult, FilterError> {
        FilterWhere::validate_column(table)?;
        if self.values.is_empty() {
            return Err(FilterError::InvalidOperatorData("no fields to update".to_string()));
        }
        let mut assignments = Vec::with_capacity(self.values.len() + 1);
        for (i, (column, _)) in self.values.iter().enumerate() {
            FilterWhere::validate_column(column)?;
            assignments.push(format!("\"{}\" = ${}", column, i + 1));
        }
        assignments.push("\"updated_at\" = now()".to_string());

        let mut params: Vec<SqlParam> = self.values.iter().map(|(_, v)| v.clone()).collect();
        params.push(SqlParam::from(id));
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${} AND \"deleted_at\" IS NULL RETURNING *",
            table,
            assignments.join(", "),
            params.len()
        );
        Ok(SqlResult { query, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_lists_columns_in_order() {
        let mut cs = Changeset::new();
        cs.set("name", "Acme").set("client_code", "AC-01").set_opt::<String>("notes", None);
        let sql = cs.to_insert_sql("clients").unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"clients\" (\"name\", \"client_code\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn update_sql_binds_id_last() {
        let id = Uuid::new_v4();
        let mut cs = Changeset::new();
        cs.set("status", "finished");
        let sql = cs.to_update_sql("orders", id).unwrap();
        assert_eq!(
            sql.query,
            "UPDATE \"orders\" SET \"status\" = $1, \"updated_at\" = now() WHERE \"id\" = $2 AND \"deleted_at\" IS NULL RETURNING *"
        );
        assert_eq!(sql.params.last(), Some(&SqlParam::Uuid(Some(id))));
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(Changeset::new().to_update_sql("orders", Uuid::new_v4()).is_err());
        assert!(Changeset::new().to_insert_sql("orders").is_err());
    }

    #[test]
    fn explicit_null_is_kept() {
        let mut cs = Changeset::new();
        cs.set("assigned_to", None::<Uuid>);
        let sql = cs.to_update_sql("orders", Uuid::new_v4()).unwrap();
        assert_eq!(sql.params[0], SqlParam::Uuid(None));
    }
}
