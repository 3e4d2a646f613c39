use super::error::FilterError;
use super::types::{FilterOp, SqlParam};

/// One node of a WHERE tree
#[derive(Debug, Clone)]
pub enum Condition {
    Field {
        column: String,
        operator: FilterOp,
        value: Option<SqlParam>,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// Trusted SQL fragment, never built from request input
    Raw(&'static str),
}

impl Condition {
    pub fn field(column: impl Into<String>, operator: FilterOp, value: impl Into<SqlParam>) -> Self {
        Condition::Field {
            column: column.into(),
            operator,
            value: Some(value.into()),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::Field { column: column.into(), operator: FilterOp::IsNull, value: None }
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Condition::Field { column: column.into(), operator: FilterOp::NotNull, value: None }
    }
}

pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions joined by AND, numbering placeholders after `starting_param_index`.
    /// An empty list renders as `1=1`.
    pub fn generate(
        conditions: &[Condition],
        starting_param_index: usize,
    ) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.render_all(conditions, " AND ")?;
        let sql = if sql.is_empty() { "1=1".to_string() } else { sql };
        Ok((sql, filter_where.param_values))
    }

    pub fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
        if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        Ok(())
    }

    fn render_all(&mut self, conditions: &[Condition], joiner: &str) -> Result<String, FilterError> {
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            if let Some(sql) = self.render(condition)? {
                parts.push(sql);
            }
        }
        Ok(parts.join(joiner))
    }

    fn render(&mut self, condition: &Condition) -> Result<Option<String>, FilterError> {
        match condition {
            Condition::Field { column, operator, value } => {
                Self::validate_column(column)?;
                let quoted_column = format!("\"{}\"", column);
                if operator.is_unary() {
                    return Ok(Some(format!("{} {}", quoted_column, operator.to_sql())));
                }
                let value = value.clone().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("operator on '{}' requires a value", column))
                })?;
                match (operator, &value) {
                    (FilterOp::In, SqlParam::TextArray(items)) if items.is_empty() => Ok(Some("1=0".to_string())),
                    (FilterOp::In, SqlParam::UuidArray(items)) if items.is_empty() => Ok(Some("1=0".to_string())),
                    (FilterOp::In, SqlParam::TextArray(_)) | (FilterOp::In, SqlParam::UuidArray(_)) => {
                        Ok(Some(format!("{} = ANY({})", quoted_column, self.param(value))))
                    }
                    (FilterOp::In, _) => Err(FilterError::InvalidOperatorData(format!(
                        "IN on '{}' requires an array",
                        column
                    ))),
                    _ => Ok(Some(format!("{} {} {}", quoted_column, operator.to_sql(), self.param(value)))),
                }
            }
            Condition::All(children) | Condition::Any(children) => {
                if children.is_empty() {
                    return Ok(None);
                }
                let joiner = if matches!(condition, Condition::All(_)) { " AND " } else { " OR " };
                let sql = self.render_all(children, joiner)?;
                Ok(Some(format!("({})", sql)))
            }
            Condition::Not(inner) => Ok(self.render(inner)?.map(|sql| format!("NOT ({})", sql))),
            Condition::Raw(sql) => Ok(Some((*sql).to_string())),
        }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_renders_tautology() {
        let (sql, params) = FilterWhere::generate(&[], 0).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn numbers_placeholders_from_offset() {
        let conditions = vec![
            Condition::field("status", FilterOp::Eq, "running"),
            Condition::field("quantity", FilterOp::Gte, 5i64),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 2).unwrap();
        assert_eq!(sql, "\"status\" = $3 AND \"quantity\" >= $4");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn any_group_is_parenthesised() {
        let conditions = vec![
            Condition::is_null("deleted_at"),
            Condition::Any(vec![
                Condition::field("name", FilterOp::ILike, "%acme%"),
                Condition::field("email", FilterOp::ILike, "%acme%"),
            ]),
        ];
        let (sql, _) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "\"deleted_at\" IS NULL AND (\"name\" ILIKE $1 OR \"email\" ILIKE $2)");
    }

    #[test]
    fn empty_in_matches_nothing() {
        let conditions = vec![Condition::field("id", FilterOp::In, Vec::<uuid::Uuid>::new())];
        let (sql, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn in_requires_array() {
        let conditions = vec![Condition::field("id", FilterOp::In, "x")];
        assert!(FilterWhere::generate(&conditions, 0).is_err());
    }

    #[test]
    fn rejects_injected_column() {
        let conditions = vec![Condition::field("name\" OR 1=1 --", FilterOp::Eq, "x")];
        assert!(matches!(
            FilterWhere::generate(&conditions, 0),
            Err(FilterError::InvalidColumn(_))
        ));
    }

    #[test]
    fn not_wraps_inner() {
        let conditions = vec![Condition::Not(Box::new(Condition::field("is_lead", FilterOp::Eq, true)))];
        let (sql, _) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(sql, "NOT (\"is_lead\" = $1)");
    }
}
