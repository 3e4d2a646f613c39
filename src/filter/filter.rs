use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{Condition, FilterWhere};
use super::pagination::PageRequest;
use super::types::{FilterOp, FilterOrderInfo, SortDirection, SqlParam, SqlResult};

/// Query description for a single table: conditions, ordering and a page window.
///
/// Handlers build one of these from their query string, repositories turn it
/// into SQL. Soft-deleted rows are excluded unless `include_deleted` is called.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    page: Option<PageRequest>,
    include_deleted: bool,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            conditions: vec![],
            order_data: vec![],
            page: None,
            include_deleted: false,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" {
                FilterWhere::validate_column(column)?;
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<SqlParam>) -> &mut Self {
        self.where_op(column, FilterOp::Eq, value)
    }

    pub fn where_op(&mut self, column: &str, operator: FilterOp, value: impl Into<SqlParam>) -> &mut Self {
        self.conditions.push(Condition::field(column, operator, value));
        self
    }

    /// Add `column <op> value` only when a value was supplied
    pub fn where_opt<T: Into<SqlParam>>(&mut self, column: &str, operator: FilterOp, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.where_op(column, operator, value);
        }
        self
    }

    /// Case-insensitive equality; `%` and `_` in `value` match literally
    pub fn where_ilike(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.where_op(column, FilterOp::ILike, escape_like(v)),
            _ => self,
        }
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Condition::is_null(column));
        self
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Condition::not_null(column));
        self
    }

    pub fn where_in(&mut self, column: &str, values: impl Into<SqlParam>) -> &mut Self {
        self.where_op(column, FilterOp::In, values)
    }

    /// Inclusive range; either bound may be open
    pub fn where_between<T: Into<SqlParam>>(&mut self, column: &str, from: Option<T>, to: Option<T>) -> &mut Self {
        self.where_opt(column, FilterOp::Gte, from);
        self.where_opt(column, FilterOp::Lte, to);
        self
    }

    /// Case-insensitive substring match of `term` against any of `columns`
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return self,
        };
        let pattern = format!("%{}%", escape_like(term));
        let any = columns
            .iter()
            .map(|column| Condition::field(*column, FilterOp::ILike, pattern.as_str()))
            .collect();
        self.conditions.push(Condition::Any(any));
        self
    }

    pub fn condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn include_deleted(&mut self) -> &mut Self {
        self.include_deleted = true;
        self
    }

    /// Apply a client sort string, falling back to `default` when none was given
    pub fn order(
        &mut self,
        requested: Option<&str>,
        allowed: &[&str],
        default: (&str, SortDirection),
    ) -> Result<&mut Self, FilterError> {
        let mut order = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => FilterOrder::validate_and_parse(requested, allowed)?,
            None => vec![FilterOrderInfo { column: default.0.to_string(), sort: default.1 }],
        };
        // Unique last key so LIMIT/OFFSET pages never overlap
        if !order.iter().any(|o| o.column == "id") {
            order.push(FilterOrderInfo { column: "id".to_string(), sort: SortDirection::Asc });
        }
        self.order_data = order;
        Ok(self)
    }

    pub fn paginate(&mut self, page: PageRequest) -> &mut Self {
        self.page = Some(page);
        self
    }

    pub fn page_request(&self) -> Option<PageRequest> {
        self.page
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let mut conditions = Vec::with_capacity(self.conditions.len() + 1);
        if !self.include_deleted {
            conditions.push(Condition::Raw("\"deleted_at\" IS NULL"));
        }
        conditions.extend(self.conditions.iter().cloned());
        let (query, params) = FilterWhere::generate(&conditions, 0)?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
            self.table_name, where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        FilterWhere::validate_column(name)
            .map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match self.page {
            Some(page) => format!("LIMIT {} OFFSET {}", page.limit(), page.offset()),
            None => String::new(),
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("").is_err());
        assert!(Filter::new("clients; drop table users").is_err());
        assert!(Filter::new("9clients").is_err());
        assert!(Filter::new("clients").is_ok());
    }

    #[test]
    fn excludes_soft_deleted_by_default() {
        let filter = Filter::new("clients").unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"clients\" WHERE \"deleted_at\" IS NULL");

        let mut filter = Filter::new("clients").unwrap();
        filter.include_deleted();
        assert_eq!(filter.to_where_sql().unwrap().query, "1=1");
    }

    #[test]
    fn full_list_query() {
        let client_id = Uuid::new_v4();
        let mut filter = Filter::new("orders").unwrap();
        filter
            .where_eq("client_id", client_id)
            .where_opt("status", FilterOp::Eq, Some("running"))
            .where_opt::<String>("notes", FilterOp::Eq, None)
            .search(&["title", "task"], Some(" logo "))
            .order(Some("-delivery_date"), &["delivery_date", "created_at"], ("created_at", SortDirection::Desc))
            .unwrap()
            .paginate(PageRequest { page: 2, per_page: 10 });

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"orders\" WHERE \"deleted_at\" IS NULL AND \"client_id\" = $1 AND \"status\" = $2 \
             AND (\"title\" ILIKE $3 OR \"task\" ILIKE $4) ORDER BY \"delivery_date\" DESC, \"id\" ASC LIMIT 10 OFFSET 10"
        );
        assert_eq!(sql.params[0], SqlParam::Uuid(Some(client_id)));
        assert_eq!(sql.params[2], SqlParam::Text(Some("%logo%".to_string())));

        let count = filter.to_count_sql().unwrap();
        assert!(count.query.starts_with("SELECT COUNT(*) AS count FROM \"orders\" WHERE"));
        assert!(!count.query.contains("LIMIT"));
        assert_eq!(count.params.len(), 4);
    }

    #[test]
    fn default_order_applies_without_sort() {
        let mut filter = Filter::new("notices").unwrap();
        filter.order(None, &["title"], ("published_on", SortDirection::Desc)).unwrap();
        assert!(filter.to_sql().unwrap().query.ends_with("ORDER BY \"published_on\" DESC, \"id\" ASC"));
    }

    #[test]
    fn id_breaks_ties_once() {
        let mut filter = Filter::new("clients").unwrap();
        filter.order(Some("country,-id"), &["country", "id"], ("name", SortDirection::Asc)).unwrap();
        assert!(filter.to_sql().unwrap().query.ends_with("ORDER BY \"country\" ASC, \"id\" DESC"));
    }

    #[test]
    fn ilike_filter_is_literal() {
        let mut filter = Filter::new("employees").unwrap();
        filter.where_ilike("department", Some(" R&D_100% ")).where_ilike("status", Some("  "));
        let sql = filter.to_where_sql().unwrap();
        assert_eq!(sql.query, "\"deleted_at\" IS NULL AND \"department\" ILIKE $1");
        assert_eq!(sql.params, vec![SqlParam::Text(Some("R&D\\_100\\%".to_string()))]);
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut filter = Filter::new("clients").unwrap();
        filter.search(&["name"], Some("   "));
        assert!(filter.to_sql().unwrap().params.is_empty());
    }

    #[test]
    fn search_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn between_adds_both_bounds() {
        let mut filter = Filter::new("reports").unwrap();
        let from = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
        filter.where_between("call_date", from, None);
        let sql = filter.to_where_sql().unwrap();
        assert_eq!(sql.query, "\"deleted_at\" IS NULL AND \"call_date\" >= $1");
    }
}
