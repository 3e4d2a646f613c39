use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    ILike,
    In,
    IsNull,
    NotNull,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::ILike => "ILIKE",
            FilterOp::In => "= ANY",
            FilterOp::IsNull => "IS NULL",
            FilterOp::NotNull => "IS NOT NULL",
        }
    }

    /// Operators that compare against nothing
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::NotNull)
    }
}

/// A bound query parameter. Every variant carries an Option so NULLs stay
/// typed and bind cleanly to uuid/date/numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(Option<String>),
    Int(Option<i64>),
    Int4(Option<i32>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Uuid(Option<Uuid>),
    UuidArray(Vec<Uuid>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
    Decimal(Option<Decimal>),
    TextArray(Vec<String>),
    Json(Value),
}

macro_rules! impl_sql_param_from {
    ($ty:ty => $variant:ident) => {
        impl From<$ty> for SqlParam {
            fn from(v: $ty) -> Self {
                SqlParam::$variant(Some(v.into()))
            }
        }

        impl From<Option<$ty>> for SqlParam {
            fn from(v: Option<$ty>) -> Self {
                SqlParam::$variant(v.map(Into::into))
            }
        }
    };
}

impl_sql_param_from!(String => Text);
impl_sql_param_from!(&str => Text);
impl_sql_param_from!(i64 => Int);
impl_sql_param_from!(i32 => Int4);
impl_sql_param_from!(f64 => Float);
impl_sql_param_from!(bool => Bool);
impl_sql_param_from!(Uuid => Uuid);
impl_sql_param_from!(NaiveDate => Date);
impl_sql_param_from!(DateTime<Utc> => Timestamp);
impl_sql_param_from!(Decimal => Decimal);

impl From<Vec<String>> for SqlParam {
    fn from(v: Vec<String>) -> Self {
        SqlParam::TextArray(v)
    }
}

impl From<Vec<Uuid>> for SqlParam {
    fn from(v: Vec<Uuid>) -> Self {
        SqlParam::UuidArray(v)
    }
}

impl From<Value> for SqlParam {
    fn from(v: Value) -> Self {
        SqlParam::Json(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
