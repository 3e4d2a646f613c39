use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Cannot sort by '{0}'")]
    InvalidSort(String),

    #[error("Invalid filter value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),
}
