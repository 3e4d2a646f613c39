pub mod changeset;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;

pub use changeset::Changeset;
pub use manager::{DatabaseError, DatabaseManager};
pub use query_builder::QueryBuilder;
pub use repository::Repository;
