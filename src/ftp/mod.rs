pub mod client;
pub mod error;
pub mod pool;

pub use client::{validate_segment, FileStore, SuppaFtpConnector};
pub use error::FtpError;
pub use pool::{Connector, FtpPool, PoolStatus};
