use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtpError {
    #[error("Timed out after {0:?} waiting for an FTP connection")]
    Timeout(Duration),

    #[error("FTP pool is closed")]
    PoolClosed,

    #[error("FTP connection failed: {0}")]
    Connect(String),

    /// The server answered but refused the operation (e.g. 550 file unavailable)
    #[error("FTP server rejected request ({code}): {message}")]
    Rejected { code: u32, message: String },

    #[error("FTP transfer failed: {0}")]
    Io(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),
}

impl FtpError {
    /// True when the connection itself is unusable and must be discarded
    pub fn is_broken_connection(&self) -> bool {
        matches!(self, FtpError::Connect(_) | FtpError::Io(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FtpError::Rejected { code: 550, .. })
    }
}

impl From<suppaftp::FtpError> for FtpError {
    fn from(err: suppaftp::FtpError) -> Self {
        match err {
            suppaftp::FtpError::UnexpectedResponse(response) => FtpError::Rejected {
                code: response.status.code(),
                message: String::from_utf8_lossy(&response.body).trim().to_string(),
            },
            other => FtpError::Io(other.to_string()),
        }
    }
}
