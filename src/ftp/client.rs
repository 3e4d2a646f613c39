use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use suppaftp::Status;
use tracing::debug;

use super::error::FtpError;
use super::pool::{Connector, FtpPool};
use crate::config::FtpConfig;

/// Opens logged-in, binary-mode `FtpStream`s rooted at the configured directory
pub struct SuppaFtpConnector {
    config: FtpConfig,
}

impl SuppaFtpConnector {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for SuppaFtpConnector {
    type Connection = FtpStream;

    async fn connect(&self) -> Result<FtpStream, FtpError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || -> Result<FtpStream, FtpError> {
            let mut stream = FtpStream::connect((config.host.as_str(), config.port))
                .map_err(|e| FtpError::Connect(e.to_string()))?;
            stream
                .login(&config.username, &config.password)
                .map_err(|e| FtpError::Connect(e.to_string()))?;
            stream.transfer_type(FileType::Binary)?;
            if !config.root_dir.is_empty() && config.root_dir != "/" {
                stream.cwd(&config.root_dir)?;
            }
            debug!("Opened FTP connection to {}:{}", config.host, config.port);
            Ok(stream)
        })
        .await
        .map_err(|e| FtpError::Io(e.to_string()))?
    }
}

/// Reject anything that could escape the folder it names
pub fn validate_segment(segment: &str) -> Result<(), FtpError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.len() > 255
        || segment.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(FtpError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

/// MKD that tolerates the folder already existing (550)
fn ensure_folder(stream: &mut FtpStream, folder: &str) -> Result<(), FtpError> {
    match stream.mkdir(folder) {
        Ok(()) => Ok(()),
        Err(e) => folder_error(e),
    }
}

fn folder_error(err: suppaftp::FtpError) -> Result<(), FtpError> {
    match err {
        suppaftp::FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable => {
            debug!("MKD answered 550, folder assumed present");
            Ok(())
        }
        other => Err(other.into()),
    }
}

fn remote_path(folder: &str, name: &str) -> Result<String, FtpError> {
    validate_segment(folder)?;
    validate_segment(name)?;
    Ok(format!("{}/{}", folder, name))
}

/// File operations on top of the shared pool; each call borrows one connection
#[derive(Clone)]
pub struct FileStore {
    pool: Arc<FtpPool<SuppaFtpConnector>>,
}

impl FileStore {
    pub fn new(pool: Arc<FtpPool<SuppaFtpConnector>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &FtpPool<SuppaFtpConnector> {
        &self.pool
    }

    pub async fn upload(&self, folder: &str, name: &str, bytes: Vec<u8>) -> Result<u64, FtpError> {
        let path = remote_path(folder, name)?;
        let folder = folder.to_string();
        self.with_stream(move |stream| {
            ensure_folder(stream, &folder)?;
            Ok(stream.put_file(&path, &mut Cursor::new(bytes))?)
        })
        .await
    }

    pub async fn download(&self, folder: &str, name: &str) -> Result<Vec<u8>, FtpError> {
        let path = remote_path(folder, name)?;
        self.with_stream(move |stream| Ok(stream.retr_as_buffer(&path)?.into_inner()))
            .await
    }

    pub async fn delete(&self, folder: &str, name: &str) -> Result<(), FtpError> {
        let path = remote_path(folder, name)?;
        self.with_stream(move |stream| Ok(stream.rm(&path)?)).await
    }

    pub async fn list(&self, folder: &str) -> Result<Vec<String>, FtpError> {
        validate_segment(folder)?;
        let folder = folder.to_string();
        self.with_stream(move |stream| {
            let names = stream.nlst(Some(folder.as_str()))?;
            Ok(names
                .into_iter()
                .map(|n| n.rsplit('/').next().unwrap_or_default().to_string())
                .collect())
        })
        .await
    }

    async fn with_stream<T, F>(&self, op: F) -> Result<T, FtpError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T, FtpError> + Send + 'static,
    {
        self.pool.with_connection(op).await
    }
}
