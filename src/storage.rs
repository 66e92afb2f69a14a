use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};

use async_trait::async_trait;
use tokio::fs;

/// Durable storage for uploaded assets, addressed by generated file name.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Removes a stored file. Deleting a file that is already gone succeeds.
    async fn delete(&self, file_name: &str) -> io::Result<()>;

    async fn exists(&self, file_name: &str) -> io::Result<bool>;

    fn public_url(&self, file_name: &str) -> String;
}

/// Stores assets as plain files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, file_name: &str) -> io::Result<PathBuf> {
        let plain = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && file_name != "."
            && file_name != "..";
        if !plain {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid asset name {file_name:?}"),
            ));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl AssetStorage for LocalStorage {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(file_name)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(path, bytes).await
    }

    async fn delete(&self, file_name: &str) -> io::Result<()> {
        let path = self.resolve(file_name)?;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn exists(&self, file_name: &str) -> io::Result<bool> {
        let path = self.resolve(file_name)?;
        fs::try_exists(path).await
    }

    fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base, file_name)
    }
}
