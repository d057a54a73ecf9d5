use crate::domain::model::{Agent, Directory};
use crate::domain::ports::{DirectoryStore, EditableDirectoryStore};
use crate::utils::error::{Result, RouterError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Directory persisted as a JSON array of `{name, locations}` on local disk.
/// Every edit is written through before it returns.
pub struct LocalDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> RouterError {
        RouterError::SourceUnavailable {
            origin: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    async fn read(&self) -> Result<Directory> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No directory file at {}, starting empty", self.path.display());
                return Ok(Directory::new());
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        let agents: Vec<Agent> = serde_json::from_slice(&bytes).map_err(|e| self.unavailable(e))?;
        Ok(agents.into_iter().collect())
    }

    async fn persist(&self, directory: &Directory) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 先寫暫存檔再改名，避免中途失敗留下半個檔案
        let data = serde_json::to_vec_pretty(directory)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            "Directory saved to {} ({} agents)",
            self.path.display(),
            directory.len()
        );
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for LocalDirectory {
    async fn load(&self) -> Result<Directory> {
        self.read().await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl EditableDirectoryStore for LocalDirectory {
    async fn upsert(&self, name: &str, locations: Vec<String>) -> Result<Directory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RouterError::ValidationError {
                message: "agent name cannot be empty".to_string(),
            });
        }

        let _guard = self.write_lock.lock().await;
        let mut directory = self.read().await?;
        directory.upsert(Agent::new(name, locations));
        self.persist(&directory).await?;
        tracing::info!("✅ Saved agent '{}'", name);
        Ok(directory)
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut directory = self.read().await?;
        if !directory.remove(name.trim()) {
            return Ok(false);
        }
        self.persist(&directory).await?;
        tracing::info!("🗑️ Removed agent '{}'", name.trim());
        Ok(true)
    }
}
