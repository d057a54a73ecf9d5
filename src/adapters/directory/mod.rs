mod local;
mod sheet;

pub use local::LocalDirectory;
pub use sheet::{parse_sheet, SheetDirectory};

use crate::domain::model::{Agent, Directory};
use crate::domain::ports::{DirectoryStore, EditableDirectoryStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Directory held in memory, for library hosts that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    inner: RwLock<Directory>,
}

impl MemoryDirectory {
    pub fn new(directory: Directory) -> Self {
        Self {
            inner: RwLock::new(directory),
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn load(&self) -> Result<Directory> {
        Ok(self.inner.read().await.clone())
    }

    fn describe(&self) -> String {
        "in-memory directory".to_string()
    }
}

#[async_trait]
impl EditableDirectoryStore for MemoryDirectory {
    async fn upsert(&self, name: &str, locations: Vec<String>) -> Result<Directory> {
        let mut directory = self.inner.write().await;
        directory.upsert(Agent::new(name.trim(), locations));
        Ok(directory.clone())
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.inner.write().await.remove(name))
    }
}
