//! Message storage abstraction and implementations
//!
//! Provides trait-based storage for chat history with an in-memory
//! backend and a local JSON-lines file backend.

mod local;
mod memory;

pub use local::LocalMessageStore;
pub use memory::InMemoryMessageStore;

use crate::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Chat not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid chat data: {0}")]
    InvalidData(String),

    #[error("Storage path not available")]
    PathUnavailable,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Offset/limit window over a chat's history (oldest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Every message in the chat
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }

    /// Apply this window to an ordered message list
    pub fn apply(&self, messages: impl IntoIterator<Item = Message>) -> Vec<Message> {
        messages
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, 50)
    }
}

/// Chat history storage for different backends
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to its chat
    async fn append(&self, message: Message) -> StorageResult<()>;

    /// Load a page of a chat's history, oldest first
    async fn history(&self, chat_id: &str, page: Page) -> StorageResult<Vec<Message>>;

    /// Number of messages stored for a chat
    async fn count(&self, chat_id: &str) -> StorageResult<usize>;

    /// Remove a chat and all its messages
    async fn delete_chat(&self, chat_id: &str) -> StorageResult<()>;

    /// The most recent message of a chat, if any
    async fn last(&self, chat_id: &str) -> StorageResult<Option<Message>> {
        let count = self.count(chat_id).await?;
        if count == 0 {
            return Ok(None);
        }
        let mut page = self.history(chat_id, Page::new(count - 1, 1)).await?;
        Ok(page.pop())
    }
}
