//! Local filesystem message storage
//!
//! Each chat is stored as a JSON-lines file, one message per line,
//! appended in arrival order.

use super::{MessageStore, Page, StorageError, StorageResult};
use crate::Message;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Local filesystem chat storage
///
/// Chats are stored in:
/// - `~/.chatgate/chats/` (default)
/// - Custom path if specified
pub struct LocalMessageStore {
    /// Base directory for chat files
    base_path: PathBuf,
}

impl LocalMessageStore {
    /// Create storage with default path (~/.chatgate/chats)
    pub fn new() -> StorageResult<Self> {
        let base_path = dirs::home_dir()
            .ok_or(StorageError::PathUnavailable)?
            .join(".chatgate")
            .join("chats");

        Ok(Self { base_path })
    }

    /// Create storage with custom base path
    pub fn with_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    /// File path for a chat; IDs are restricted so they cannot escape the base directory
    fn chat_path(&self, chat_id: &str) -> StorageResult<PathBuf> {
        let valid = !chat_id.is_empty()
            && chat_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidData(format!(
                "invalid chat id '{}'",
                chat_id
            )));
        }
        Ok(self.base_path.join(format!("{}.jsonl", chat_id)))
    }

    async fn read_chat(&self, chat_id: &str) -> StorageResult<Vec<Message>> {
        let path = self.chat_path(chat_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut messages = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(
                    "Skipping corrupt message at {:?}:{}: {}",
                    path,
                    line_no + 1,
                    e
                ),
            }
        }
        Ok(messages)
    }
}

#[async_trait]
impl MessageStore for LocalMessageStore {
    async fn append(&self, message: Message) -> StorageResult<()> {
        self.ensure_dir().await?;

        let path = self.chat_path(&message.chat_id)?;
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended message {} to {:?}", message.id, path);
        Ok(())
    }

    async fn history(&self, chat_id: &str, page: Page) -> StorageResult<Vec<Message>> {
        Ok(page.apply(self.read_chat(chat_id).await?))
    }

    async fn count(&self, chat_id: &str) -> StorageResult<usize> {
        Ok(self.read_chat(chat_id).await?.len())
    }

    async fn delete_chat(&self, chat_id: &str) -> StorageResult<()> {
        let path = self.chat_path(chat_id)?;

        if !path.exists() {
            return Err(StorageError::NotFound(chat_id.to_string()));
        }

        fs::remove_file(&path).await?;
        debug!("Deleted chat {} at {:?}", chat_id, path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCallRecord;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalMessageStore::with_path(temp_dir.path());

        store.append(Message::user("chat-1", "hi")).await.unwrap();
        store
            .append(
                Message::assistant("chat-1", "hello").with_tool_calls(vec![ToolCallRecord::new(
                    "clock",
                    json!({}),
                    json!("noon"),
                )]),
            )
            .await
            .unwrap();

        let reopened = LocalMessageStore::with_path(temp_dir.path());
        let history = reopened.history("chat-1", Page::all()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "hello");
        assert_eq!(
            history[1].metadata.tool_calls.as_ref().unwrap()[0].name,
            "clock"
        );
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalMessageStore::with_path(temp_dir.path());
        store.append(Message::user("chat-2", "ok")).await.unwrap();

        let path = temp_dir.path().join("chat-2.jsonl");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&path, content).unwrap();

        assert_eq!(store.count("chat-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_path_like_chat_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalMessageStore::with_path(temp_dir.path());

        let result = store.append(Message::user("../escape", "x")).await;
        assert!(matches!(result, Err(StorageError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_delete_chat() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalMessageStore::with_path(temp_dir.path());
        store.append(Message::user("chat-3", "x")).await.unwrap();

        store.delete_chat("chat-3").await.unwrap();
        assert_eq!(store.count("chat-3").await.unwrap(), 0);
        assert!(matches!(
            store.delete_chat("chat-3").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
