//! In-memory message storage

use super::{MessageStore, Page, StorageError, StorageResult};
use crate::Message;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local chat history, lost on restart
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    chats: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chats with at least one message
    pub fn chat_count(&self) -> usize {
        self.chats.read().len()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: Message) -> StorageResult<()> {
        self.chats
            .write()
            .entry(message.chat_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn history(&self, chat_id: &str, page: Page) -> StorageResult<Vec<Message>> {
        let chats = self.chats.read();
        Ok(chats
            .get(chat_id)
            .map(|messages| page.apply(messages.iter().cloned()))
            .unwrap_or_default())
    }

    async fn count(&self, chat_id: &str) -> StorageResult<usize> {
        Ok(self.chats.read().get(chat_id).map_or(0, Vec::len))
    }

    async fn delete_chat(&self, chat_id: &str) -> StorageResult<()> {
        self.chats
            .write()
            .remove(chat_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(chat_id.to_string()))
    }
}
