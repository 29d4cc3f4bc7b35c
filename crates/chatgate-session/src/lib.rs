//! Chat message persistence for chatgate
//!
//! This crate provides the storage side of a conversation:
//! - Message, role and tool-call record types
//! - The `MessageStore` trait the completion core persists through
//! - In-memory and local file storage backends with paginated history

pub mod message;
pub mod storage;

pub use message::{Message, MessageMetadata, Role, TokenUsage, ToolCallRecord};
pub use storage::{
    InMemoryMessageStore, LocalMessageStore, MessageStore, Page, StorageError, StorageResult,
};
