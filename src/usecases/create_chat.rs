//! Use case for creating a new channel from a participant list.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::Channel;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateChatRequest {
    pub name: String,
    pub description: String,
    pub participant_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateChatSourceError {
    Unauthorized,
    Unavailable,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateChatError {
    /// Rejected locally; no request is made without at least one participant.
    #[error("at least one participant is required")]
    NoParticipants,
    #[error("not authorized to create chats")]
    Unauthorized,
    #[error("service temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("failed to create chat: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ChatCreator: Send + Sync {
    async fn create_chat(
        &self,
        request: &CreateChatRequest,
    ) -> Result<Channel, CreateChatSourceError>;
}

pub async fn create_chat(
    creator: &dyn ChatCreator,
    request: CreateChatRequest,
) -> Result<Channel, CreateChatError> {
    if request.participant_ids.is_empty() {
        return Err(CreateChatError::NoParticipants);
    }

    creator.create_chat(&request).await.map_err(map_source_error)
}

fn map_source_error(error: CreateChatSourceError) -> CreateChatError {
    match error {
        CreateChatSourceError::Unauthorized => CreateChatError::Unauthorized,
        CreateChatSourceError::Unavailable => CreateChatError::TemporarilyUnavailable,
        CreateChatSourceError::Other(message) => CreateChatError::Backend(message),
    }
}
