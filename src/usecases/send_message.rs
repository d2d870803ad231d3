//! Use case for sending a message to a channel.
//!
//! Validates the text locally (fails fast, no network call) and delegates
//! to the `MessageSender` seam; the server-confirmed message is returned
//! so the caller can apply its optimistic insert.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::message::Message;

/// Command to send a message to a specific channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub channel_id: String,
    pub text: String,
}

/// Errors as the backend reports them, before domain mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageSourceError {
    /// User is not authorized.
    Unauthorized,
    /// Target channel was not found or is not accessible.
    ChannelNotFound,
    /// Service is temporarily unavailable.
    Unavailable,
    /// Anything else, with the backend's message.
    Other(String),
}

/// Domain-level errors for the send operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    #[error("message cannot be empty")]
    EmptyMessage,
    /// No channel is selected to send into.
    #[error("no channel selected")]
    NoChannelSelected,
    #[error("not authorized to send messages")]
    Unauthorized,
    #[error("channel not found")]
    ChannelNotFound,
    #[error("service temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("failed to send message: {0}")]
    Backend(String),
}

/// Seam for posting messages to the backend.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Posts a text message to the given channel and returns the
    /// server-confirmed message record.
    ///
    /// # Errors
    /// Returns `SendMessageSourceError` if the message could not be sent.
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<Message, SendMessageSourceError>;
}

/// Sends a message to the specified channel.
///
/// The text must not be empty after trimming; the trimmed text is what
/// goes over the wire.
///
/// # Errors
/// Returns `SendMessageError::EmptyMessage` for empty/whitespace text and
/// maps source errors to domain errors otherwise.
pub async fn send_message(
    sender: &dyn MessageSender,
    command: SendMessageCommand,
) -> Result<Message, SendMessageError> {
    let text = command.text.trim();
    if text.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    sender
        .send_message(&command.channel_id, text)
        .await
        .map_err(map_source_error)
}

fn map_source_error(error: SendMessageSourceError) -> SendMessageError {
    match error {
        SendMessageSourceError::Unauthorized => SendMessageError::Unauthorized,
        SendMessageSourceError::ChannelNotFound => SendMessageError::ChannelNotFound,
        SendMessageSourceError::Unavailable => SendMessageError::TemporarilyUnavailable,
        SendMessageSourceError::Other(message) => SendMessageError::Backend(message),
    }
}
