//! Chat endpoints: channel/contact listing, delta refresh, send, and
//! channel creation.

use async_trait::async_trait;
use reqwest::multipart::Form;
use serde_json::json;

use crate::backend::error::ApiError;
use crate::backend::http::HttpApi;
use crate::backend::types::{ChannelDto, ContactDto, MessageDto, RefreshResponseDto};
use crate::domain::{
    chat::{Channel, Contact},
    message::Message,
    sync::RefreshData,
};
use crate::usecases::{
    create_chat::{ChatCreator, CreateChatRequest, CreateChatSourceError},
    send_message::{MessageSender, SendMessageSourceError},
    sync::{ChatDataSource, ChatSourceError},
};

#[derive(Debug, Clone)]
pub struct ChatApi {
    http: HttpApi,
}

impl ChatApi {
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatDataSource for ChatApi {
    async fn list_channels(&self, user_id: i64) -> Result<Vec<Channel>, ChatSourceError> {
        let result: Result<Vec<ChannelDto>, ApiError> = self
            .http
            .get_json("/chats", &[("user_id[]", user_id.to_string())])
            .await;

        match result {
            Ok(channels) => Ok(channels
                .into_iter()
                .map(ChannelDto::into_channel)
                .collect()),
            // A user with no chats gets a 404 from the gateway.
            Err(error) if error.status() == Some(404) => Ok(Vec::new()),
            Err(error) => Err(map_chat_error(error)),
        }
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatSourceError> {
        let contacts: Vec<ContactDto> = self
            .http
            .get_json("/contacts", &[])
            .await
            .map_err(map_chat_error)?;

        Ok(contacts.into_iter().map(ContactDto::into_contact).collect())
    }

    async fn refresh_data(
        &self,
        channel_id: Option<&str>,
    ) -> Result<RefreshData, ChatSourceError> {
        let mut query = Vec::new();
        if let Some(channel_id) = channel_id {
            query.push(("channel_id", channel_id.to_string()));
        }

        let response: RefreshResponseDto = self
            .http
            .get_json("/refresh_data", &query)
            .await
            .map_err(map_chat_error)?;

        Ok(response.into_refresh_data())
    }
}

#[async_trait]
impl MessageSender for ChatApi {
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<Message, SendMessageSourceError> {
        let message: MessageDto = self
            .http
            .post_json(
                "/send_message",
                &json!({
                    "channel_id": channel_id,
                    "message": text,
                }),
            )
            .await
            .map_err(map_send_error)?;

        Ok(message.into_message())
    }
}

#[async_trait]
impl ChatCreator for ChatApi {
    async fn create_chat(
        &self,
        request: &CreateChatRequest,
    ) -> Result<Channel, CreateChatSourceError> {
        let channel: ChannelDto = self
            .http
            .post_multipart("/new_chat", new_chat_form(request))
            .await
            .map_err(map_create_error)?;

        Ok(channel.into_channel())
    }
}

/// The gateway takes channel creation as a multipart form with indexed
/// participant fields.
fn new_chat_form(request: &CreateChatRequest) -> Form {
    let mut form = Form::new();
    for (index, participant_id) in request.participant_ids.iter().enumerate() {
        form = form.text(format!("participants[{index}]"), participant_id.to_string());
    }
    if !request.name.is_empty() {
        form = form.text("name", request.name.clone());
    }
    if !request.description.is_empty() {
        form = form.text("description", request.description.clone());
    }
    form
}

fn map_chat_error(error: ApiError) -> ChatSourceError {
    match error.status() {
        Some(401) | Some(403) => ChatSourceError::Unauthorized,
        Some(404) => ChatSourceError::NotFound,
        Some(429) => ChatSourceError::Unavailable,
        Some(status) if status >= 500 => ChatSourceError::Unavailable,
        _ => ChatSourceError::Other(describe(error)),
    }
}

fn map_send_error(error: ApiError) -> SendMessageSourceError {
    match error.status() {
        Some(401) | Some(403) => SendMessageSourceError::Unauthorized,
        Some(404) => SendMessageSourceError::ChannelNotFound,
        Some(429) => SendMessageSourceError::Unavailable,
        Some(status) if status >= 500 => SendMessageSourceError::Unavailable,
        _ => SendMessageSourceError::Other(describe(error)),
    }
}

fn map_create_error(error: ApiError) -> CreateChatSourceError {
    match error.status() {
        Some(401) | Some(403) => CreateChatSourceError::Unauthorized,
        Some(429) => CreateChatSourceError::Unavailable,
        Some(status) if status >= 500 => CreateChatSourceError::Unavailable,
        _ => CreateChatSourceError::Other(describe(error)),
    }
}

fn describe(error: ApiError) -> String {
    match error.server_message() {
        Some(message) => message.to_string(),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_errors_follow_the_status_taxonomy() {
        let cases = [
            (401, SendMessageSourceError::Unauthorized),
            (403, SendMessageSourceError::Unauthorized),
            (404, SendMessageSourceError::ChannelNotFound),
            (429, SendMessageSourceError::Unavailable),
            (500, SendMessageSourceError::Unavailable),
            (503, SendMessageSourceError::Unavailable),
        ];

        for (status, expected) in cases {
            let mapped = map_send_error(ApiError::Status {
                status,
                message: String::new(),
            });
            assert_eq!(mapped, expected, "status {status}");
        }
    }

    #[test]
    fn unmapped_send_error_carries_the_server_message() {
        let mapped = map_send_error(ApiError::Status {
            status: 422,
            message: "message too long".to_string(),
        });

        assert_eq!(
            mapped,
            SendMessageSourceError::Other("message too long".to_string())
        );
    }

    #[test]
    fn refresh_errors_follow_the_status_taxonomy() {
        let mapped = map_chat_error(ApiError::Status {
            status: 404,
            message: String::new(),
        });
        assert_eq!(mapped, ChatSourceError::NotFound);

        let mapped = map_chat_error(ApiError::Decode("bad json".to_string()));
        assert!(matches!(mapped, ChatSourceError::Other(_)));
    }
}
