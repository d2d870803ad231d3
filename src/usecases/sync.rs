//! Chat synchronization: initial load, delta refresh, optimistic send,
//! and the periodic poll loop.
//!
//! `ChatSync` owns the in-memory [`ChatState`] plus a loading flag and an
//! error slot. Network failures during load or refresh surface their
//! message into the slot and are otherwise swallowed; there are no
//! automatic retries. The poll loop awaits each refresh before arming the
//! next tick, so at most one refresh is ever in flight and a stale
//! response can never overwrite a newer one.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

use crate::{
    domain::{
        chat::{Channel, Contact},
        message::Message,
        sync::{ChatState, RefreshData},
    },
    usecases::{
        create_chat::{self, ChatCreator, CreateChatError, CreateChatRequest},
        send_message::{self, MessageSender, SendMessageCommand, SendMessageError},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatSourceError {
    #[error("not authorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("service temporarily unavailable")]
    Unavailable,
    #[error("{0}")]
    Other(String),
}

/// Read seam to the chat backend.
#[async_trait]
pub trait ChatDataSource: Send + Sync {
    /// Lists the channels the user participates in. An empty list is a
    /// valid state, not an error.
    async fn list_channels(&self, user_id: i64) -> Result<Vec<Channel>, ChatSourceError>;
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatSourceError>;
    /// Fetches the delta payload, optionally scoped to one channel.
    async fn refresh_data(&self, channel_id: Option<&str>)
        -> Result<RefreshData, ChatSourceError>;
}

pub struct ChatSync<S> {
    source: S,
    user_id: i64,
    selected_channel: Option<String>,
    state: ChatState,
    loading: bool,
    error: Option<String>,
}

impl<S> ChatSync<S> {
    pub fn new(source: S, user_id: i64) -> Self {
        Self {
            source,
            user_id,
            selected_channel: None,
            state: ChatState::default(),
            loading: false,
            error: None,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Last surfaced failure, if any; cleared at the start of every
    /// operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected_channel(&self) -> Option<&str> {
        self.selected_channel.as_deref()
    }
}

impl<S: ChatDataSource> ChatSync<S> {
    /// Joint initial load of the channel list and the contact directory.
    /// Both requests are issued together; the loading flag drops when both
    /// resolve or either fails.
    pub async fn load_initial(&mut self) {
        self.loading = true;
        self.error = None;

        let (channels, contacts) = tokio::join!(
            self.source.list_channels(self.user_id),
            self.source.list_contacts()
        );

        match (channels, contacts) {
            (Ok(channels), Ok(contacts)) => {
                self.state.replace_channels(channels);
                self.state.replace_contacts(contacts);
            }
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(error = %error, "initial chat load failed");
                self.error = Some(error.to_string());
            }
        }

        self.loading = false;
    }

    /// One delta refresh, scoped to the selected channel when one is open.
    /// Failures land in the error slot; state is left as it was.
    pub async fn refresh(&mut self) {
        self.error = None;

        match self
            .source
            .refresh_data(self.selected_channel.as_deref())
            .await
        {
            Ok(data) => {
                self.state.apply_refresh(data);
                tracing::debug!(
                    channels = self.state.channels.len(),
                    messages = self.state.messages.len(),
                    "chat data refreshed"
                );
            }
            Err(error) => {
                tracing::warn!(error = %error, "chat refresh failed");
                self.error = Some(error.to_string());
            }
        }
    }

    /// Switches the open channel and immediately refreshes so its message
    /// snapshot is loaded.
    pub async fn select_channel(&mut self, channel_id: Option<String>) {
        self.selected_channel = channel_id;
        self.state.messages.clear();
        self.state.current_channel = None;
        self.refresh().await;
    }

    /// Drives the fixed-interval poll until `on_refresh` asks to stop.
    /// The first refresh happens immediately; each subsequent tick waits
    /// for the previous refresh to finish (the in-flight guard).
    pub async fn run_poll<F>(&mut self, period: Duration, mut on_refresh: F)
    where
        F: FnMut(&ChatState, Option<&str>) -> bool,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.refresh().await;
            if !on_refresh(&self.state, self.error.as_deref()) {
                break;
            }
        }
    }

    /// Sends a message into the selected channel: local validation, one
    /// POST, optimistic append of the confirmed message, then a scoped
    /// refresh to reconcile with authoritative state. The refresh may
    /// supersede the optimistic append; that is expected.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, SendMessageError>
    where
        S: MessageSender,
    {
        let channel_id = self
            .selected_channel
            .clone()
            .ok_or(SendMessageError::NoChannelSelected)?;
        self.error = None;

        let command = SendMessageCommand {
            channel_id,
            text: text.to_owned(),
        };

        match send_message::send_message(&self.source, command).await {
            Ok(message) => {
                self.state.append_message(message.clone());
                self.refresh().await;
                Ok(message)
            }
            Err(error) => {
                self.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Creates a channel and reloads the full channel list so the new
    /// channel appears with its server-assigned metadata.
    pub async fn create_chat(
        &mut self,
        request: CreateChatRequest,
    ) -> Result<Channel, CreateChatError>
    where
        S: ChatCreator,
    {
        self.error = None;

        match create_chat::create_chat(&self.source, request).await {
            Ok(channel) => {
                self.load_initial().await;
                Ok(channel)
            }
            Err(error) => {
                self.error = Some(error.to_string());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        domain::{
            chat::ChannelKind,
            sync::{CurrentChannelSnapshot, DateGroup},
        },
        usecases::send_message::SendMessageSourceError,
    };

    #[derive(Default)]
    struct StubBackend {
        channels: Vec<Channel>,
        contacts: Vec<Contact>,
        refresh_result: Option<Result<RefreshData, ChatSourceError>>,
        list_failure: Option<ChatSourceError>,
        refresh_calls: Mutex<Vec<Option<String>>>,
        send_calls: Mutex<Vec<(String, String)>>,
        list_calls: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ChatDataSource for StubBackend {
        async fn list_channels(&self, user_id: i64) -> Result<Vec<Channel>, ChatSourceError> {
            self.list_calls.lock().expect("list lock").push(user_id);
            match &self.list_failure {
                Some(error) => Err(error.clone()),
                None => Ok(self.channels.clone()),
            }
        }

        async fn list_contacts(&self) -> Result<Vec<Contact>, ChatSourceError> {
            Ok(self.contacts.clone())
        }

        async fn refresh_data(
            &self,
            channel_id: Option<&str>,
        ) -> Result<RefreshData, ChatSourceError> {
            self.refresh_calls
                .lock()
                .expect("refresh lock")
                .push(channel_id.map(ToOwned::to_owned));
            self.refresh_result
                .clone()
                .unwrap_or(Ok(RefreshData::default()))
        }
    }

    #[async_trait]
    impl MessageSender for StubBackend {
        async fn send_message(
            &self,
            channel_id: &str,
            text: &str,
        ) -> Result<Message, SendMessageSourceError> {
            self.send_calls
                .lock()
                .expect("send lock")
                .push((channel_id.to_owned(), text.to_owned()));
            Ok(Message {
                id: 100,
                channel_id: channel_id.to_owned(),
                sender_id: 9,
                text: text.to_owned(),
                created_at: 1_700_000_000_000,
                receivers: vec![],
            })
        }
    }

    #[async_trait]
    impl ChatCreator for StubBackend {
        async fn create_chat(
            &self,
            request: &CreateChatRequest,
        ) -> Result<Channel, crate::usecases::create_chat::CreateChatSourceError> {
            Ok(channel("ch-new", &request.name))
        }
    }

    fn channel(id: &str, name: &str) -> Channel {
        Channel {
            id: id.to_owned(),
            kind: ChannelKind::Group,
            name: name.to_owned(),
            description: String::new(),
            participant_ids: vec![9, 10],
            group_image_url: None,
            created_at: Some(1_000),
        }
    }

    fn contact(id: i64, username: &str) -> Contact {
        Contact {
            id,
            username: username.to_owned(),
            profile_picture_url: None,
        }
    }

    #[tokio::test]
    async fn initial_load_populates_channels_and_contacts_jointly() {
        let backend = StubBackend {
            channels: vec![channel("ch-a", "a")],
            contacts: vec![contact(10, "lee")],
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);

        sync.load_initial().await;

        assert!(!sync.loading());
        assert_eq!(sync.error(), None);
        assert_eq!(sync.state().channels.len(), 1);
        assert_eq!(sync.state().contacts.len(), 1);
        assert_eq!(*sync.source.list_calls.lock().expect("lock"), vec![9]);
    }

    #[tokio::test]
    async fn initial_load_failure_surfaces_error_and_clears_loading() {
        let backend = StubBackend {
            list_failure: Some(ChatSourceError::Unavailable),
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);

        sync.load_initial().await;

        assert!(!sync.loading());
        assert_eq!(sync.error(), Some("service temporarily unavailable"));
    }

    #[tokio::test]
    async fn refresh_failure_keeps_prior_state() {
        let backend = StubBackend {
            channels: vec![channel("ch-a", "a")],
            refresh_result: Some(Err(ChatSourceError::Other("gateway down".to_owned()))),
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);
        sync.load_initial().await;

        sync.refresh().await;

        assert_eq!(sync.error(), Some("gateway down"));
        assert_eq!(sync.state().channels.len(), 1);
    }

    #[tokio::test]
    async fn refresh_clears_previous_error_on_success() {
        let backend = StubBackend {
            list_failure: Some(ChatSourceError::Unavailable),
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);
        sync.load_initial().await;
        assert!(sync.error().is_some());

        sync.refresh().await;

        assert_eq!(sync.error(), None);
    }

    #[tokio::test]
    async fn selecting_a_channel_triggers_a_scoped_refresh() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);

        sync.select_channel(Some("ch-a".to_owned())).await;

        assert_eq!(
            *sync.source.refresh_calls.lock().expect("lock"),
            vec![Some("ch-a".to_owned())]
        );
    }

    #[tokio::test]
    async fn send_message_appends_optimistically_and_refreshes_scoped() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);
        sync.select_channel(Some("ch-1".to_owned())).await;

        let message = sync.send_message("  hello  ").await.expect("send succeeds");

        assert_eq!(message.text, "hello");
        assert_eq!(message.sender_id, 9);
        assert!(sync.state().messages.iter().any(|m| m.text == "hello"));

        // Exactly one POST, with the trimmed text and the open channel id.
        assert_eq!(
            *sync.source.send_calls.lock().expect("lock"),
            vec![("ch-1".to_owned(), "hello".to_owned())]
        );
        // One refresh from selection, one reconciling refresh after the send.
        assert_eq!(
            *sync.source.refresh_calls.lock().expect("lock"),
            vec![Some("ch-1".to_owned()), Some("ch-1".to_owned())]
        );
    }

    #[tokio::test]
    async fn send_message_rejects_blank_text_without_network_call() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);
        sync.select_channel(Some("ch-1".to_owned())).await;

        for text in ["", "   "] {
            let result = sync.send_message(text).await;
            assert_eq!(result, Err(SendMessageError::EmptyMessage));
        }

        assert!(sync.source.send_calls.lock().expect("lock").is_empty());
        assert_eq!(sync.error(), Some("message cannot be empty"));
    }

    #[tokio::test]
    async fn send_message_without_selection_is_rejected() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);

        let result = sync.send_message("hello").await;

        assert_eq!(result, Err(SendMessageError::NoChannelSelected));
        assert!(sync.source.send_calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn optimistic_append_is_superseded_by_refresh_snapshot() {
        let backend = StubBackend {
            refresh_result: Some(Ok(RefreshData {
                current_channel: Some(CurrentChannelSnapshot {
                    channel: channel("ch-1", "a"),
                    groups: vec![DateGroup {
                        date: "2026-08-30".to_owned(),
                        messages: vec![Message {
                            id: 200,
                            channel_id: "ch-1".to_owned(),
                            sender_id: 9,
                            text: "hello".to_owned(),
                            created_at: 1_700_000_000_001,
                            receivers: vec![],
                        }],
                    }],
                }),
                ..RefreshData::default()
            })),
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);
        sync.select_channel(Some("ch-1".to_owned())).await;

        sync.send_message("hello").await.expect("send succeeds");

        // The authoritative snapshot replaced the optimistic insert.
        let ids: Vec<i64> = sync.state().messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![200]);
    }

    #[tokio::test]
    async fn create_chat_reloads_the_full_channel_list() {
        let backend = StubBackend {
            channels: vec![channel("ch-a", "a"), channel("ch-new", "Night shift")],
            ..StubBackend::default()
        };
        let mut sync = ChatSync::new(backend, 9);

        let created = sync
            .create_chat(CreateChatRequest {
                name: "Night shift".to_owned(),
                description: String::new(),
                participant_ids: vec![10],
            })
            .await
            .expect("create succeeds");

        assert_eq!(created.id, "ch-new");
        assert_eq!(sync.state().channels.len(), 2);
    }

    #[tokio::test]
    async fn create_chat_with_no_participants_is_rejected_locally() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);

        let result = sync.create_chat(CreateChatRequest::default()).await;

        assert_eq!(result, Err(CreateChatError::NoParticipants));
        assert!(sync.source.list_calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn poll_loop_refreshes_once_per_tick_and_stops_on_request() {
        let mut sync = ChatSync::new(StubBackend::default(), 9);

        let mut remaining = 3;
        sync.run_poll(Duration::from_millis(1), |_state, _error| {
            remaining -= 1;
            remaining > 0
        })
        .await;

        assert_eq!(sync.source.refresh_calls.lock().expect("lock").len(), 3);
    }
}
