//! Delta-refresh reconciliation for chat state.
//!
//! The backend's refresh endpoint returns only what changed since the last
//! known state: per-channel snapshots, an optional snapshot of the open
//! channel with its messages grouped by date, and an optional replacement
//! contact directory. `ChatState::apply_refresh` folds such a payload into
//! local state with an explicit conflict policy: channels are upserted by
//! id (last write wins, siblings untouched), the open channel's message
//! list is replaced outright after flattening and sorting by creation
//! timestamp, and a present contact list replaces the old one outright.

use crate::domain::{
    chat::{Channel, Contact},
    message::Message,
};

/// Messages for one calendar day, as grouped by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateGroup {
    pub date: String,
    pub messages: Vec<Message>,
}

/// Authoritative snapshot of the currently open channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentChannelSnapshot {
    pub channel: Channel,
    pub groups: Vec<DateGroup>,
}

/// Parsed delta payload. Absent sections mean "nothing changed", which is
/// distinct from present-but-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshData {
    /// Channel-level updates, each an authoritative snapshot.
    pub updates: Vec<Channel>,
    pub current_channel: Option<CurrentChannelSnapshot>,
    pub contact_list: Option<Vec<Contact>>,
}

/// In-memory chat state: the channel list, the open channel and its
/// messages, and the contact directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatState {
    pub channels: Vec<Channel>,
    pub current_channel: Option<Channel>,
    pub messages: Vec<Message>,
    pub contacts: Vec<Contact>,
}

impl ChatState {
    pub fn apply_refresh(&mut self, refresh: RefreshData) {
        for update in refresh.updates {
            self.upsert_channel(update);
        }

        if let Some(snapshot) = refresh.current_channel {
            self.messages = flatten_sorted(snapshot.groups);
            self.current_channel = Some(snapshot.channel);
        }

        if let Some(contacts) = refresh.contact_list {
            self.contacts = contacts;
        }
    }

    /// Replaces an existing channel with the same id in place, or appends
    /// when the id is unseen. Never duplicates, never drops siblings.
    fn upsert_channel(&mut self, channel: Channel) {
        match self
            .channels
            .iter_mut()
            .find(|existing| existing.id == channel.id)
        {
            Some(existing) => *existing = channel,
            None => self.channels.push(channel),
        }
    }

    /// Optimistic insert of a just-sent message; the next refresh replaces
    /// the whole list with the server's view, so no reconciliation beyond
    /// the append is needed here.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn replace_channels(&mut self, channels: Vec<Channel>) {
        self.channels = channels;
    }

    pub fn replace_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
    }

    pub fn contact_username(&self, user_id: i64) -> Option<&str> {
        self.contacts
            .iter()
            .find(|contact| contact.id == user_id)
            .map(|contact| contact.username.as_str())
    }
}

/// Flattens date groups into one list sorted ascending by creation
/// timestamp. Interleaved timestamps across groups are allowed; the sort
/// is stable, so equal timestamps keep their server-provided order.
fn flatten_sorted(groups: Vec<DateGroup>) -> Vec<Message> {
    let mut messages: Vec<Message> = groups.into_iter().flat_map(|group| group.messages).collect();
    messages.sort_by_key(|message| message.created_at);
    messages
}
