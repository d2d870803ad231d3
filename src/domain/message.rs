/// Per-recipient delivery record carried on every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageReceiver {
    pub user_id: i64,
    pub read: bool,
}

/// A message inside exactly one channel. Timestamps are unix epoch
/// milliseconds as reported by the server; display order is always
/// derived from them, never from arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub channel_id: String,
    pub sender_id: i64,
    pub text: String,
    pub created_at: i64,
    pub receivers: Vec<MessageReceiver>,
}

impl Message {
    pub fn is_outgoing(&self, user_id: i64) -> bool {
        self.sender_id == user_id
    }

    /// Read flag for one recipient; false when the recipient is not listed.
    pub fn is_read_by(&self, user_id: i64) -> bool {
        self.receivers
            .iter()
            .any(|receiver| receiver.user_id == user_id && receiver.read)
    }
}
