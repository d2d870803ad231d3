/// Type of channel for rendering and participant semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelKind {
    /// Private 1-to-1 conversation.
    #[default]
    Direct,
    /// Named multi-participant group.
    Group,
}

/// A conversation: a named or ad-hoc set of participants exchanging
/// messages. Created explicitly, mutated only server-side, never deleted
/// by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub kind: ChannelKind,
    pub name: String,
    pub description: String,
    pub participant_ids: Vec<i64>,
    pub group_image_url: Option<String>,
    pub created_at: Option<i64>,
}

impl Channel {
    /// Label shown in channel listings; ad-hoc direct channels often come
    /// back from the server without a name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            match self.kind {
                ChannelKind::Direct => "Direct chat",
                ChannelKind::Group => "Group chat",
            }
        } else {
            &self.name
        }
    }
}

/// Directory entry used to resolve a sender id to a display identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub username: String,
    pub profile_picture_url: Option<String>,
}
