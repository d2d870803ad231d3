//! Wire shapes for the VH3 gateway, parsed at the boundary and converted
//! into domain types. Optional sections stay `Option` so "absent" and
//! "present but empty" remain distinguishable after parsing.

use serde::Deserialize;

use crate::domain::{
    chat::{Channel, ChannelKind, Contact},
    message::{Message, MessageReceiver},
    sync::{CurrentChannelSnapshot, DateGroup, RefreshData},
    user::{CompanyRef, User},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ImageDto {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponseDto {
    #[serde(rename = "authToken")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_picture: Option<ImageDto>,
    #[serde(rename = "_company")]
    pub company: Option<CompanyDto>,
}

impl UserDto {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            profile_picture_url: self.profile_picture.map(|image| image.url),
            company: self.company.map(|company| CompanyRef {
                id: company.id,
                name: company.name,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKindDto {
    #[default]
    Direct,
    Group,
}

impl From<ChannelKindDto> for ChannelKind {
    fn from(kind: ChannelKindDto) -> Self {
        match kind {
            ChannelKindDto::Direct => ChannelKind::Direct,
            ChannelKindDto::Group => ChannelKind::Group,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDto {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ChannelKindDto,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub participants_id: Vec<i64>,
    pub group_image: Option<ImageDto>,
    pub created_at: Option<i64>,
}

impl ChannelDto {
    pub fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            kind: self.kind.into(),
            name: self.name,
            description: self.description,
            participant_ids: self.participants_id,
            group_image_url: self.group_image.map(|image| image.url),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverDto {
    pub user_id: i64,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub created_at: i64,
    pub channel_id: String,
    pub sender_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub receivers: Vec<ReceiverDto>,
}

impl MessageDto {
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            text: self.text,
            created_at: self.created_at,
            receivers: self
                .receivers
                .into_iter()
                .map(|receiver| MessageReceiver {
                    user_id: receiver.user_id,
                    read: receiver.read,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactDto {
    pub id: i64,
    pub username: String,
    pub profile_picture: Option<ImageDto>,
}

impl ContactDto {
    pub fn into_contact(self) -> Contact {
        Contact {
            id: self.id,
            username: self.username,
            profile_picture_url: self.profile_picture.map(|image| image.url),
        }
    }
}

/// One channel-level update inside a refresh payload; the nested
/// `_channel_info` is the authoritative snapshot the merge keys on.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelUpdateDto {
    #[serde(rename = "_channel_info")]
    pub channel_info: ChannelDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfoWrapperDto {
    #[serde(rename = "_channel_info")]
    pub channel_info: ChannelDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateGroupDto {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentChannelDto {
    pub channel_info: ChannelInfoWrapperDto,
    #[serde(default)]
    pub messages: Vec<DateGroupDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponseDto {
    #[serde(default)]
    pub updates: Vec<ChannelUpdateDto>,
    pub current_channel: Option<CurrentChannelDto>,
    pub contact_list: Option<Vec<ContactDto>>,
}

impl RefreshResponseDto {
    pub fn into_refresh_data(self) -> RefreshData {
        RefreshData {
            updates: self
                .updates
                .into_iter()
                .map(|update| update.channel_info.into_channel())
                .collect(),
            current_channel: self.current_channel.map(|current| CurrentChannelSnapshot {
                channel: current.channel_info.channel_info.into_channel(),
                groups: current
                    .messages
                    .into_iter()
                    .map(|group| DateGroup {
                        date: group.date,
                        messages: group
                            .messages
                            .into_iter()
                            .map(MessageDto::into_message)
                            .collect(),
                    })
                    .collect(),
            }),
            contact_list: self.contact_list.map(|contacts| {
                contacts
                    .into_iter()
                    .map(ContactDto::into_contact)
                    .collect()
            }),
        }
    }
}
