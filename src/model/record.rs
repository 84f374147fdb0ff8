//! The message record shared by all three conversation stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::{display_tag, ForwardSecurityMode, MessageState, MessageType};

/// The conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum OwnerKey {
    /// One-to-one conversation, keyed by the contact's identity.
    Contact(String),
    Group(i64),
    DistributionList(i64),
}

impl OwnerKey {
    pub fn kind(&self) -> OwnerKind {
        match self {
            OwnerKey::Contact(_) => OwnerKind::Contact,
            OwnerKey::Group(_) => OwnerKind::Group,
            OwnerKey::DistributionList(_) => OwnerKind::DistributionList,
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::Contact(identity) => write!(f, "contact:{identity}"),
            OwnerKey::Group(id) => write!(f, "group:{id}"),
            OwnerKey::DistributionList(id) => write!(f, "distribution_list:{id}"),
        }
    }
}

/// Discriminant of [`OwnerKey`] without the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Contact,
    Group,
    DistributionList,
}

impl OwnerKind {
    pub const ALL: [OwnerKind; 3] = [
        OwnerKind::Contact,
        OwnerKind::Group,
        OwnerKind::DistributionList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OwnerKind::Contact => "contact",
            OwnerKind::Group => "group",
            OwnerKind::DistributionList => "distribution_list",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stored message.
///
/// `id` is 0 until the row has been inserted; the store writes the generated
/// key back. `owner` never changes once the record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub uid: Option<String>,
    pub api_message_id: Option<String>,
    pub owner: OwnerKey,
    /// Sender identity for group and distribution-list rows.
    pub sender_identity: Option<String>,
    pub outbox: bool,
    pub message_type: Option<MessageType>,
    pub correlation_id: Option<String>,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub state: Option<MessageState>,
    pub read: bool,
    pub saved: bool,
    pub is_status_message: bool,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub contents_type: i64,
    pub message_flags: i64,
    pub quoted_message_id: Option<String>,
    pub forward_security_mode: ForwardSecurityMode,
    pub display_tags: i64,
    /// Per-member delivery state, group rows only.
    pub group_message_states: Option<BTreeMap<String, String>>,
}

impl MessageRecord {
    /// A fresh, not yet persisted record with a random uid and `created_at = now`.
    pub fn new(owner: OwnerKey, message_type: MessageType) -> Self {
        let mut record = Self::empty(owner);
        record.uid = Some(uuid::Uuid::new_v4().to_string());
        record.message_type = Some(message_type);
        record.created_at = Some(now_millis());
        record
    }

    /// A record with every optional field unset. Used by the decoder.
    pub fn empty(owner: OwnerKey) -> Self {
        Self {
            id: 0,
            uid: None,
            api_message_id: None,
            owner,
            sender_identity: None,
            outbox: false,
            message_type: None,
            correlation_id: None,
            body: None,
            caption: None,
            state: None,
            read: false,
            saved: false,
            is_status_message: false,
            posted_at: None,
            created_at: None,
            modified_at: None,
            delivered_at: None,
            read_at: None,
            edited_at: None,
            deleted_at: None,
            contents_type: 0,
            message_flags: 0,
            quoted_message_id: None,
            forward_security_mode: ForwardSecurityMode::None,
            display_tags: display_tag::NONE,
            group_message_states: None,
        }
    }

    /// Outgoing messages are never unread.
    pub fn is_read(&self) -> bool {
        self.read || self.outbox
    }

    /// Server-accepted time, falling back to creation time.
    pub fn effective_posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at.or(self.created_at)
    }

    pub fn is_starred(&self) -> bool {
        self.has_display_tag(display_tag::STARRED)
    }

    /// True when every bit of `tag` is set. `NONE` is never "set".
    pub fn has_display_tag(&self, tag: i64) -> bool {
        tag != 0 && self.display_tags & tag == tag
    }

    pub fn set_display_tag(&mut self, tag: i64, enabled: bool) {
        if enabled {
            self.display_tags |= tag;
        } else {
            self.display_tags &= !tag;
        }
    }
}

/// Current time truncated to the millisecond precision of the columns.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
