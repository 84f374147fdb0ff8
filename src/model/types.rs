//! Enumerations persisted in message rows.
//!
//! `MessageType` and `ForwardSecurityMode` are stored as integer ordinals,
//! `MessageState` as its canonical upper-case name. Conversion from storage
//! never fails: unknown values come back as `None` and the caller decides how
//! loudly to complain.
//!
//! CHANGELOG:
//! - 02/03/2026 - Added state transition table
//! - 01/27/2026 - Initial enum set

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content kind of a message. The discriminant is the stored ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Text = 0,
    Image = 1,
    Video = 2,
    VoiceMessage = 3,
    Location = 4,
    Contact = 5,
    Status = 6,
    Ballot = 7,
    File = 8,
    VoipStatus = 9,
    DateSeparator = 10,
    GroupCallStatus = 11,
    ForwardSecurityStatus = 12,
    GroupStatus = 13,
}

impl MessageType {
    pub const ALL: [MessageType; 14] = [
        MessageType::Text,
        MessageType::Image,
        MessageType::Video,
        MessageType::VoiceMessage,
        MessageType::Location,
        MessageType::Contact,
        MessageType::Status,
        MessageType::Ballot,
        MessageType::File,
        MessageType::VoipStatus,
        MessageType::DateSeparator,
        MessageType::GroupCallStatus,
        MessageType::ForwardSecurityStatus,
        MessageType::GroupStatus,
    ];

    /// Types whose searchable text lives in `body`.
    pub const BODY_SEARCHABLE: [MessageType; 3] =
        [MessageType::Text, MessageType::Location, MessageType::Ballot];

    /// Types whose searchable text lives in `caption`.
    pub const CAPTION_SEARCHABLE: [MessageType; 2] = [MessageType::Image, MessageType::File];

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.ordinal() == ordinal)
    }

    /// Media types whose payload records a download flag.
    pub fn has_download_state(self) -> bool {
        matches!(
            self,
            MessageType::Video | MessageType::VoiceMessage | MessageType::File
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Image => "IMAGE",
            MessageType::Video => "VIDEO",
            MessageType::VoiceMessage => "VOICEMESSAGE",
            MessageType::Location => "LOCATION",
            MessageType::Contact => "CONTACT",
            MessageType::Status => "STATUS",
            MessageType::Ballot => "BALLOT",
            MessageType::File => "FILE",
            MessageType::VoipStatus => "VOIP_STATUS",
            MessageType::DateSeparator => "DATE_SEPARATOR",
            MessageType::GroupCallStatus => "GROUP_CALL_STATUS",
            MessageType::ForwardSecurityStatus => "FORWARD_SECURITY_STATUS",
            MessageType::GroupStatus => "GROUP_STATUS",
        }
    }

    /// Parse a type from its name, case-insensitively (CLI input).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|t| t.name() == upper)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Delivery / processing state of a message.
///
/// Send chain: PENDING -> UPLOADING -> SENDING -> SENT -> DELIVERED -> READ.
/// FAILED hangs off every pre-READ send state. FS_KEY_MISMATCH is set by
/// inbound processing only and never leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageState {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "UPLOADING")]
    Uploading,
    #[serde(rename = "SENDING")]
    Sending,
    #[serde(rename = "SENT")]
    Sent,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "READ")]
    Read,
    #[serde(rename = "SENDFAILED")]
    Failed,
    #[serde(rename = "FS_KEY_MISMATCH")]
    FsKeyMismatch,
}

impl MessageState {
    pub const ALL: [MessageState; 8] = [
        MessageState::Pending,
        MessageState::Uploading,
        MessageState::Sending,
        MessageState::Sent,
        MessageState::Delivered,
        MessageState::Read,
        MessageState::Failed,
        MessageState::FsKeyMismatch,
    ];

    /// Canonical string written to the `state` column.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageState::Pending => "PENDING",
            MessageState::Uploading => "UPLOADING",
            MessageState::Sending => "SENDING",
            MessageState::Sent => "SENT",
            MessageState::Delivered => "DELIVERED",
            MessageState::Read => "READ",
            MessageState::Failed => "SENDFAILED",
            MessageState::FsKeyMismatch => "FS_KEY_MISMATCH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    /// Position on the send chain, `None` for FAILED and FS_KEY_MISMATCH.
    fn send_rank(self) -> Option<u8> {
        match self {
            MessageState::Pending => Some(0),
            MessageState::Uploading => Some(1),
            MessageState::Sending => Some(2),
            MessageState::Sent => Some(3),
            MessageState::Delivered => Some(4),
            MessageState::Read => Some(5),
            MessageState::Failed | MessageState::FsKeyMismatch => None,
        }
    }

    /// Whether moving from `self` to `next` keeps the state monotonic.
    ///
    /// Staying in place is always allowed. A failed send may be retried from
    /// the start of the chain up to SENDING.
    pub fn can_transition_to(self, next: MessageState) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (MessageState::FsKeyMismatch, _) | (_, MessageState::FsKeyMismatch) => false,
            (MessageState::Read, _) => false,
            (MessageState::Failed, n) => matches!(
                n,
                MessageState::Pending | MessageState::Uploading | MessageState::Sending
            ),
            (_, MessageState::Failed) => true,
            (current, n) => match (current.send_rank(), n.send_rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which forward-secrecy session produced the message. Persisted, never
/// interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForwardSecurityMode {
    #[default]
    None = 0,
    TwoDh = 1,
    FourDh = 2,
    All = 3,
    Partial = 4,
}

impl ForwardSecurityMode {
    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(ForwardSecurityMode::None),
            1 => Some(ForwardSecurityMode::TwoDh),
            2 => Some(ForwardSecurityMode::FourDh),
            3 => Some(ForwardSecurityMode::All),
            4 => Some(ForwardSecurityMode::Partial),
            _ => None,
        }
    }
}

/// Display tag bits packed into the `displayTags` column.
pub mod display_tag {
    pub const NONE: i64 = 0;
    pub const STARRED: i64 = 1;
    pub const PINNED: i64 = 2;
}

/// Coarse content classification stored in `messageContentsType`.
pub mod contents_type {
    pub const UNDEFINED: i64 = 0;
    pub const TEXT: i64 = 1;
    pub const IMAGE: i64 = 2;
    pub const VIDEO: i64 = 3;
    pub const AUDIO: i64 = 4;
    pub const VOICE_MESSAGE: i64 = 5;
    pub const LOCATION: i64 = 6;
    pub const STATUS: i64 = 7;
    pub const BALLOT: i64 = 8;
    pub const FILE: i64 = 9;
    pub const VOIP_STATUS: i64 = 10;
    pub const DATE_SEPARATOR: i64 = 11;
    pub const GIF: i64 = 12;
    pub const CONTACT: i64 = 13;
    pub const GROUP_CALL_STATUS: i64 = 14;

    /// Parse a contents type from its name, case-insensitively (CLI input).
    pub fn from_name(name: &str) -> Option<i64> {
        let value = match name.trim().to_ascii_lowercase().as_str() {
            "undefined" => UNDEFINED,
            "text" => TEXT,
            "image" => IMAGE,
            "video" => VIDEO,
            "audio" => AUDIO,
            "voice_message" => VOICE_MESSAGE,
            "location" => LOCATION,
            "status" => STATUS,
            "ballot" => BALLOT,
            "file" => FILE,
            "voip_status" => VOIP_STATUS,
            "date_separator" => DATE_SEPARATOR,
            "gif" => GIF,
            "contact" => CONTACT,
            "group_call_status" => GROUP_CALL_STATUS,
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ordinals_are_stable() {
        assert_eq!(MessageType::Text.ordinal(), 0);
        assert_eq!(MessageType::File.ordinal(), 8);
        assert_eq!(MessageType::from_ordinal(9), Some(MessageType::VoipStatus));
        assert_eq!(MessageType::from_ordinal(14), None);
        assert_eq!(MessageType::from_ordinal(-1), None);
    }

    #[test]
    fn test_type_from_name() {
        assert_eq!(MessageType::from_name("file"), Some(MessageType::File));
        assert_eq!(MessageType::from_name(" Voip_Status "), Some(MessageType::VoipStatus));
        assert_eq!(MessageType::from_name("sticker"), None);
    }

    #[test]
    fn test_contents_type_from_name() {
        assert_eq!(contents_type::from_name("gif"), Some(contents_type::GIF));
        assert_eq!(contents_type::from_name(" Voice_Message "), Some(contents_type::VOICE_MESSAGE));
        assert_eq!(contents_type::from_name("sticker"), None);
    }

    #[test]
    fn test_state_strings() {
        for state in MessageState::ALL {
            assert_eq!(MessageState::parse(state.as_str()), Some(state));
        }
        assert_eq!(MessageState::parse("SENDFAILED"), Some(MessageState::Failed));
        assert_eq!(MessageState::parse("pending"), None);
        assert_eq!(MessageState::parse("TRANSMOGRIFIED"), None);
    }

    #[test]
    fn test_send_chain_is_monotonic() {
        use MessageState::*;
        assert!(Pending.can_transition_to(Uploading));
        assert!(Pending.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Read));
        assert!(!Delivered.can_transition_to(Sent));
        assert!(!Read.can_transition_to(Delivered));
        assert!(!Sending.can_transition_to(Pending));
        assert!(Read.can_transition_to(Read));
    }

    #[test]
    fn test_failed_transitions() {
        use MessageState::*;
        assert!(Pending.can_transition_to(Failed));
        assert!(Uploading.can_transition_to(Failed));
        assert!(Delivered.can_transition_to(Failed));
        assert!(!Read.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Delivered));
    }

    #[test]
    fn test_fs_key_mismatch_is_isolated() {
        use MessageState::*;
        assert!(!Pending.can_transition_to(FsKeyMismatch));
        assert!(!FsKeyMismatch.can_transition_to(Read));
        assert!(FsKeyMismatch.can_transition_to(FsKeyMismatch));
    }

    #[test]
    fn test_forward_security_default() {
        assert_eq!(ForwardSecurityMode::default(), ForwardSecurityMode::None);
        assert_eq!(ForwardSecurityMode::from_ordinal(2), Some(ForwardSecurityMode::FourDh));
        assert_eq!(ForwardSecurityMode::from_ordinal(7), None);
    }
}
