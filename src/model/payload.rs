//! Type-specific payloads serialized into the `body` column.
//!
//! Only the fields this layer reads are modelled; everything else in the JSON
//! is ignored.

use serde::{Deserialize, Serialize};

use super::record::MessageRecord;
use super::types::MessageType;

/// Video, voice message and file payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
    #[serde(default)]
    pub is_downloaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// 1:1 call status rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoipStatusPayload {
    #[serde(default)]
    pub call_id: Option<u64>,
    #[serde(default)]
    pub status: Option<i64>,
}

/// Group call status rows. Group call ids are opaque strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCallStatusPayload {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
}

fn parse<T: for<'de> Deserialize<'de>>(body: Option<&str>) -> Option<T> {
    serde_json::from_str(body?).ok()
}

/// Media payload of a record, `None` if the record has no download state or
/// its body is missing or malformed.
pub fn media_payload(record: &MessageRecord) -> Option<MediaPayload> {
    match record.message_type {
        Some(t) if t.has_download_state() => parse(record.body.as_deref()),
        _ => None,
    }
}

/// Whether the record's media has been fetched. A missing or unreadable
/// payload counts as not downloaded. Types without download state are
/// always available.
pub fn is_downloaded(record: &MessageRecord) -> bool {
    match record.message_type {
        Some(t) if t.has_download_state() => {
            media_payload(record).map(|p| p.is_downloaded).unwrap_or(false)
        }
        _ => true,
    }
}

pub fn voip_status_payload(record: &MessageRecord) -> Option<VoipStatusPayload> {
    match record.message_type {
        Some(MessageType::VoipStatus) => parse(record.body.as_deref()),
        _ => None,
    }
}

pub fn group_call_status_payload(record: &MessageRecord) -> Option<GroupCallStatusPayload> {
    match record.message_type {
        Some(MessageType::GroupCallStatus) => parse(record.body.as_deref()),
        _ => None,
    }
}
