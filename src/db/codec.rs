//! Shared-column codec for message rows, plus the table-wide operations every
//! message table supports: the stuck-upload recovery sweep and the starred
//! tag bulk operations.
//!
//! The owner foreign key and `identity` column are not handled here; each
//! owner kind encodes those itself (see `db::owner`).
//!
//! CHANGELOG:
//! - 02/09/2026 - Soft-fail enum decoding, log instead of error
//! - 01/28/2026 - Initial implementation

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use tracing::{info, warn};

use super::row::RowReader;
use super::schema::*;
use super::table::{ColumnMap, Table};
use crate::error::Result;
use crate::model::{display_tag, ForwardSecurityMode, MessageRecord, MessageState, MessageType, OwnerKey};

/// Decode every shared column of the current row into a record for `owner`.
///
/// Never fails: an out-of-range type ordinal leaves `message_type` unset, an
/// unknown state string is logged and leaves `state` unset, and a missing
/// forward security mode reads as [`ForwardSecurityMode::None`].
pub fn decode(reader: &RowReader<'_, '_>, owner: OwnerKey) -> MessageRecord {
    let mut record = MessageRecord::empty(owner);
    record.id = reader.get_i64(COLUMN_ID).unwrap_or_default();
    record.uid = reader.get_string(COLUMN_UID);
    record.api_message_id = reader.get_string(COLUMN_API_MESSAGE_ID);
    record.outbox = reader.get_bool(COLUMN_OUTBOX).unwrap_or(false);
    record.message_type = reader.get_i64(COLUMN_TYPE).and_then(|ordinal| {
        let decoded = MessageType::from_ordinal(ordinal);
        if decoded.is_none() {
            warn!(id = record.id, ordinal, "unknown message type ordinal");
        }
        decoded
    });
    record.correlation_id = reader.get_string(COLUMN_CORRELATION_ID);
    record.body = reader.get_string(COLUMN_BODY);
    record.caption = reader.get_string(COLUMN_CAPTION);
    record.read = reader.get_bool(COLUMN_IS_READ).unwrap_or(false);
    record.saved = reader.get_bool(COLUMN_IS_SAVED).unwrap_or(false);
    record.state = reader.get_string(COLUMN_STATE).and_then(|value| {
        let decoded = MessageState::parse(&value);
        if decoded.is_none() {
            warn!(id = record.id, state = %value, "unknown message state");
        }
        decoded
    });
    record.posted_at = reader.get_date(COLUMN_POSTED_AT);
    record.created_at = reader.get_date(COLUMN_CREATED_AT);
    record.modified_at = reader.get_date(COLUMN_MODIFIED_AT);
    record.is_status_message = reader.get_bool(COLUMN_IS_STATUS_MESSAGE).unwrap_or(false);
    record.quoted_message_id = reader.get_string(COLUMN_QUOTED_MESSAGE_ID);
    record.contents_type = reader.get_i64(COLUMN_CONTENTS_TYPE).unwrap_or_default();
    record.message_flags = reader.get_i64(COLUMN_MESSAGE_FLAGS).unwrap_or_default();
    record.delivered_at = reader.get_date(COLUMN_DELIVERED_AT);
    record.read_at = reader.get_date(COLUMN_READ_AT);
    record.forward_security_mode = match reader.get_i64(COLUMN_FORWARD_SECURITY_MODE) {
        None => ForwardSecurityMode::None,
        Some(ordinal) => ForwardSecurityMode::from_ordinal(ordinal).unwrap_or_else(|| {
            warn!(id = record.id, ordinal, "unknown forward security mode");
            ForwardSecurityMode::None
        }),
    };
    record.display_tags = reader.get_i64(COLUMN_DISPLAY_TAGS).unwrap_or(display_tag::NONE);
    record.edited_at = reader.get_date(COLUMN_EDITED_AT);
    record.deleted_at = reader.get_date(COLUMN_DELETED_AT);
    record
}

fn text(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn date(value: &Option<DateTime<Utc>>) -> Value {
    value
        .map(|d| Value::Integer(d.timestamp_millis()))
        .unwrap_or(Value::Null)
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

/// Encode every shared column except `id` and `identity`.
///
/// Absent timestamps become NULL, enums their canonical ordinal / name.
/// Outgoing records are always written as read.
pub fn encode(record: &MessageRecord) -> ColumnMap {
    vec![
        (COLUMN_UID, text(&record.uid)),
        (COLUMN_API_MESSAGE_ID, text(&record.api_message_id)),
        (COLUMN_OUTBOX, flag(record.outbox)),
        (
            COLUMN_TYPE,
            record
                .message_type
                .map(|t| Value::Integer(t.ordinal()))
                .unwrap_or(Value::Null),
        ),
        (COLUMN_CORRELATION_ID, text(&record.correlation_id)),
        (COLUMN_BODY, text(&record.body)),
        (COLUMN_CAPTION, text(&record.caption)),
        (COLUMN_IS_READ, flag(record.is_read())),
        (COLUMN_IS_SAVED, flag(record.saved)),
        (COLUMN_IS_QUEUED, flag(false)),
        (
            COLUMN_STATE,
            record
                .state
                .map(|s| Value::Text(s.as_str().to_string()))
                .unwrap_or(Value::Null),
        ),
        (COLUMN_POSTED_AT, date(&record.posted_at)),
        (COLUMN_CREATED_AT, date(&record.created_at)),
        (COLUMN_MODIFIED_AT, date(&record.modified_at)),
        (COLUMN_IS_STATUS_MESSAGE, flag(record.is_status_message)),
        (COLUMN_QUOTED_MESSAGE_ID, text(&record.quoted_message_id)),
        (COLUMN_CONTENTS_TYPE, Value::Integer(record.contents_type)),
        (COLUMN_MESSAGE_FLAGS, Value::Integer(record.message_flags)),
        (COLUMN_DELIVERED_AT, date(&record.delivered_at)),
        (COLUMN_READ_AT, date(&record.read_at)),
        (
            COLUMN_FORWARD_SECURITY_MODE,
            Value::Integer(record.forward_security_mode.ordinal()),
        ),
        (COLUMN_DISPLAY_TAGS, Value::Integer(record.display_tags)),
        (COLUMN_EDITED_AT, date(&record.edited_at)),
        (COLUMN_DELETED_AT, date(&record.deleted_at)),
    ]
}

/// Fail every outgoing FILE message still PENDING or UPLOADING.
///
/// SENDING rows are left alone: their upload finished and a durable send
/// task already exists for them.
pub fn mark_unscheduled_as_failed(table: &Table<'_>) -> Result<usize> {
    let affected = table.update_where(
        &format!("`{COLUMN_STATE}` = ?"),
        &format!(
            "`{COLUMN_OUTBOX}` = 1 AND `{COLUMN_TYPE}` = ? AND `{COLUMN_STATE}` IN (?, ?)"
        ),
        &[
            Value::Text(MessageState::Failed.as_str().to_string()),
            Value::Integer(MessageType::File.ordinal()),
            Value::Text(MessageState::Pending.as_str().to_string()),
            Value::Text(MessageState::Uploading.as_str().to_string()),
        ],
    )?;
    if affected > 0 {
        info!(table = table.name(), affected, "marked unscheduled file messages as failed");
    }
    Ok(affected)
}

/// `(displayTags & tag) > 0`, column optionally qualified with a table alias.
pub fn tag_predicate(alias: Option<&str>, tag: i64) -> String {
    match alias {
        Some(a) => format!("({a}.`{COLUMN_DISPLAY_TAGS}` & {tag}) > 0"),
        None => format!("(`{COLUMN_DISPLAY_TAGS}` & {tag}) > 0"),
    }
}

pub fn count_starred(table: &Table<'_>) -> Result<i64> {
    table.count_where(Some(&tag_predicate(None, display_tag::STARRED)), &[])
}

/// Clear the starred bit on every row, leaving all other tag bits intact.
pub fn unstar_all(table: &Table<'_>) -> Result<usize> {
    let affected = table.update_where(
        &format!(
            "`{COLUMN_DISPLAY_TAGS}` = `{COLUMN_DISPLAY_TAGS}` & ~{}",
            display_tag::STARRED
        ),
        &tag_predicate(None, display_tag::STARRED),
        &[],
    )?;
    info!(table = table.name(), affected, "cleared starred tag");
    Ok(affected)
}
