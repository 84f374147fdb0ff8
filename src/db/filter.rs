//! Listing filters and their SQL translation.
//!
//! Filtering happens in two stages: [`build_predicate`] produces the SQL
//! fragment, [`post_filter`] then drops records whose download flag (stored
//! inside the JSON body, not in a column) says the media is missing.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use super::schema::*;
use super::table::placeholders;
use crate::model::{payload, MessageRecord, MessageType};

/// Options for listing one conversation.
///
/// The default imposes no constraint at all. Empty lists mean "any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFilter {
    pub include_status_messages: bool,
    /// Inbound, unread, non-status only.
    pub unread_only: bool,
    pub include_unsaved: bool,
    pub allowed_types: Vec<MessageType>,
    pub allowed_contents_types: Vec<i64>,
    /// Each mask is required separately: `(displayTags & mask) > 0`.
    pub display_tags_mask: Vec<i64>,
    /// Exclusive cursor under descending id order.
    pub page_reference_id: Option<i64>,
    pub page_size: Option<u32>,
    pub only_downloaded: bool,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            include_status_messages: true,
            unread_only: false,
            include_unsaved: true,
            allowed_types: Vec::new(),
            allowed_contents_types: Vec::new(),
            display_tags_mask: Vec::new(),
            page_reference_id: None,
            page_size: None,
            only_downloaded: false,
        }
    }
}

impl MessageFilter {
    /// Next page after `last_seen_id`.
    pub fn page_after(&self, last_seen_id: i64) -> Self {
        Self {
            page_reference_id: Some(last_seen_id),
            ..self.clone()
        }
    }
}

/// AND-combined SQL clauses with their positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub clauses: Vec<String>,
    pub params: Vec<Value>,
}

impl Predicate {
    pub fn and(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    /// A clause without parameters.
    pub fn push(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The WHERE body. `1` when there are no clauses.
    pub fn sql(&self) -> String {
        if self.clauses.is_empty() {
            "1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }
}

fn column(alias: Option<&str>, name: &str) -> String {
    match alias {
        Some(a) => format!("{a}.`{name}`"),
        None => format!("`{name}`"),
    }
}

/// SQL side of a filter. `page_size` is not part of the predicate, see
/// [`limit_clause`].
pub fn build_predicate(filter: &MessageFilter, alias: Option<&str>) -> Predicate {
    let col = |name: &str| column(alias, name);
    let mut predicate = Predicate::default();

    if !filter.include_status_messages {
        predicate.push(format!("{} = 0", col(COLUMN_IS_STATUS_MESSAGE)));
    }
    if filter.unread_only {
        predicate.push(format!(
            "{} = 0 AND {} = 0 AND {} = 0",
            col(COLUMN_OUTBOX),
            col(COLUMN_IS_READ),
            col(COLUMN_IS_STATUS_MESSAGE)
        ));
    }
    if !filter.include_unsaved {
        predicate.push(format!("{} = 1", col(COLUMN_IS_SAVED)));
    }
    if !filter.allowed_types.is_empty() {
        predicate.and(
            format!(
                "{} IN ({})",
                col(COLUMN_TYPE),
                placeholders(filter.allowed_types.len())
            ),
            filter
                .allowed_types
                .iter()
                .map(|t| Value::Integer(t.ordinal())),
        );
    }
    if !filter.allowed_contents_types.is_empty() {
        predicate.and(
            format!(
                "{} IN ({})",
                col(COLUMN_CONTENTS_TYPE),
                placeholders(filter.allowed_contents_types.len())
            ),
            filter.allowed_contents_types.iter().copied().map(Value::Integer),
        );
    }
    for mask in &filter.display_tags_mask {
        predicate.and(
            format!("({} & ?) > 0", col(COLUMN_DISPLAY_TAGS)),
            [Value::Integer(*mask)],
        );
    }
    if let Some(reference) = filter.page_reference_id {
        predicate.and(format!("{} < ?", col(COLUMN_ID)), [Value::Integer(reference)]);
    }
    predicate
}

/// ` LIMIT n` when the filter pages, otherwise empty.
pub fn limit_clause(filter: &MessageFilter) -> String {
    filter
        .page_size
        .map(|n| format!(" LIMIT {n}"))
        .unwrap_or_default()
}

/// In-memory stage: applies the options that cannot be expressed in SQL.
pub fn post_filter(records: &mut Vec<MessageRecord>, filter: &MessageFilter) {
    if filter.only_downloaded {
        records.retain(payload::is_downloaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{display_tag, OwnerKey};

    #[test]
    fn test_default_filter_is_unconstrained() {
        let predicate = build_predicate(&MessageFilter::default(), None);
        assert!(predicate.is_empty());
        assert_eq!(predicate.sql(), "1");
        assert_eq!(limit_clause(&MessageFilter::default()), "");
    }

    #[test]
    fn test_unread_expands_to_conjunction() {
        let filter = MessageFilter {
            unread_only: true,
            ..Default::default()
        };
        let predicate = build_predicate(&filter, Some("m"));
        assert_eq!(
            predicate.sql(),
            "m.`outbox` = 0 AND m.`isRead` = 0 AND m.`isStatusMessage` = 0"
        );
        assert!(predicate.params.is_empty());
    }

    #[test]
    fn test_each_mask_is_a_separate_clause() {
        let filter = MessageFilter {
            display_tags_mask: vec![display_tag::STARRED, display_tag::PINNED],
            ..Default::default()
        };
        let predicate = build_predicate(&filter, None);
        assert_eq!(
            predicate.sql(),
            "(`displayTags` & ?) > 0 AND (`displayTags` & ?) > 0"
        );
        assert_eq!(predicate.params, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_params_follow_clause_order() {
        let filter = MessageFilter {
            include_status_messages: false,
            include_unsaved: false,
            allowed_types: vec![MessageType::Text, MessageType::File],
            allowed_contents_types: vec![9],
            page_reference_id: Some(100),
            page_size: Some(25),
            ..Default::default()
        };
        let predicate = build_predicate(&filter, None);
        assert_eq!(
            predicate.sql(),
            "`isStatusMessage` = 0 AND `isSaved` = 1 AND `type` IN (?, ?) \
             AND `messageContentsType` IN (?) AND `id` < ?"
        );
        assert_eq!(
            predicate.params,
            vec![
                Value::Integer(0),
                Value::Integer(8),
                Value::Integer(9),
                Value::Integer(100)
            ]
        );
        assert_eq!(limit_clause(&filter), " LIMIT 25");
    }

    #[test]
    fn test_post_filter_drops_missing_media() {
        let owner = OwnerKey::Contact("ECHOECHO".into());
        let mut text = MessageRecord::new(owner.clone(), MessageType::Text);
        text.body = Some("plain".into());
        let mut fetched = MessageRecord::new(owner.clone(), MessageType::File);
        fetched.body = Some(r#"{"isDownloaded":true}"#.into());
        let mut pending = MessageRecord::new(owner.clone(), MessageType::Video);
        pending.body = Some(r#"{"isDownloaded":false}"#.into());
        let broken = MessageRecord::new(owner, MessageType::VoiceMessage);

        let mut records = vec![text.clone(), fetched.clone(), pending.clone(), broken.clone()];
        post_filter(&mut records, &MessageFilter::default());
        assert_eq!(records.len(), 4);

        let filter = MessageFilter {
            only_downloaded: true,
            ..Default::default()
        };
        post_filter(&mut records, &filter);
        assert_eq!(records, vec![text, fetched]);
    }

    #[test]
    fn test_page_after_keeps_other_options() {
        let filter = MessageFilter {
            page_size: Some(10),
            unread_only: true,
            ..Default::default()
        };
        let next = filter.page_after(57);
        assert_eq!(next.page_reference_id, Some(57));
        assert_eq!(next.page_size, Some(10));
        assert!(next.unread_only);
    }
}
