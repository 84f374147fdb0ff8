//! SQL for the message stores.
//!
//! Statement shapes that are the same for every owner kind are built here
//! from the owner's table and column names.
//!
//! CHANGELOG:
//! - 02/06/2026 - Browse mode shares the search statement shape
//! - 01/29/2026 - Initial query builders

use rusqlite::types::Value;

use super::codec::tag_predicate;
use super::owner::Owner;
use super::schema::*;
use super::table::placeholders;
use crate::model::{display_tag, MessageType};

/// How many of an owner's newest call status rows are scanned when matching
/// a call id. Older rows are never looked at.
pub const RECENT_VOIP_STATUS_WINDOW: u32 = 20;

/// Hard cap on search results.
pub const MAX_SEARCH_RESULTS: u32 = 200;

/// Inbound, saved, unread and not a status message.
pub fn unread_clause() -> String {
    format!(
        "`{COLUMN_OUTBOX}` = 0 AND `{COLUMN_IS_SAVED}` = 1 AND `{COLUMN_IS_READ}` = 0 \
         AND `{COLUMN_IS_STATUS_MESSAGE}` = 0"
    )
}

pub fn owner_clause<O: Owner>() -> String {
    format!("`{}` = ?", O::OWNER_COLUMN)
}

/// `SELECT *` for one owner with an additional WHERE body.
/// `ORDER BY` and `LIMIT` are appended by the caller.
pub fn select_by_owner<O: Owner>(extra: &str) -> String {
    format!(
        "SELECT * FROM `{}` WHERE {} AND {}",
        O::TABLE,
        owner_clause::<O>(),
        extra
    )
}

/// Newest rows of one type for an owner, bounded by
/// [`RECENT_VOIP_STATUS_WINDOW`].
/// Parameters: owner key, type ordinal.
pub fn recent_of_type<O: Owner>() -> String {
    format!(
        "{} ORDER BY `{COLUMN_ID}` DESC LIMIT {RECENT_VOIP_STATUS_WINDOW}",
        select_by_owner::<O>(&format!("`{COLUMN_TYPE}` = ?"))
    )
}

fn type_list(alias: &str, types: &[MessageType], params: &mut Vec<Value>) -> String {
    params.extend(types.iter().map(|t| Value::Integer(t.ordinal())));
    format!("{alias}.`{COLUMN_TYPE}` IN ({})", placeholders(types.len()))
}

/// Text search across one message table.
///
/// A match is a body hit on a body-searchable type or a caption hit on a
/// caption-searchable type. Without a query the same statement lists every
/// row satisfying the type, status and archive constraints.
pub fn search<O: Owner>(
    query: Option<&str>,
    include_archived: bool,
    starred_only: bool,
    sort_ascending: bool,
) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let pattern = query.map(|q| format!("%{q}%"));

    let body_types = type_list("m", &MessageType::BODY_SEARCHABLE, &mut params);
    let body_match = match &pattern {
        Some(p) => {
            params.push(Value::Text(p.clone()));
            format!("({body_types} AND m.`{COLUMN_BODY}` LIKE ?)")
        }
        None => format!("({body_types})"),
    };

    let caption_types = type_list("m", &MessageType::CAPTION_SEARCHABLE, &mut params);
    let caption_match = match &pattern {
        Some(p) => {
            params.push(Value::Text(p.clone()));
            format!("({caption_types} AND m.`{COLUMN_CAPTION}` LIKE ?)")
        }
        None => format!("({caption_types})"),
    };

    let join = if include_archived {
        String::new()
    } else {
        format!(" {}", O::active_owner_join("m"))
    };
    let starred = if starred_only {
        format!(" AND {}", tag_predicate(Some("m"), display_tag::STARRED))
    } else {
        String::new()
    };
    let direction = if sort_ascending { "ASC" } else { "DESC" };

    let sql = format!(
        "SELECT m.* FROM `{table}` m{join} \
         WHERE ({body_match} OR {caption_match}) \
         AND m.`{COLUMN_IS_STATUS_MESSAGE}` = 0{starred} \
         ORDER BY m.`{COLUMN_CREATED_AT}` {direction}, m.`{COLUMN_ID}` {direction} \
         LIMIT {MAX_SEARCH_RESULTS}",
        table = O::TABLE,
    );
    (sql, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::owner::{ContactOwner, GroupOwner};

    #[test]
    fn test_search_params_with_query() {
        let (sql, params) = search::<ContactOwner>(Some("hello"), true, false, true);
        assert!(sql.starts_with("SELECT m.* FROM `message` m WHERE"));
        assert!(sql.contains("m.`body` LIKE ?"));
        assert!(sql.contains("m.`caption` LIKE ?"));
        assert!(sql.ends_with("LIMIT 200"));
        assert_eq!(
            params,
            vec![
                Value::Integer(0),
                Value::Integer(4),
                Value::Integer(7),
                Value::Text("%hello%".into()),
                Value::Integer(1),
                Value::Integer(8),
                Value::Text("%hello%".into()),
            ]
        );
    }

    #[test]
    fn test_browse_mode_keeps_constraints() {
        let (sql, params) = search::<GroupOwner>(None, false, true, false);
        assert!(!sql.contains("LIKE"));
        assert!(sql.contains("INNER JOIN `m_group` o"));
        assert!(sql.contains("(m.`displayTags` & 1) > 0"));
        assert!(sql.contains("m.`isStatusMessage` = 0"));
        assert!(sql.contains("DESC"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_recent_of_type_is_bounded() {
        let sql = recent_of_type::<ContactOwner>();
        assert_eq!(
            sql,
            "SELECT * FROM `message` WHERE `identity` = ? AND `type` = ? ORDER BY `id` DESC LIMIT 20"
        );
    }
}
