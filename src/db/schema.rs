//! Column names and DDL for the message tables.
//!
//! All three tables share the same column superset; each owner kind adds its
//! foreign key column (and the group table its per-member state map).

pub const COLUMN_ID: &str = "id";
pub const COLUMN_UID: &str = "uid";
pub const COLUMN_API_MESSAGE_ID: &str = "apiMessageId";
/// Contact rows: the conversation partner. Group / distribution-list rows:
/// the sender.
pub const COLUMN_IDENTITY: &str = "identity";
pub const COLUMN_OUTBOX: &str = "outbox";
pub const COLUMN_TYPE: &str = "type";
pub const COLUMN_CORRELATION_ID: &str = "correlationId";
pub const COLUMN_BODY: &str = "body";
pub const COLUMN_CAPTION: &str = "caption";
pub const COLUMN_IS_READ: &str = "isRead";
pub const COLUMN_IS_SAVED: &str = "isSaved";
/// Legacy, always written as 0.
pub const COLUMN_IS_QUEUED: &str = "isQueued";
pub const COLUMN_STATE: &str = "state";
pub const COLUMN_POSTED_AT: &str = "postedAtUtc";
pub const COLUMN_CREATED_AT: &str = "createdAtUtc";
pub const COLUMN_MODIFIED_AT: &str = "modifiedAtUtc";
pub const COLUMN_IS_STATUS_MESSAGE: &str = "isStatusMessage";
pub const COLUMN_QUOTED_MESSAGE_ID: &str = "quotedMessageId";
pub const COLUMN_CONTENTS_TYPE: &str = "messageContentsType";
pub const COLUMN_MESSAGE_FLAGS: &str = "messageFlags";
pub const COLUMN_DELIVERED_AT: &str = "deliveredAtUtc";
pub const COLUMN_READ_AT: &str = "readAtUtc";
pub const COLUMN_FORWARD_SECURITY_MODE: &str = "forwardSecurityMode";
pub const COLUMN_DISPLAY_TAGS: &str = "displayTags";
pub const COLUMN_EDITED_AT: &str = "editedAtUtc";
pub const COLUMN_DELETED_AT: &str = "deletedAtUtc";

pub const COLUMN_GROUP_ID: &str = "groupId";
pub const COLUMN_GROUP_MESSAGE_STATES: &str = "groupMessageStates";
pub const COLUMN_DISTRIBUTION_LIST_ID: &str = "distributionListId";

/// Archived flag on the owner tables.
pub const COLUMN_IS_ARCHIVED: &str = "isArchived";

pub const TABLE_CONTACT_MESSAGE: &str = "message";
pub const TABLE_GROUP_MESSAGE: &str = "m_group_message";
pub const TABLE_DISTRIBUTION_LIST_MESSAGE: &str = "distribution_list_message";

pub const TABLE_CONTACT: &str = "contacts";
pub const TABLE_GROUP: &str = "m_group";
pub const TABLE_DISTRIBUTION_LIST: &str = "distribution_list";

/// Shared column definitions, in table order after `id`.
const SHARED_COLUMNS: &[(&str, &str)] = &[
    (COLUMN_UID, "VARCHAR"),
    (COLUMN_API_MESSAGE_ID, "VARCHAR"),
    (COLUMN_IDENTITY, "VARCHAR"),
    (COLUMN_OUTBOX, "SMALLINT"),
    (COLUMN_TYPE, "INTEGER"),
    (COLUMN_CORRELATION_ID, "VARCHAR"),
    (COLUMN_BODY, "VARCHAR"),
    (COLUMN_CAPTION, "VARCHAR"),
    (COLUMN_IS_READ, "SMALLINT"),
    (COLUMN_IS_SAVED, "SMALLINT"),
    (COLUMN_IS_QUEUED, "TINYINT"),
    (COLUMN_STATE, "VARCHAR"),
    (COLUMN_POSTED_AT, "BIGINT"),
    (COLUMN_CREATED_AT, "BIGINT"),
    (COLUMN_MODIFIED_AT, "BIGINT"),
    (COLUMN_IS_STATUS_MESSAGE, "SMALLINT"),
    (COLUMN_QUOTED_MESSAGE_ID, "VARCHAR"),
    (COLUMN_CONTENTS_TYPE, "TINYINT"),
    (COLUMN_MESSAGE_FLAGS, "INT"),
    (COLUMN_DELIVERED_AT, "BIGINT"),
    (COLUMN_READ_AT, "BIGINT"),
    (COLUMN_FORWARD_SECURITY_MODE, "TINYINT DEFAULT 0"),
    (COLUMN_DISPLAY_TAGS, "TINYINT DEFAULT 0"),
    (COLUMN_EDITED_AT, "BIGINT"),
    (COLUMN_DELETED_AT, "BIGINT"),
];

/// `CREATE TABLE` for a message table with the shared columns plus `extra`
/// owner-specific column definitions.
pub fn create_message_table(table: &str, extra: &[(&str, &str)]) -> String {
    let mut columns = vec![format!("`{COLUMN_ID}` INTEGER PRIMARY KEY AUTOINCREMENT")];
    for (name, ty) in extra.iter().chain(SHARED_COLUMNS.iter()) {
        columns.push(format!("`{name}` {ty}"));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\n    {}\n)",
        columns.join(",\n    ")
    )
}

pub fn create_index(name: &str, table: &str, columns: &[&str]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| format!("`{c}`")).collect();
    format!(
        "CREATE INDEX IF NOT EXISTS `{name}` ON `{table}` ({})",
        cols.join(", ")
    )
}

pub fn create_unique_index(name: &str, table: &str, columns: &[&str]) -> String {
    create_index(name, table, columns).replacen("CREATE INDEX", "CREATE UNIQUE INDEX", 1)
}

/// Indexes every message table carries, named with `prefix`.
pub fn shared_indexes(prefix: &str, table: &str, owner_column: &str) -> Vec<String> {
    vec![
        create_unique_index(&format!("{prefix}_uid_idx"), table, &[COLUMN_UID]),
        create_index(&format!("{prefix}_owner_idx"), table, &[owner_column]),
        create_index(&format!("{prefix}_api_message_id_idx"), table, &[COLUMN_API_MESSAGE_ID]),
        create_index(&format!("{prefix}_outbox_idx"), table, &[COLUMN_OUTBOX]),
        create_index(&format!("{prefix}_correlation_id_idx"), table, &[COLUMN_CORRELATION_ID]),
        create_index(
            &format!("{prefix}_count_idx"),
            table,
            &[
                owner_column,
                COLUMN_OUTBOX,
                COLUMN_IS_SAVED,
                COLUMN_IS_READ,
                COLUMN_IS_STATUS_MESSAGE,
            ],
        ),
        create_index(
            &format!("{prefix}_state_idx"),
            table,
            &[COLUMN_TYPE, COLUMN_STATE, COLUMN_OUTBOX],
        ),
    ]
}
