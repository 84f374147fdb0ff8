//! Per-owner specifics of the three message tables.
//!
//! Everything that differs between contact, group and distribution-list
//! messages sits behind [`Owner`]: the foreign key column, the owner table
//! joined to exclude archived conversations, and the few extra columns a
//! table carries. The store itself is generic over this trait.

use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use super::codec;
use super::row::RowReader;
use super::schema::*;
use super::table::ColumnMap;
use crate::error::{Result, StoreError};
use crate::model::{MessageRecord, OwnerKey, OwnerKind};

pub trait Owner {
    /// Conversation key as stored in [`Owner::OWNER_COLUMN`].
    type Key: Clone + fmt::Debug + fmt::Display + Default + Into<Value>;

    const KIND: OwnerKind;
    /// Message table.
    const TABLE: &'static str;
    /// Foreign key column in [`Owner::TABLE`].
    const OWNER_COLUMN: &'static str;
    /// Owner table and its key column, joined to filter archived owners.
    const OWNER_TABLE: &'static str;
    const OWNER_TABLE_KEY: &'static str;
    const OWNER_TABLE_KEY_TYPE: &'static str;
    const INDEX_PREFIX: &'static str;
    /// Column definitions beyond the shared set.
    const EXTRA_COLUMNS: &'static [(&'static str, &'static str)];

    fn wrap(key: Self::Key) -> OwnerKey;

    fn key_of(owner: &OwnerKey) -> Option<&Self::Key>;

    fn read_key(reader: &RowReader<'_, '_>) -> Option<Self::Key>;

    fn key_value(key: &Self::Key) -> Value {
        key.clone().into()
    }

    /// Owner of the current row. A NULL foreign key is corrupt data; it is
    /// logged and read as the default key.
    fn decode_owner(reader: &RowReader<'_, '_>) -> OwnerKey {
        let key = Self::read_key(reader).unwrap_or_else(|| {
            warn!(
                table = Self::TABLE,
                column = Self::OWNER_COLUMN,
                "message row without owner"
            );
            Self::Key::default()
        });
        Self::wrap(key)
    }

    /// Owner-specific columns: the foreign key plus any extras.
    fn encode_owner_columns(record: &MessageRecord, columns: &mut ColumnMap) -> Result<()>;

    fn decode_extra(_reader: &RowReader<'_, '_>, _record: &mut MessageRecord) {}

    /// Table and index DDL, executed once for a fresh database.
    fn ddl() -> Vec<String> {
        let mut statements = vec![create_message_table(Self::TABLE, Self::EXTRA_COLUMNS)];
        statements.extend(shared_indexes(Self::INDEX_PREFIX, Self::TABLE, Self::OWNER_COLUMN));
        statements
    }

    /// Minimal owner table: key plus archived flag.
    fn owner_table_ddl() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS `{}` (`{}` {} PRIMARY KEY, `{COLUMN_IS_ARCHIVED}` TINYINT DEFAULT 0)",
            Self::OWNER_TABLE,
            Self::OWNER_TABLE_KEY,
            Self::OWNER_TABLE_KEY_TYPE
        )
    }

    /// `INNER JOIN` keeping only messages of non-archived owners.
    fn active_owner_join(alias: &str) -> String {
        format!(
            "INNER JOIN `{table}` o ON o.`{key}` = {alias}.`{column}` AND o.`{COLUMN_IS_ARCHIVED}` = 0",
            table = Self::OWNER_TABLE,
            key = Self::OWNER_TABLE_KEY,
            column = Self::OWNER_COLUMN,
        )
    }

    fn mismatch(record: &MessageRecord) -> StoreError {
        StoreError::OwnerMismatch {
            expected: Self::KIND,
            found: record.owner.kind(),
        }
    }
}

/// Decode a full record, owner columns included.
pub fn decode_record<O: Owner>(reader: &RowReader<'_, '_>) -> MessageRecord {
    let mut record = codec::decode(reader, O::decode_owner(reader));
    O::decode_extra(reader, &mut record);
    record
}

/// Encode a full record for `O`'s table. Fails if the record belongs to a
/// different owner kind.
pub fn encode_record<O: Owner>(record: &MessageRecord) -> Result<ColumnMap> {
    let mut columns = codec::encode(record);
    O::encode_owner_columns(record, &mut columns)?;
    Ok(columns)
}

fn sender(record: &MessageRecord) -> Value {
    record
        .sender_identity
        .clone()
        .map(Value::Text)
        .unwrap_or(Value::Null)
}

/// One-to-one conversations, keyed by identity.
#[derive(Debug, Clone, Copy)]
pub struct ContactOwner;

impl Owner for ContactOwner {
    type Key = String;

    const KIND: OwnerKind = OwnerKind::Contact;
    const TABLE: &'static str = TABLE_CONTACT_MESSAGE;
    const OWNER_COLUMN: &'static str = COLUMN_IDENTITY;
    const OWNER_TABLE: &'static str = TABLE_CONTACT;
    const OWNER_TABLE_KEY: &'static str = COLUMN_IDENTITY;
    const OWNER_TABLE_KEY_TYPE: &'static str = "VARCHAR";
    const INDEX_PREFIX: &'static str = "message";
    const EXTRA_COLUMNS: &'static [(&'static str, &'static str)] = &[];

    fn wrap(key: String) -> OwnerKey {
        OwnerKey::Contact(key)
    }

    fn key_of(owner: &OwnerKey) -> Option<&String> {
        match owner {
            OwnerKey::Contact(identity) => Some(identity),
            _ => None,
        }
    }

    fn read_key(reader: &RowReader<'_, '_>) -> Option<String> {
        reader.get_string(COLUMN_IDENTITY)
    }

    fn encode_owner_columns(record: &MessageRecord, columns: &mut ColumnMap) -> Result<()> {
        let identity = Self::key_of(&record.owner).ok_or_else(|| Self::mismatch(record))?;
        columns.push((COLUMN_IDENTITY, Value::Text(identity.clone())));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GroupOwner;

impl Owner for GroupOwner {
    type Key = i64;

    const KIND: OwnerKind = OwnerKind::Group;
    const TABLE: &'static str = TABLE_GROUP_MESSAGE;
    const OWNER_COLUMN: &'static str = COLUMN_GROUP_ID;
    const OWNER_TABLE: &'static str = TABLE_GROUP;
    const OWNER_TABLE_KEY: &'static str = COLUMN_ID;
    const OWNER_TABLE_KEY_TYPE: &'static str = "INTEGER";
    const INDEX_PREFIX: &'static str = "m_group_message";
    const EXTRA_COLUMNS: &'static [(&'static str, &'static str)] = &[
        (COLUMN_GROUP_ID, "INTEGER NOT NULL"),
        (COLUMN_GROUP_MESSAGE_STATES, "VARCHAR"),
    ];

    fn wrap(key: i64) -> OwnerKey {
        OwnerKey::Group(key)
    }

    fn key_of(owner: &OwnerKey) -> Option<&i64> {
        match owner {
            OwnerKey::Group(id) => Some(id),
            _ => None,
        }
    }

    fn read_key(reader: &RowReader<'_, '_>) -> Option<i64> {
        reader.get_i64(COLUMN_GROUP_ID)
    }

    fn encode_owner_columns(record: &MessageRecord, columns: &mut ColumnMap) -> Result<()> {
        let group_id = *Self::key_of(&record.owner).ok_or_else(|| Self::mismatch(record))?;
        let states = match &record.group_message_states {
            Some(map) => Value::Text(serde_json::to_string(map)?),
            None => Value::Null,
        };
        columns.push((COLUMN_GROUP_ID, Value::Integer(group_id)));
        columns.push((COLUMN_IDENTITY, sender(record)));
        columns.push((COLUMN_GROUP_MESSAGE_STATES, states));
        Ok(())
    }

    fn decode_extra(reader: &RowReader<'_, '_>, record: &mut MessageRecord) {
        record.sender_identity = reader.get_string(COLUMN_IDENTITY);
        record.group_message_states = reader
            .get_string(COLUMN_GROUP_MESSAGE_STATES)
            .and_then(|raw| match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!(id = record.id, error = %e, "unreadable group message states");
                    None
                }
            });
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DistributionListOwner;

impl Owner for DistributionListOwner {
    type Key = i64;

    const KIND: OwnerKind = OwnerKind::DistributionList;
    const TABLE: &'static str = TABLE_DISTRIBUTION_LIST_MESSAGE;
    const OWNER_COLUMN: &'static str = COLUMN_DISTRIBUTION_LIST_ID;
    const OWNER_TABLE: &'static str = TABLE_DISTRIBUTION_LIST;
    const OWNER_TABLE_KEY: &'static str = COLUMN_ID;
    const OWNER_TABLE_KEY_TYPE: &'static str = "INTEGER";
    const INDEX_PREFIX: &'static str = "distribution_list_message";
    const EXTRA_COLUMNS: &'static [(&'static str, &'static str)] =
        &[(COLUMN_DISTRIBUTION_LIST_ID, "INTEGER NOT NULL")];

    fn wrap(key: i64) -> OwnerKey {
        OwnerKey::DistributionList(key)
    }

    fn key_of(owner: &OwnerKey) -> Option<&i64> {
        match owner {
            OwnerKey::DistributionList(id) => Some(id),
            _ => None,
        }
    }

    fn read_key(reader: &RowReader<'_, '_>) -> Option<i64> {
        reader.get_i64(COLUMN_DISTRIBUTION_LIST_ID)
    }

    fn encode_owner_columns(record: &MessageRecord, columns: &mut ColumnMap) -> Result<()> {
        let list_id = *Self::key_of(&record.owner).ok_or_else(|| Self::mismatch(record))?;
        columns.push((COLUMN_DISTRIBUTION_LIST_ID, Value::Integer(list_id)));
        columns.push((COLUMN_IDENTITY, sender(record)));
        Ok(())
    }

    fn decode_extra(reader: &RowReader<'_, '_>, record: &mut MessageRecord) {
        record.sender_identity = reader.get_string(COLUMN_IDENTITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::table::Table;
    use crate::model::MessageType;
    use rusqlite::Connection;

    fn setup<O: Owner>(conn: &Connection) -> Table<'_> {
        let table = Table::new(conn, O::TABLE);
        table.create(&O::ddl()).unwrap();
        table
    }

    fn read_back<O: Owner>(table: &Table<'_>, id: i64) -> MessageRecord {
        table
            .query_first(
                &format!("SELECT * FROM `{}` WHERE `id` = ?", O::TABLE),
                &[Value::Integer(id)],
                decode_record::<O>,
            )
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_group_round_trip_with_states() {
        let conn = Connection::open_in_memory().unwrap();
        let table = setup::<GroupOwner>(&conn);

        let mut record = MessageRecord::new(OwnerKey::Group(42), MessageType::Text);
        record.sender_identity = Some("ABCDEFGH".into());
        record.body = Some("hi all".into());
        record.group_message_states = Some(BTreeMap::from([
            ("ABCDEFGH".to_string(), "READ".to_string()),
            ("ZZZZZZZZ".to_string(), "DELIVERED".to_string()),
        ]));

        record.id = table.insert(&encode_record::<GroupOwner>(&record).unwrap()).unwrap();
        assert_eq!(read_back::<GroupOwner>(&table, record.id), record);
    }

    #[test]
    fn test_unreadable_group_states_decode_as_absent() {
        let conn = Connection::open_in_memory().unwrap();
        let table = setup::<GroupOwner>(&conn);
        conn.execute(
            "INSERT INTO m_group_message (groupId, type, groupMessageStates) VALUES (7, 0, '{not json')",
            [],
        )
        .unwrap();
        let record = read_back::<GroupOwner>(&table, conn.last_insert_rowid());
        assert_eq!(record.owner, OwnerKey::Group(7));
        assert_eq!(record.group_message_states, None);
    }

    #[test]
    fn test_contact_identity_is_owner() {
        let conn = Connection::open_in_memory().unwrap();
        let table = setup::<ContactOwner>(&conn);
        let record = MessageRecord::new(OwnerKey::Contact("ECHOECHO".into()), MessageType::Text);
        let id = table.insert(&encode_record::<ContactOwner>(&record).unwrap()).unwrap();
        assert_eq!(
            read_back::<ContactOwner>(&table, id).owner,
            OwnerKey::Contact("ECHOECHO".into())
        );
    }

    #[test]
    fn test_distribution_list_sender() {
        let conn = Connection::open_in_memory().unwrap();
        let table = setup::<DistributionListOwner>(&conn);
        let mut record = MessageRecord::new(OwnerKey::DistributionList(3), MessageType::Text);
        record.outbox = true;
        record.sender_identity = Some("MYSELF01".into());
        let id = table
            .insert(&encode_record::<DistributionListOwner>(&record).unwrap())
            .unwrap();
        let stored = read_back::<DistributionListOwner>(&table, id);
        assert_eq!(stored.owner, OwnerKey::DistributionList(3));
        assert_eq!(stored.sender_identity.as_deref(), Some("MYSELF01"));
    }

    #[test]
    fn test_encode_rejects_foreign_owner() {
        let record = MessageRecord::new(OwnerKey::Contact("ECHOECHO".into()), MessageType::Text);
        let err = encode_record::<GroupOwner>(&record).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OwnerMismatch {
                expected: OwnerKind::Group,
                found: OwnerKind::Contact
            }
        ));
    }

    #[test]
    fn test_owner_table_and_join() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&GroupOwner::owner_table_ddl()).unwrap();
        conn.execute("INSERT INTO m_group (id, isArchived) VALUES (1, 1)", [])
            .unwrap();
        assert_eq!(
            GroupOwner::active_owner_join("m"),
            "INNER JOIN `m_group` o ON o.`id` = m.`groupId` AND o.`isArchived` = 0"
        );
    }
}
