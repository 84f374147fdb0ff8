//! One message store per owner kind, generic over [`Owner`].
//!
//! Stores borrow the database connection and add no locking of their own.
//! The create-or-update sequence is a read then a write; callers writing the
//! same logical record from several threads must serialize those calls.
//!
//! CHANGELOG:
//! - 02/10/2026 - Guarded state updates with the transition table
//! - 02/04/2026 - Bounded-recency call status lookups
//! - 01/29/2026 - Initial implementation

use rusqlite::types::Value;
use rusqlite::Connection;
use std::marker::PhantomData;
use tracing::{debug, warn};

use super::codec;
use super::filter::{build_predicate, limit_clause, post_filter, MessageFilter};
use super::owner::{decode_record, encode_record, ContactOwner, Owner};
use super::queries;
use super::schema::*;
use super::table::{placeholders, Table};
use crate::error::Result;
use crate::model::{payload, MessageRecord, MessageState, MessageType};

pub struct MessageStore<'c, O: Owner> {
    table: Table<'c>,
    _owner: PhantomData<O>,
}

impl<'c, O: Owner> MessageStore<'c, O> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            table: Table::new(conn, O::TABLE),
            _owner: PhantomData,
        }
    }

    pub fn table(&self) -> &Table<'c> {
        &self.table
    }

    pub fn create_table(&self) -> Result<()> {
        self.table.create(&O::ddl())
    }

    pub fn count(&self) -> Result<i64> {
        self.table.count()
    }

    pub fn delete_all(&self) -> Result<usize> {
        self.table.delete_all()
    }

    pub fn drop_table(&self) -> Result<()> {
        self.table.drop_table()
    }

    fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<MessageRecord>> {
        self.table.query(sql, params, decode_record::<O>)
    }

    fn select_first(&self, sql: &str, params: &[Value]) -> Result<Option<MessageRecord>> {
        self.table.query_first(sql, params, decode_record::<O>)
    }

    fn select_where(&self, clause: &str, params: &[Value]) -> Result<Option<MessageRecord>> {
        self.select_first(
            &format!("SELECT * FROM `{}` WHERE {} LIMIT 1", O::TABLE, clause),
            params,
        )
    }

    // Point lookups: absent, never an error, when nothing matches.

    pub fn get_by_id(&self, id: i64) -> Result<Option<MessageRecord>> {
        self.select_where(&format!("`{COLUMN_ID}` = ?"), &[Value::Integer(id)])
    }

    pub fn get_by_uid(&self, uid: &str) -> Result<Option<MessageRecord>> {
        self.select_where(&format!("`{COLUMN_UID}` = ?"), &[Value::Text(uid.to_string())])
    }

    pub fn get_by_api_message_id(&self, api_message_id: &str) -> Result<Option<MessageRecord>> {
        self.select_where(
            &format!("`{COLUMN_API_MESSAGE_ID}` = ?"),
            &[Value::Text(api_message_id.to_string())],
        )
    }

    pub fn get_by_api_message_id_and_owner(
        &self,
        api_message_id: &str,
        owner: &O::Key,
    ) -> Result<Option<MessageRecord>> {
        self.select_where(
            &format!("`{COLUMN_API_MESSAGE_ID}` = ? AND {}", queries::owner_clause::<O>()),
            &[Value::Text(api_message_id.to_string()), O::key_value(owner)],
        )
    }

    pub fn get_all(&self) -> Result<Vec<MessageRecord>> {
        self.select(&format!("SELECT * FROM `{}`", O::TABLE), &[])
    }

    /// Rows for one owner in descending id order, filtered in SQL and then
    /// in memory.
    pub fn find(&self, owner: &O::Key, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        let predicate = build_predicate(filter, None);
        let sql = format!(
            "{} ORDER BY `{COLUMN_ID}` DESC{}",
            queries::select_by_owner::<O>(&predicate.sql()),
            limit_clause(filter)
        );
        let mut params = vec![O::key_value(owner)];
        params.extend(predicate.params);

        let mut records = self.select(&sql, &params)?;
        post_filter(&mut records, filter);
        debug!(table = O::TABLE, owner = %owner, returned = records.len(), "find");
        Ok(records)
    }

    pub fn get_by_owner_unsorted(&self, owner: &O::Key) -> Result<Vec<MessageRecord>> {
        self.select(
            &format!("SELECT * FROM `{}` WHERE {}", O::TABLE, queries::owner_clause::<O>()),
            &[O::key_value(owner)],
        )
    }

    pub fn get_unread(&self, owner: &O::Key) -> Result<Vec<MessageRecord>> {
        self.select(
            &format!(
                "{} ORDER BY `{COLUMN_ID}` DESC",
                queries::select_by_owner::<O>(&queries::unread_clause())
            ),
            &[O::key_value(owner)],
        )
    }

    /// Newest row of the owner by id.
    pub fn get_last_message(&self, owner: &O::Key) -> Result<Option<MessageRecord>> {
        self.select_first(
            &format!(
                "SELECT * FROM `{}` WHERE {} ORDER BY `{COLUMN_ID}` DESC LIMIT 1",
                O::TABLE,
                queries::owner_clause::<O>()
            ),
            &[O::key_value(owner)],
        )
    }

    /// Messages the owner rejected because of a forward security key mismatch.
    pub fn get_rejected(&self, owner: &O::Key) -> Result<Vec<MessageRecord>> {
        self.select(
            &format!(
                "{} ORDER BY `{COLUMN_ID}` DESC",
                queries::select_by_owner::<O>(&format!("`{COLUMN_STATE}` = ?"))
            ),
            &[
                O::key_value(owner),
                Value::Text(MessageState::FsKeyMismatch.as_str().to_string()),
            ],
        )
    }

    pub fn search_by_text(
        &self,
        query: Option<&str>,
        include_archived: bool,
        starred_only: bool,
        sort_ascending: bool,
    ) -> Result<Vec<MessageRecord>> {
        let (sql, params) =
            queries::search::<O>(query, include_archived, starred_only, sort_ascending);
        self.select(&sql, &params)
    }

    pub fn count_by_types(&self, types: &[MessageType]) -> Result<i64> {
        if types.is_empty() {
            return Ok(0);
        }
        let params: Vec<Value> = types.iter().map(|t| Value::Integer(t.ordinal())).collect();
        self.table.count_where(
            Some(&format!("`{COLUMN_TYPE}` IN ({})", placeholders(types.len()))),
            &params,
        )
    }

    pub fn count_messages(&self, owner: &O::Key) -> Result<i64> {
        self.table
            .count_where(Some(&queries::owner_clause::<O>()), &[O::key_value(owner)])
    }

    pub fn count_unread(&self, owner: &O::Key) -> Result<i64> {
        self.table.count_where(
            Some(&format!(
                "{} AND {}",
                queries::owner_clause::<O>(),
                queries::unread_clause()
            )),
            &[O::key_value(owner)],
        )
    }

    fn recent_of_type(&self, owner: &O::Key, message_type: MessageType) -> Result<Vec<MessageRecord>> {
        self.select(
            &queries::recent_of_type::<O>(),
            &[O::key_value(owner), Value::Integer(message_type.ordinal())],
        )
    }

    /// Newest VoIP status row carrying `call_id`, looking only at the last
    /// [`queries::RECENT_VOIP_STATUS_WINDOW`] VoIP status rows of the owner.
    pub fn find_voip_status_by_call_id(
        &self,
        owner: &O::Key,
        call_id: u64,
    ) -> Result<Option<MessageRecord>> {
        Ok(self
            .recent_of_type(owner, MessageType::VoipStatus)?
            .into_iter()
            .find(|r| {
                payload::voip_status_payload(r).and_then(|p| p.call_id) == Some(call_id)
            }))
    }

    /// Same bounded window, over group call status rows.
    pub fn find_group_call_status_by_call_id(
        &self,
        owner: &O::Key,
        call_id: &str,
    ) -> Result<Option<MessageRecord>> {
        Ok(self
            .recent_of_type(owner, MessageType::GroupCallStatus)?
            .into_iter()
            .find(|r| {
                payload::group_call_status_payload(r)
                    .and_then(|p| p.call_id)
                    .as_deref()
                    == Some(call_id)
            }))
    }

    /// Insert a new row and write the generated id back into `record`.
    /// Unique constraint violations (duplicate uid) are returned as errors.
    pub fn create(&self, record: &mut MessageRecord) -> Result<i64> {
        let columns = encode_record::<O>(record)?;
        let id = self.table.insert(&columns)?;
        record.id = id;
        Ok(id)
    }

    fn stored_state(&self, id: i64) -> Result<Option<Option<String>>> {
        self.table.query_first(
            &format!("SELECT `{COLUMN_STATE}` FROM `{}` WHERE `{COLUMN_ID}` = ?", O::TABLE),
            &[Value::Integer(id)],
            |r| r.get_string(COLUMN_STATE),
        )
    }

    /// Overwrite the row with `record.id`. Returns false, with a warning,
    /// when no such row exists.
    ///
    /// A state the transition table does not allow is not written: the
    /// stored state is kept and the rest of the record is updated.
    pub fn update(&self, record: &MessageRecord) -> Result<bool> {
        let mut columns = encode_record::<O>(record)?;
        let stored = self
            .stored_state(record.id)?
            .flatten()
            .as_deref()
            .and_then(MessageState::parse);
        match (stored, record.state) {
            (Some(current), Some(next)) if !current.can_transition_to(next) => {
                warn!(
                    table = O::TABLE,
                    id = record.id,
                    from = current.as_str(),
                    to = next.as_str(),
                    "state regression ignored on update"
                );
                columns.retain(|(name, _)| *name != COLUMN_STATE);
            }
            (Some(current), None) => {
                warn!(
                    table = O::TABLE,
                    id = record.id,
                    from = current.as_str(),
                    "state reset ignored on update"
                );
                columns.retain(|(name, _)| *name != COLUMN_STATE);
            }
            _ => {}
        }
        let affected = self.table.update(record.id, &columns)?;
        if affected == 0 {
            warn!(table = O::TABLE, id = record.id, "update matched no rows");
        }
        Ok(affected > 0)
    }

    /// Update if the record has a positive id that exists, insert otherwise.
    pub fn create_or_update(&self, record: &mut MessageRecord) -> Result<()> {
        if record.id > 0 && self.table.exists(record.id)? {
            self.update(record)?;
        } else {
            self.create(record)?;
        }
        Ok(())
    }

    /// Persist a state change if the transition table allows it.
    ///
    /// Returns false for a missing row or a rejected transition; both are
    /// logged.
    pub fn update_state(&self, id: i64, next: MessageState) -> Result<bool> {
        let Some(current) = self.stored_state(id)? else {
            warn!(table = O::TABLE, id, "state update for missing message");
            return Ok(false);
        };

        if let Some(current) = current.as_deref().and_then(MessageState::parse) {
            if !current.can_transition_to(next) {
                warn!(
                    table = O::TABLE,
                    id,
                    from = current.as_str(),
                    to = next.as_str(),
                    "rejected state transition"
                );
                return Ok(false);
            }
        }

        let affected = self.table.update(
            id,
            &vec![(COLUMN_STATE, Value::Text(next.as_str().to_string()))],
        )?;
        Ok(affected > 0)
    }

    /// Set or clear one display tag bit, leaving the others alone.
    pub fn set_display_tag(&self, id: i64, tag: i64, enabled: bool) -> Result<bool> {
        let assignment = if enabled {
            format!("`{COLUMN_DISPLAY_TAGS}` = `{COLUMN_DISPLAY_TAGS}` | ?")
        } else {
            format!("`{COLUMN_DISPLAY_TAGS}` = `{COLUMN_DISPLAY_TAGS}` & ~?")
        };
        let affected = self.table.update_where(
            &assignment,
            &format!("`{COLUMN_ID}` = ?"),
            &[Value::Integer(tag), Value::Integer(id)],
        )?;
        if affected == 0 {
            warn!(table = O::TABLE, id, "display tag update matched no rows");
        }
        Ok(affected > 0)
    }

    /// Hard delete. `deleted_at` is left to the caller; this removes the row.
    pub fn delete(&self, record: &MessageRecord) -> Result<bool> {
        let affected = self
            .table
            .delete_where(&format!("`{COLUMN_ID}` = ?"), &[Value::Integer(record.id)])?;
        if affected == 0 {
            warn!(table = O::TABLE, id = record.id, "delete matched no rows");
        }
        Ok(affected > 0)
    }

    pub fn delete_by_owner(&self, owner: &O::Key) -> Result<usize> {
        self.table
            .delete_where(&queries::owner_clause::<O>(), &[O::key_value(owner)])
    }

    pub fn mark_unscheduled_as_failed(&self) -> Result<usize> {
        codec::mark_unscheduled_as_failed(&self.table)
    }

    pub fn count_starred(&self) -> Result<i64> {
        codec::count_starred(&self.table)
    }

    pub fn unstar_all(&self) -> Result<usize> {
        codec::unstar_all(&self.table)
    }
}

impl<'c> MessageStore<'c, ContactOwner> {
    /// Contact-only: the same api message id may exist once per direction.
    pub fn get_by_api_message_id_and_outbox(
        &self,
        api_message_id: &str,
        identity: &str,
        outbox: bool,
    ) -> Result<Option<MessageRecord>> {
        self.select_where(
            &format!(
                "`{COLUMN_API_MESSAGE_ID}` = ? AND `{COLUMN_IDENTITY}` = ? AND `{COLUMN_OUTBOX}` = ?"
            ),
            &[
                Value::Text(api_message_id.to_string()),
                Value::Text(identity.to_string()),
                Value::Integer(i64::from(outbox)),
            ],
        )
    }
}
