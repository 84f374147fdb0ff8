//! End-to-end behaviour of the stores through the public API.

use chrono::{Duration, Utc};
use msgstore::db::store::MessageStore;
use msgstore::db::owner::{ContactOwner, GroupOwner};
use msgstore::model::display_tag;
use msgstore::{Database, MessageFilter, MessageRecord, MessageState, MessageType, OwnerKey, StoreConfig};

const ALICE: &str = "ALICE001";

fn fresh() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.create_schema().unwrap();
    db
}

fn contact_text(identity: &str, body: &str) -> MessageRecord {
    let mut r = MessageRecord::new(OwnerKey::Contact(identity.into()), MessageType::Text);
    r.body = Some(body.into());
    r.saved = true;
    r
}

fn ids(records: &[MessageRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

#[test]
fn find_returns_only_matching_owner_and_predicates() {
    let db = fresh();
    let store = db.contact_messages();

    let mut unread = contact_text(ALICE, "new");
    store.create(&mut unread).unwrap();
    let mut read = contact_text(ALICE, "seen");
    read.read = true;
    store.create(&mut read).unwrap();
    let mut mine = contact_text(ALICE, "reply");
    mine.outbox = true;
    store.create(&mut mine).unwrap();
    let mut status = contact_text(ALICE, "call ended");
    status.is_status_message = true;
    store.create(&mut status).unwrap();
    store.create(&mut contact_text("BOB00002", "not alice")).unwrap();

    let alice = ALICE.to_string();
    let all = store.find(&alice, &MessageFilter::default()).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|r| r.owner == OwnerKey::Contact(ALICE.into())));

    let filter = MessageFilter {
        unread_only: true,
        ..Default::default()
    };
    let found = store.find(&alice, &filter).unwrap();
    assert_eq!(ids(&found), vec![unread.id]);
    assert!(found
        .iter()
        .all(|r| !r.outbox && !r.read && !r.is_status_message));

    let no_status = MessageFilter {
        include_status_messages: false,
        ..Default::default()
    };
    assert!(store
        .find(&alice, &no_status)
        .unwrap()
        .iter()
        .all(|r| !r.is_status_message));
}

#[test]
fn round_trip_preserves_every_timestamp_combination() {
    let db = fresh();
    let store = db.contact_messages();
    let base = Utc::now() - Duration::days(1);

    for mask in 0u32..128 {
        let at = |bit: u32| {
            (mask & (1 << bit) != 0).then(|| {
                let t = base + Duration::minutes(i64::from(bit));
                chrono::DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap()
            })
        };
        let mut record = contact_text(ALICE, &format!("combo {mask}"));
        record.posted_at = at(0);
        record.modified_at = at(1);
        record.delivered_at = at(2);
        record.read_at = at(3);
        record.edited_at = at(4);
        record.deleted_at = at(5);
        record.created_at = at(6);

        store.create(&mut record).unwrap();
        let stored = store.get_by_id(record.id).unwrap().unwrap();
        assert_eq!(stored, record, "timestamp mask {mask:#09b}");
    }
}

#[test]
fn recovery_sweep_is_idempotent() {
    let db = fresh();
    let store = db.contact_messages();

    for state in [
        MessageState::Pending,
        MessageState::Uploading,
        MessageState::Sending,
        MessageState::Sent,
    ] {
        let mut r = MessageRecord::new(OwnerKey::Contact(ALICE.into()), MessageType::File);
        r.outbox = true;
        r.state = Some(state);
        store.create(&mut r).unwrap();
    }

    assert_eq!(store.mark_unscheduled_as_failed().unwrap(), 2);
    assert_eq!(store.mark_unscheduled_as_failed().unwrap(), 0);

    let states: Vec<_> = store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|r| r.state)
        .collect();
    assert_eq!(
        states,
        vec![
            Some(MessageState::Failed),
            Some(MessageState::Failed),
            Some(MessageState::Sending),
            Some(MessageState::Sent),
        ]
    );
}

#[test]
fn pagination_partitions_all_records() {
    let db = fresh();
    let store = db.group_messages();
    const TOTAL: usize = 23;

    for i in 0..TOTAL {
        let mut r = MessageRecord::new(OwnerKey::Group(5), MessageType::Text);
        r.body = Some(format!("message {i}"));
        store.create(&mut r).unwrap();
    }

    let mut filter = MessageFilter {
        page_size: Some(5),
        ..Default::default()
    };
    let mut seen = Vec::new();
    loop {
        let page = store.find(&5, &filter).unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 5);
        seen.extend(ids(&page));
        filter = filter.page_after(page[page.len() - 1].id);
    }

    assert_eq!(seen.len(), TOTAL);
    assert!(seen.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn unstar_all_only_clears_the_starred_bit() {
    let db = fresh();
    let store = db.contact_messages();

    let mut a = contact_text(ALICE, "a");
    a.display_tags = display_tag::STARRED | display_tag::PINNED;
    store.create(&mut a).unwrap();
    let mut b = contact_text(ALICE, "b");
    store.create(&mut b).unwrap();
    store.set_display_tag(b.id, display_tag::STARRED, true).unwrap();

    assert_eq!(store.count_starred().unwrap(), 2);
    store.unstar_all().unwrap();

    assert_eq!(store.count_starred().unwrap(), 0);
    assert_eq!(store.get_by_id(a.id).unwrap().unwrap().display_tags, display_tag::PINNED);
    assert_eq!(store.get_by_id(b.id).unwrap().unwrap().display_tags, display_tag::NONE);
}

#[test]
fn search_finds_body_and_caption_oldest_first() {
    let db = fresh();
    let store = db.contact_messages();

    let mut text = contact_text(ALICE, "hello world");
    text.created_at = Some(Utc::now() - Duration::minutes(10));
    store.create(&mut text).unwrap();

    let mut file = MessageRecord::new(OwnerKey::Contact(ALICE.into()), MessageType::File);
    file.caption = Some("hello world".into());
    file.body = Some(r#"{"isDownloaded":true}"#.into());
    store.create(&mut file).unwrap();

    let hits = store.search_by_text(Some("hello"), true, false, true).unwrap();
    assert_eq!(ids(&hits), vec![text.id, file.id]);
}

#[test]
fn group_insert_and_delete_scenario() {
    let db = fresh();
    let store: MessageStore<'_, GroupOwner> = db.group_messages();

    let mut records = Vec::new();
    for body in ["one", "two", "three"] {
        let mut r = MessageRecord::new(OwnerKey::Group(42), MessageType::Text);
        r.body = Some(body.into());
        store.create(&mut r).unwrap();
        records.push(r);
    }
    assert_eq!(ids(&records), vec![1, 2, 3]);
    assert_eq!(ids(&store.find(&42, &MessageFilter::default()).unwrap()), vec![3, 2, 1]);

    assert!(store.delete(&records[1]).unwrap());
    assert_eq!(ids(&store.find(&42, &MessageFilter::default()).unwrap()), vec![3, 1]);
}

#[test]
fn duplicate_uid_surfaces_as_unique_violation() {
    let db = fresh();
    let store: MessageStore<'_, ContactOwner> = db.contact_messages();

    let mut first = contact_text(ALICE, "first");
    store.create(&mut first).unwrap();
    let mut copy = first.clone();
    copy.id = 0;

    let err = store.create(&mut copy).unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("messages.db"),
        ..Default::default()
    };

    {
        let db = Database::open(&config).unwrap();
        db.create_schema().unwrap();
        db.contact_messages()
            .create(&mut contact_text(ALICE, "persisted"))
            .unwrap();
    }

    let db = Database::open(&config).unwrap();
    assert_eq!(db.contact_messages().count_messages(&ALICE.to_string()).unwrap(), 1);
}
