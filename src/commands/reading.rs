//! Reading commands: list, search.
//!
//! CHANGELOG:
//! - 02/06/2026 - Search across all conversation kinds
//! - 01/29/2026 - Initial implementation

use anyhow::{Context, Result};
use serde_json::json;

use super::{parse_owner, KindArg, MessageView};
use crate::db::queries::MAX_SEARCH_RESULTS;
use crate::db::{Database, MessageFilter};
use crate::model::{contents_type, MessageRecord, MessageType, OwnerKey};
use crate::output::OutputControls;

/// Options of the `list` command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub unread: bool,
    pub page_size: Option<u32>,
    pub before: Option<i64>,
    pub types: Vec<String>,
    pub contents_types: Vec<String>,
    pub with_status: bool,
    pub downloaded_only: bool,
}

impl ListOptions {
    fn filter(&self) -> Result<MessageFilter> {
        let allowed_types = self
            .types
            .iter()
            .map(|name| {
                MessageType::from_name(name).with_context(|| format!("unknown message type '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        let allowed_contents_types = self
            .contents_types
            .iter()
            .map(|name| {
                contents_type::from_name(name)
                    .with_context(|| format!("unknown contents type '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MessageFilter {
            include_status_messages: self.with_status,
            unread_only: self.unread,
            allowed_types,
            allowed_contents_types,
            page_reference_id: self.before,
            page_size: self.page_size,
            only_downloaded: self.downloaded_only,
            ..Default::default()
        })
    }
}

fn print_messages(records: &[MessageRecord], heading: &str, output: &OutputControls) {
    let views: Vec<MessageView> = records.iter().map(MessageView::from).collect();
    if output.json {
        output.print(&json!({
            "count": views.len(),
            "messages": views,
        }));
        return;
    }

    if views.is_empty() {
        println!("No messages found.");
        return;
    }
    println!("{} ({} messages):", heading, views.len());
    println!("{}", "-".repeat(60));
    for view in &views {
        println!("{}", view.line(|s| output.preview(s)));
    }
}

/// List one conversation, newest first.
pub fn list(
    db: &Database,
    kind: KindArg,
    owner: &str,
    options: &ListOptions,
    output: &OutputControls,
) -> Result<()> {
    let filter = options.filter()?;
    let owner = parse_owner(kind, owner)?;
    let records = match &owner {
        OwnerKey::Contact(identity) => db.contact_messages().find(identity, &filter),
        OwnerKey::Group(id) => db.group_messages().find(id, &filter),
        OwnerKey::DistributionList(id) => db.distribution_list_messages().find(id, &filter),
    }
    .with_context(|| format!("Failed to list messages of {owner}"))?;

    print_messages(&records, &format!("Messages of {owner}"), output);
    if !output.json && options.page_size.is_some() {
        if let Some(last) = records.last() {
            println!("(next page: --before {})", last.id);
        }
    }
    Ok(())
}

/// Text search over one or all conversation kinds.
pub fn search(
    db: &Database,
    query: Option<&str>,
    kind: Option<KindArg>,
    include_archived: bool,
    starred: bool,
    ascending: bool,
    output: &OutputControls,
) -> Result<()> {
    let wanted = |k: KindArg| kind.map_or(true, |selected| selected == k);
    let mut records = Vec::new();

    if wanted(KindArg::Contact) {
        records.extend(
            db.contact_messages()
                .search_by_text(query, include_archived, starred, ascending)
                .context("Failed to search contact messages")?,
        );
    }
    if wanted(KindArg::Group) {
        records.extend(
            db.group_messages()
                .search_by_text(query, include_archived, starred, ascending)
                .context("Failed to search group messages")?,
        );
    }
    if wanted(KindArg::DistributionList) {
        records.extend(
            db.distribution_list_messages()
                .search_by_text(query, include_archived, starred, ascending)
                .context("Failed to search distribution list messages")?,
        );
    }

    // Merge the per-table results under the same ordering and cap.
    records.sort_by_key(|r| (r.created_at, r.id));
    if !ascending {
        records.reverse();
    }
    records.truncate(MAX_SEARCH_RESULTS as usize);

    let heading = match query {
        Some(q) => format!("Matches for \"{q}\""),
        None => "All searchable messages".to_string(),
    };
    print_messages(&records, &heading, output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_options_to_filter() {
        let options = ListOptions {
            unread: true,
            page_size: Some(10),
            before: Some(50),
            types: vec!["text".into(), "FILE".into()],
            ..Default::default()
        };
        let filter = options.filter().unwrap();
        assert!(filter.unread_only);
        assert!(!filter.include_status_messages);
        assert_eq!(filter.allowed_types, vec![MessageType::Text, MessageType::File]);
        assert_eq!(filter.page_reference_id, Some(50));
        assert_eq!(filter.page_size, Some(10));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let options = ListOptions {
            types: vec!["hologram".into()],
            ..Default::default()
        };
        assert!(options.filter().is_err());
        let options = ListOptions {
            contents_types: vec!["hologram".into()],
            ..Default::default()
        };
        assert!(options.filter().is_err());
    }

    #[test]
    fn test_contents_types_reach_the_filter() {
        let options = ListOptions {
            contents_types: vec!["image".into(), "GIF".into()],
            ..Default::default()
        };
        let filter = options.filter().unwrap();
        assert_eq!(filter.allowed_contents_types, vec![contents_type::IMAGE, contents_type::GIF]);
    }

    #[test]
    fn test_list_and_search_run() {
        let db = Database::open_in_memory().unwrap();
        db.create_schema().unwrap();
        let mut record = MessageRecord::new(OwnerKey::Group(42), MessageType::Text);
        record.body = Some("hello group".into());
        db.group_messages().create(&mut record).unwrap();

        let output = OutputControls {
            json: true,
            compact: true,
            ..Default::default()
        };
        list(&db, KindArg::Group, "42", &ListOptions::default(), &output).unwrap();
        search(&db, Some("hello"), None, true, false, true, &output).unwrap();
        assert!(list(&db, KindArg::Group, "not-a-number", &ListOptions::default(), &output).is_err());
    }
}
