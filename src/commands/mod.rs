//! Command implementations.
//!
//! CHANGELOG:
//! - 02/12/2026 - Maintenance commands split from reading
//! - 01/27/2026 - Initial module structure

pub mod maintenance;
pub mod reading;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::model::{MessageRecord, OwnerKey, OwnerKind};

/// Conversation kind as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Contact,
    Group,
    DistributionList,
}

impl From<KindArg> for OwnerKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Contact => OwnerKind::Contact,
            KindArg::Group => OwnerKind::Group,
            KindArg::DistributionList => OwnerKind::DistributionList,
        }
    }
}

/// Owner key from its command-line spelling: an identity for contacts, a
/// numeric id otherwise.
pub fn parse_owner(kind: KindArg, raw: &str) -> Result<OwnerKey> {
    let numeric = || {
        raw.parse::<i64>()
            .with_context(|| format!("'{raw}' is not a numeric {} id", OwnerKind::from(kind)))
    };
    Ok(match kind {
        KindArg::Contact => OwnerKey::Contact(raw.to_string()),
        KindArg::Group => OwnerKey::Group(numeric()?),
        KindArg::DistributionList => OwnerKey::DistributionList(numeric()?),
    })
}

/// Flattened message for output.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub uid: Option<String>,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub outbox: bool,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub read: bool,
    pub starred: bool,
    pub created_at: Option<String>,
    pub posted_at: Option<String>,
}

impl From<&MessageRecord> for MessageView {
    fn from(record: &MessageRecord) -> Self {
        Self {
            id: record.id,
            uid: record.uid.clone(),
            owner: record.owner.to_string(),
            sender: record.sender_identity.clone(),
            outbox: record.outbox,
            message_type: record.message_type.map(|t| t.name().to_string()),
            state: record.state.map(|s| s.as_str().to_string()),
            body: record.body.clone(),
            caption: record.caption.clone(),
            read: record.is_read(),
            starred: record.is_starred(),
            created_at: record.created_at.map(|d| d.to_rfc3339()),
            posted_at: record.effective_posted_at().map(|d| d.to_rfc3339()),
        }
    }
}

impl MessageView {
    /// One-line text rendering.
    pub fn line(&self, preview: impl Fn(&str) -> String) -> String {
        let who = if self.outbox {
            "Me".to_string()
        } else {
            self.sender.clone().unwrap_or_else(|| self.owner.clone())
        };
        let text = self
            .body
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("");
        format!(
            "#{} [{}] {} {}: {}",
            self.id,
            self.created_at.as_deref().unwrap_or(""),
            self.message_type.as_deref().unwrap_or("?"),
            who,
            preview(text)
        )
    }
}
