//! Maintenance commands: init, stats, recover, unstar-all.

use anyhow::{Context, Result};
use serde_json::json;

use super::KindArg;
use crate::db::Database;
use crate::output::OutputControls;

/// Create the message tables, and optionally minimal owner tables.
pub fn init(db: &Database, owner_tables: bool, output: &OutputControls) -> Result<()> {
    db.create_schema().context("Failed to create message tables")?;
    if owner_tables {
        db.create_owner_tables().context("Failed to create owner tables")?;
    }

    if output.json {
        output.print(&json!({"success": true, "owner_tables": owner_tables}));
    } else {
        println!("Message tables ready.");
    }
    Ok(())
}

pub fn stats(db: &Database, output: &OutputControls) -> Result<()> {
    let stats = db.stats().context("Failed to read table statistics")?;

    if output.json {
        output.print(&stats);
    } else {
        println!("{:<28} {:>10} {:>10}", "TABLE", "MESSAGES", "STARRED");
        for s in &stats {
            println!("{:<28} {:>10} {:>10}", s.table, s.messages, s.starred);
        }
    }
    Ok(())
}

/// Fail outgoing file uploads that were interrupted.
pub fn recover(db: &Database, output: &OutputControls) -> Result<()> {
    let affected = db
        .mark_unscheduled_as_failed()
        .context("Failed to run recovery sweep")?;

    if output.json {
        output.print(&json!({"success": true, "marked_failed": affected}));
    } else {
        println!("Marked {affected} interrupted upload(s) as failed.");
    }
    Ok(())
}

pub fn unstar_all(db: &Database, kind: Option<KindArg>, output: &OutputControls) -> Result<()> {
    let wanted = |k: KindArg| kind.map_or(true, |selected| selected == k);
    let mut cleared = 0;
    if wanted(KindArg::Contact) {
        cleared += db.contact_messages().unstar_all()?;
    }
    if wanted(KindArg::Group) {
        cleared += db.group_messages().unstar_all()?;
    }
    if wanted(KindArg::DistributionList) {
        cleared += db.distribution_list_messages().unstar_all()?;
    }

    if output.json {
        output.print(&json!({"success": true, "unstarred": cleared}));
    } else {
        println!("Unstarred {cleared} message(s).");
    }
    Ok(())
}
