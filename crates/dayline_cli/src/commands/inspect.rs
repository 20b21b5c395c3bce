//! Inspect command implementation.

use super::{open_store, parse_owner, print_json};
use crate::error::CliResult;
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Applied schema version.
    pub schema_version: i32,
    /// Owner the counts are limited to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Rows not marked deleted, across all tables.
    pub live_count: u64,
    /// Tombstones across all tables.
    pub tombstone_count: u64,
    /// Per-table statistics.
    pub tables: Vec<TableStats>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Live rows.
    pub live: u64,
    /// Tombstones.
    pub tombstones: u64,
}

/// Collects row counts, optionally for one owner.
pub fn execute(path: &Path, owner: Option<&str>) -> CliResult<InspectResult> {
    let owner_id = owner.map(parse_owner).transpose()?;
    let store = open_store(path)?;

    let tables: Vec<TableStats> = store
        .counts(owner_id)?
        .into_iter()
        .map(|counts| TableStats {
            name: counts.table.to_string(),
            live: counts.live,
            tombstones: counts.tombstones,
        })
        .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        schema_version: store.schema_version()?,
        owner: owner_id.map(|o| o.to_string()),
        live_count: tables.iter().map(|t| t.live).sum(),
        tombstone_count: tables.iter().map(|t| t.tombstones).sum(),
        tables,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, owner: Option<&str>, format: &str) -> CliResult<()> {
    let result = execute(path, owner)?;
    match format {
        "json" => print_json(&result),
        _ => {
            print_text_output(&result);
            Ok(())
        }
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Dayline Database Inspection");
    println!("===========================");
    println!();
    println!("Path:           {}", result.path);
    println!("Schema version: {}", result.schema_version);
    if let Some(owner) = &result.owner {
        println!("Owner:          {owner}");
    }
    println!();
    println!("{:<22} {:>8} {:>11}", "Table", "Live", "Tombstones");
    for table in &result.tables {
        println!("{:<22} {:>8} {:>11}", table.name, table.live, table.tombstones);
    }
    println!();
    println!(
        "{:<22} {:>8} {:>11}",
        "Total", result.live_count, result.tombstone_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{migrate, push};
    use dayline_core::OwnerId;
    use dayline_testkit::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn counts_live_rows_and_tombstones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dayline.db");
        migrate::execute(&path).unwrap();
        let owner = OwnerId::new().to_string();

        let create = PushRequest::new(vec![PushItem::new("t1", "todo", payloads::todo("Call", &day(1)))]);
        let created = push::execute(&path, &owner, &serde_json::to_vec(&create).unwrap()).unwrap();
        let id = created.results[0].server_id.clone().unwrap();

        let delete = PushRequest::new(vec![
            PushItem::deletion("t1", "todo", Some(id)),
            PushItem::new("t2", "todo", payloads::todo("Shop", &day(2))),
        ]);
        push::execute(&path, &owner, &serde_json::to_vec(&delete).unwrap()).unwrap();

        let result = execute(&path, Some(&owner)).unwrap();
        let todos = result.tables.iter().find(|t| t.name == "todos").unwrap();
        assert_eq!(todos.live, 1);
        assert_eq!(todos.tombstones, 1);
        assert_eq!(result.live_count, 1);

        let other = execute(&path, Some(&OwnerId::new().to_string())).unwrap();
        assert_eq!(other.live_count + other.tombstone_count, 0);
    }
}
