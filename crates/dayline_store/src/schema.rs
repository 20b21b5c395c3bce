//! Table layouts.

/// How rows of a table are addressed besides their server id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// Rows are addressed by server id only.
    Identity,
    /// At most one row per owner.
    Owner,
    /// At most one row per owner and calendar date.
    OwnerDate,
    /// At most one row per owner, parent record and date.
    OwnerParentDate {
        /// Table holding the parent records.
        parent: &'static str,
    },
    /// At most one row per owner, parent record, date and dose index.
    OwnerParentDateDose {
        /// Table holding the parent records.
        parent: &'static str,
    },
}

impl KeyLayout {
    /// Key columns in index order, excluding `owner_id`.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            KeyLayout::Identity | KeyLayout::Owner => &[],
            KeyLayout::OwnerDate => &["date"],
            KeyLayout::OwnerParentDate { .. } => &["parent_id", "date"],
            KeyLayout::OwnerParentDateDose { .. } => &["parent_id", "date", "dose_number"],
        }
    }

    /// Returns true if the table carries a uniqueness constraint besides the id.
    pub fn is_keyed(&self) -> bool {
        !matches!(self, KeyLayout::Identity)
    }

    /// Parent table, for layouts that reference one.
    pub fn parent(&self) -> Option<&'static str> {
        match self {
            KeyLayout::OwnerParentDate { parent } | KeyLayout::OwnerParentDateDose { parent } => {
                Some(parent)
            }
            _ => None,
        }
    }
}

/// A table holding one kind of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// SQL table name.
    pub name: &'static str,
    /// Addressing layout.
    pub key: KeyLayout,
}

impl TableSpec {
    /// Creates a table spec.
    pub const fn new(name: &'static str, key: KeyLayout) -> Self {
        Self { name, key }
    }

    pub(crate) fn create_sql(&self) -> String {
        let key_columns: String = self
            .key
            .columns()
            .iter()
            .map(|column| match *column {
                "dose_number" => "    dose_number INTEGER NOT NULL,\n".to_string(),
                other => format!("    {other} TEXT NOT NULL,\n"),
            })
            .collect();

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {name} (\n    \
             id TEXT PRIMARY KEY,\n    \
             owner_id TEXT NOT NULL,\n\
             {key_columns}    \
             body TEXT NOT NULL,\n    \
             is_deleted INTEGER NOT NULL DEFAULT 0,\n    \
             created_at INTEGER NOT NULL,\n    \
             updated_at INTEGER NOT NULL\n);\n\
             CREATE INDEX IF NOT EXISTS idx_{name}_owner_updated ON {name} (owner_id, updated_at);\n",
            name = self.name,
        );

        if self.key.is_keyed() {
            let unique: Vec<&str> = std::iter::once("owner_id")
                .chain(self.key.columns().iter().copied())
                .collect();
            sql.push_str(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_{name}_key ON {name} ({columns});\n",
                name = self.name,
                columns = unique.join(", "),
            ));
        }
        sql
    }
}

/// Tables for the built-in kinds.
pub mod tables {
    use super::{KeyLayout, TableSpec};

    /// Habits.
    pub const HABITS: TableSpec = TableSpec::new("habits", KeyLayout::Identity);
    /// Per-day habit completions.
    pub const HABIT_COMPLETIONS: TableSpec = TableSpec::new(
        "habit_completions",
        KeyLayout::OwnerParentDate { parent: "habits" },
    );
    /// Medications.
    pub const MEDICATIONS: TableSpec = TableSpec::new("medications", KeyLayout::Identity);
    /// Per-dose medication logs.
    pub const MEDICATION_LOGS: TableSpec = TableSpec::new(
        "medication_logs",
        KeyLayout::OwnerParentDateDose {
            parent: "medications",
        },
    );
    /// Todos.
    pub const TODOS: TableSpec = TableSpec::new("todos", KeyLayout::Identity);
    /// Daily quick notes.
    pub const DAILY_NOTES: TableSpec = TableSpec::new("daily_notes", KeyLayout::OwnerDate);
    /// Daily mood ratings.
    pub const MOOD_RATINGS: TableSpec = TableSpec::new("mood_ratings", KeyLayout::OwnerDate);
    /// Calendar events.
    pub const CALENDAR_EVENTS: TableSpec = TableSpec::new("calendar_events", KeyLayout::Identity);
    /// Workout templates.
    pub const WORKOUT_TEMPLATES: TableSpec =
        TableSpec::new("workout_templates", KeyLayout::Identity);
    /// Daily workout logs.
    pub const WORKOUT_LOGS: TableSpec = TableSpec::new("workout_logs", KeyLayout::OwnerDate);
    /// Long-form posts.
    pub const MARKDOWN_NOTES: TableSpec = TableSpec::new("markdown_notes", KeyLayout::Identity);
    /// Per-owner settings.
    pub const USER_SETTINGS: TableSpec = TableSpec::new("user_settings", KeyLayout::Owner);

    /// Every built-in table, parents before children.
    pub const ALL: [TableSpec; 12] = [
        HABITS,
        HABIT_COMPLETIONS,
        MEDICATIONS,
        MEDICATION_LOGS,
        TODOS,
        DAILY_NOTES,
        MOOD_RATINGS,
        CALENDAR_EVENTS,
        WORKOUT_TEMPLATES,
        WORKOUT_LOGS,
        MARKDOWN_NOTES,
        USER_SETTINGS,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_columns() {
        assert!(KeyLayout::Identity.columns().is_empty());
        assert!(!KeyLayout::Identity.is_keyed());
        assert!(KeyLayout::Owner.is_keyed());
        assert_eq!(
            tables::MEDICATION_LOGS.key.columns(),
            &["parent_id", "date", "dose_number"]
        );
        assert_eq!(tables::HABIT_COMPLETIONS.key.parent(), Some("habits"));
    }

    #[test]
    fn create_sql_has_unique_index_for_keyed_tables() {
        let sql = tables::MOOD_RATINGS.create_sql();
        assert!(sql.contains("date TEXT NOT NULL"));
        assert!(sql.contains("UNIQUE INDEX IF NOT EXISTS uq_mood_ratings_key ON mood_ratings (owner_id, date)"));

        let sql = tables::HABITS.create_sql();
        assert!(!sql.contains("UNIQUE INDEX"));
    }

    #[test]
    fn parents_precede_children() {
        let position = |name: &str| tables::ALL.iter().position(|t| t.name == name).unwrap();
        for table in tables::ALL {
            if let Some(parent) = table.key.parent() {
                assert!(position(parent) < position(table.name));
            }
        }
    }
}
