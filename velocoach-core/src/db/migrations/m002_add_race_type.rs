//! Adds the nullable `race_type` column to `race_tags`.

use rusqlite::Connection;

use super::Migration;
use crate::db::schema::column_exists;

pub(super) struct AddRaceType;

impl Migration for AddRaceType {
    fn name(&self) -> &str {
        "002_add_race_type_to_race_tags"
    }

    fn apply(&self, conn: &Connection) -> rusqlite::Result<()> {
        if column_exists(conn, "race_tags", "race_type")? {
            tracing::debug!("race_tags.race_type already present");
            return Ok(());
        }
        conn.execute_batch("ALTER TABLE race_tags ADD COLUMN race_type TEXT;")
    }

    fn revert(&self, conn: &Connection) -> rusqlite::Result<()> {
        if !column_exists(conn, "race_tags", "race_type")? {
            return Ok(());
        }
        conn.execute_batch("ALTER TABLE race_tags DROP COLUMN race_type;")
    }
}
