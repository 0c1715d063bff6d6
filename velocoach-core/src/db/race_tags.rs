use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{conversion_error, now, parse_timestamp, parse_uuid, Database, UnknownVariant};
use crate::models::{CreateRaceTagInput, RaceTag, RaceType};

impl Database {
    pub fn create_race_tag(&self, user_id: Uuid, input: CreateRaceTagInput) -> Result<RaceTag> {
        let id = Uuid::new_v4();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO race_tags (id, user_id, activity_id, race_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    user_id.to_string(),
                    input.activity_id,
                    input.race_type.map(|t| t.as_str()),
                    now()
                ],
            )?;
            Ok(())
        })?;

        self.get_race_tag(id)?
            .ok_or_else(|| anyhow::anyhow!("race tag {id} missing after insert"))
    }

    /// Whether `activity_id` is a synced activity owned by `user_id`.
    pub fn activity_exists(&self, user_id: Uuid, activity_id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT 1 FROM activities WHERE id = ?1 AND user_id = ?2",
                    params![activity_id, user_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some())
        })
    }

    pub fn get_race_tag(&self, id: Uuid) -> Result<Option<RaceTag>> {
        self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, user_id, activity_id, race_type, created_at FROM race_tags WHERE id = ?1",
                    [id.to_string()],
                    row_to_race_tag,
                )
                .optional()?)
        })
    }

    pub fn list_race_tags(&self, user_id: Uuid) -> Result<Vec<RaceTag>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, activity_id, race_type, created_at FROM race_tags
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )?;
            let tags = stmt
                .query_map([user_id.to_string()], row_to_race_tag)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    /// Returns false when no tag had that id.
    pub fn update_race_type(&self, id: Uuid, race_type: Option<RaceType>) -> Result<bool> {
        self.with_connection(|conn| {
            let updated = conn.execute(
                "UPDATE race_tags SET race_type = ?1 WHERE id = ?2",
                params![race_type.map(|t| t.as_str()), id.to_string()],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn delete_race_tag(&self, id: Uuid) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM race_tags WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

fn row_to_race_tag(row: &Row<'_>) -> rusqlite::Result<RaceTag> {
    let race_type = row
        .get::<_, Option<String>>(3)?
        .map(|t| RaceType::from_str(&t).ok_or_else(|| conversion_error(3, UnknownVariant(t.clone()))))
        .transpose()?;

    Ok(RaceTag {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        user_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        activity_id: row.get(2)?,
        race_type,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}
