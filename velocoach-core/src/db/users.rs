use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{now, parse_timestamp, parse_uuid, Database};
use crate::models::{UpsertUserInput, User};

impl Database {
    /// Inserts the user or refreshes its profile fields.
    pub fn upsert_user(&self, input: UpsertUserInput) -> Result<User> {
        self.with_connection(|conn| {
            let ts = now();
            conn.execute(
                r#"
INSERT INTO users (id, strava_athlete_id, display_name, email, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?5)
ON CONFLICT(id) DO UPDATE SET
    strava_athlete_id = excluded.strava_athlete_id,
    display_name = excluded.display_name,
    email = excluded.email,
    updated_at = excluded.updated_at
"#,
                params![
                    input.id.to_string(),
                    input.strava_athlete_id,
                    input.display_name,
                    input.email,
                    ts
                ],
            )?;
            Ok(())
        })?;

        self.get_user(input.id)?
            .ok_or_else(|| anyhow::anyhow!("user {} vanished after upsert", input.id))
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_connection(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, strava_athlete_id, display_name, email, created_at, updated_at
                     FROM users WHERE id = ?1",
                    [id.to_string()],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        strava_athlete_id: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        updated_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
    })
}
