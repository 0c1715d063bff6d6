use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{conversion_error, now, parse_json, parse_timestamp, parse_uuid, Database, UnknownVariant};
use crate::models::{Theme, UpdatePreferencesInput, UserPreferences};

const SELECT_PREFERENCES: &str = "SELECT id, user_id, ftp, timezone, theme, settings_json, created_at, updated_at
     FROM user_preferences WHERE user_id = ?1";

impl Database {
    pub fn get_preferences(&self, user_id: Uuid) -> Result<Option<UserPreferences>> {
        self.with_connection(|conn| Ok(find_preferences(conn, user_id)?))
    }

    /// Creates the preferences row on first write; afterwards only the fields
    /// present in `input` change.
    pub fn upsert_preferences(
        &self,
        user_id: Uuid,
        input: UpdatePreferencesInput,
    ) -> Result<UserPreferences> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let existing = find_preferences(&tx, user_id)?;
            let ts = now();

            match existing {
                Some(current) => {
                    let settings = input.settings.unwrap_or(current.settings);
                    tx.execute(
                        r#"
UPDATE user_preferences
SET ftp = ?1, timezone = ?2, theme = ?3, settings_json = ?4, updated_at = ?5
WHERE user_id = ?6
"#,
                        params![
                            input.ftp.unwrap_or(current.ftp),
                            input.timezone.unwrap_or(current.timezone),
                            input.theme.unwrap_or(current.theme).as_str(),
                            serde_json::to_string(&settings)?,
                            ts,
                            user_id.to_string()
                        ],
                    )?;
                }
                None => {
                    let settings = input
                        .settings
                        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
                    tx.execute(
                        r#"
INSERT INTO user_preferences (id, user_id, ftp, timezone, theme, settings_json, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
"#,
                        params![
                            Uuid::new_v4().to_string(),
                            user_id.to_string(),
                            input.ftp.flatten(),
                            input.timezone.flatten(),
                            input.theme.unwrap_or_default().as_str(),
                            serde_json::to_string(&settings)?,
                            ts
                        ],
                    )?;
                }
            }

            let saved = find_preferences(&tx, user_id)?
                .ok_or_else(|| anyhow::anyhow!("preferences for {user_id} missing after write"))?;
            tx.commit()?;
            Ok(saved)
        })
    }
}

fn find_preferences(conn: &Connection, user_id: Uuid) -> rusqlite::Result<Option<UserPreferences>> {
    conn.query_row(SELECT_PREFERENCES, [user_id.to_string()], row_to_preferences)
        .optional()
}

fn row_to_preferences(row: &Row<'_>) -> rusqlite::Result<UserPreferences> {
    let theme: String = row.get(4)?;
    Ok(UserPreferences {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        user_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        ftp: row.get(2)?,
        timezone: row.get(3)?,
        theme: Theme::from_str(&theme).ok_or_else(|| conversion_error(4, UnknownVariant(theme)))?,
        settings: parse_json(5, &row.get::<_, String>(5)?)?,
        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}
