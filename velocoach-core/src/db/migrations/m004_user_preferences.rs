use super::SqlMigration;

pub(super) const MIGRATION: SqlMigration = SqlMigration {
    name: "004_create_user_preferences",
    up: r#"
CREATE TABLE IF NOT EXISTS user_preferences (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    ftp INTEGER,
    timezone TEXT,
    theme TEXT NOT NULL DEFAULT 'system',
    settings_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_preferences_user ON user_preferences(user_id);
"#,
    down: r#"
DROP INDEX IF EXISTS idx_user_preferences_user;
DROP TABLE IF EXISTS user_preferences;
"#,
};
