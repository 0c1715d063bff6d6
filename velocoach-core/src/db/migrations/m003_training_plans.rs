use super::SqlMigration;

pub(super) const MIGRATION: SqlMigration = SqlMigration {
    name: "003_create_training_plans",
    up: r#"
CREATE TABLE IF NOT EXISTS training_plans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    event_name TEXT NOT NULL,
    event_date TEXT,
    event_type TEXT,
    target_rider_type TEXT,
    plan_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_training_plans_user ON training_plans(user_id);
CREATE INDEX IF NOT EXISTS idx_training_plans_created ON training_plans(created_at);
"#,
    down: r#"
DROP INDEX IF EXISTS idx_training_plans_created;
DROP INDEX IF EXISTS idx_training_plans_user;
DROP TABLE IF EXISTS training_plans;
"#,
};
