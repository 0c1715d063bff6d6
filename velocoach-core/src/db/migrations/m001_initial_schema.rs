//! Baseline tables shared with the account and activity-sync collaborators.

use super::SqlMigration;

pub(super) const MIGRATION: SqlMigration = SqlMigration {
    name: "001_initial_schema",
    up: r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    strava_athlete_id INTEGER UNIQUE,
    display_name TEXT NOT NULL,
    email TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    strava_activity_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    sport_type TEXT NOT NULL,
    distance_meters REAL NOT NULL DEFAULT 0,
    moving_time_seconds INTEGER NOT NULL DEFAULT 0,
    elevation_gain_meters REAL NOT NULL DEFAULT 0,
    average_watts REAL,
    started_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, strava_activity_id)
);

CREATE TABLE IF NOT EXISTS race_tags (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, activity_id)
);

CREATE INDEX IF NOT EXISTS idx_activities_user ON activities(user_id);
CREATE INDEX IF NOT EXISTS idx_activities_started ON activities(user_id, started_at);
CREATE INDEX IF NOT EXISTS idx_race_tags_user ON race_tags(user_id);
"#,
    down: r#"
DROP TABLE IF EXISTS race_tags;
DROP TABLE IF EXISTS activities;
DROP TABLE IF EXISTS users;
"#,
};
