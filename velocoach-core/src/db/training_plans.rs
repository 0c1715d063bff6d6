use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{conversion_error, now, parse_json, parse_timestamp, parse_uuid, Database};
use crate::models::{CreateTrainingPlanInput, TrainingPlan};

const PLAN_COLUMNS: &str = "id, user_id, event_name, event_date, event_type, target_rider_type, plan_json, created_at, updated_at";

impl Database {
    pub fn create_training_plan(
        &self,
        user_id: Uuid,
        input: CreateTrainingPlanInput,
    ) -> Result<TrainingPlan> {
        let id = Uuid::new_v4();
        self.with_connection(|conn| {
            let ts = now();
            conn.execute(
                r#"
INSERT INTO training_plans (id, user_id, event_name, event_date, event_type, target_rider_type, plan_json, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
"#,
                params![
                    id.to_string(),
                    user_id.to_string(),
                    input.event_name,
                    input.event_date.map(|d| d.to_string()),
                    input.event_type,
                    input.target_rider_type,
                    serde_json::to_string(&input.plan)?,
                    ts
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(plan_id = %id, user_id = %user_id, "training plan created");
        self.get_training_plan(id)?
            .ok_or_else(|| anyhow::anyhow!("training plan {id} missing after insert"))
    }

    pub fn get_training_plan(&self, id: Uuid) -> Result<Option<TrainingPlan>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {PLAN_COLUMNS} FROM training_plans WHERE id = ?1");
            Ok(conn
                .query_row(&sql, [id.to_string()], row_to_training_plan)
                .optional()?)
        })
    }

    /// Plans for a user, newest first.
    pub fn list_training_plans(&self, user_id: Uuid) -> Result<Vec<TrainingPlan>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {PLAN_COLUMNS} FROM training_plans WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let plans = stmt
                .query_map([user_id.to_string()], row_to_training_plan)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(plans)
        })
    }

    /// Returns false when no plan had that id.
    pub fn delete_training_plan(&self, id: Uuid) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM training_plans WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

fn row_to_training_plan(row: &Row<'_>) -> rusqlite::Result<TrainingPlan> {
    let event_date = row
        .get::<_, Option<String>>(3)?
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|e| conversion_error(3, e)))
        .transpose()?;

    Ok(TrainingPlan {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        user_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        event_name: row.get(2)?,
        event_date,
        event_type: row.get(4)?,
        target_rider_type: row.get(5)?,
        plan: parse_json(6, &row.get::<_, String>(6)?)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}
