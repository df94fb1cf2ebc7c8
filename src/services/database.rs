use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::models::{Goal, MealEntry, PendingFix, Profile};

/// UTC bounds of the chat-local calendar day containing `now`.
pub fn local_day_bounds(tz: Tz, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = now.with_timezone(&tz).date_naive();
    let midnight = day.and_hms_opt(0, 0, 0).unwrap();
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let db = Database { pool };
        db.init_tables().await?;
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chats (
                chat_id BIGINT PRIMARY KEY,
                bound BOOLEAN NOT NULL DEFAULT FALSE,
                goal TEXT NOT NULL DEFAULT 'maintain'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                scope BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                name TEXT NOT NULL,
                height_cm INTEGER NOT NULL,
                weight_kg DOUBLE PRECISION NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (scope, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weights (
                chat_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL,
                weight_kg DOUBLE PRECISION NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS steps (
                chat_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL,
                steps BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meals (
                id BIGSERIAL PRIMARY KEY,
                chat_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL,
                title TEXT NOT NULL,
                kcal_low INTEGER,
                kcal_high INTEGER,
                reply_ref BIGINT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS last_actions (
                chat_id BIGINT PRIMARY KEY,
                last_food_ts BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_fixes (
                chat_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                reply_ref BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (chat_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- chats ----

    pub async fn ensure_chat(&self, chat_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO chats (chat_id) VALUES ($1) ON CONFLICT (chat_id) DO NOTHING")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT INTO last_actions (chat_id) VALUES ($1) ON CONFLICT (chat_id) DO NOTHING",
        )
        .bind(chat_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_bound(&self, chat_id: i64, bound: bool) -> Result<()> {
        sqlx::query("UPDATE chats SET bound = $1 WHERE chat_id = $2")
            .bind(bound)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_goal(&self, chat_id: i64, goal: Goal) -> Result<()> {
        sqlx::query("UPDATE chats SET goal = $1 WHERE chat_id = $2")
            .bind(goal.to_string())
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_goal(&self, chat_id: i64) -> Result<Goal> {
        let row = sqlx::query("SELECT goal FROM chats WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        let goal = row
            .and_then(|row| Goal::from_string(row.get::<String, _>(0).as_str()))
            .unwrap_or_default();
        Ok(goal)
    }

    pub async fn bound_chats(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT chat_id FROM chats WHERE bound = TRUE")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    // ---- profiles ----

    pub async fn get_profile(&self, scope: i64, user_id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query(
            r#"
            SELECT scope, user_id, name, height_cm, weight_kg, updated_at
            FROM profiles WHERE scope = $1 AND user_id = $2
            "#,
        )
        .bind(scope)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| Profile {
            scope: row.get(0),
            user_id: row.get(1),
            name: row.get(2),
            height_cm: row.get(3),
            weight_kg: row.get(4),
            updated_at: row.get(5),
        });

        Ok(profile)
    }

    /// Full-replace upsert, last writer wins. No partial-field merge.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (scope, user_id, name, height_cm, weight_kg, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (scope, user_id) DO UPDATE SET
                name = EXCLUDED.name,
                height_cm = EXCLUDED.height_cm,
                weight_kg = EXCLUDED.weight_kg,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.scope)
        .bind(profile.user_id)
        .bind(&profile.name)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- weights ----

    pub async fn record_weight(
        &self,
        chat_id: i64,
        user_id: i64,
        weight_kg: f64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO weights (chat_id, user_id, recorded_at, weight_kg) VALUES ($1, $2, $3, $4)",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(at)
        .bind(weight_kg)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_weight(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<Option<(DateTime<Utc>, f64)>> {
        let row = sqlx::query(
            r#"
            SELECT recorded_at, weight_kg FROM weights
            WHERE chat_id = $1 AND user_id = $2
            ORDER BY recorded_at DESC LIMIT 1
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| (row.get(0), row.get(1))))
    }

    /// Most recent weight at or before `cutoff`. Absence means the
    /// delta is simply omitted from output, not an error.
    pub async fn weight_as_of(
        &self,
        chat_id: i64,
        user_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<(DateTime<Utc>, f64)>> {
        let row = sqlx::query(
            r#"
            SELECT recorded_at, weight_kg FROM weights
            WHERE chat_id = $1 AND user_id = $2 AND recorded_at <= $3
            ORDER BY recorded_at DESC LIMIT 1
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| (row.get(0), row.get(1))))
    }

    // ---- steps ----

    pub async fn record_steps(
        &self,
        chat_id: i64,
        user_id: i64,
        steps: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO steps (chat_id, user_id, recorded_at, steps) VALUES ($1, $2, $3, $4)",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(at)
        .bind(steps)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn steps_sum_between(
        &self,
        chat_id: i64,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(steps), 0) FROM steps
            WHERE chat_id = $1 AND user_id = $2
                AND recorded_at >= $3 AND recorded_at < $4
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get(0))
    }

    // ---- meals ----

    pub async fn record_meal(&self, meal: &MealEntry) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO meals (chat_id, user_id, recorded_at, title, kcal_low, kcal_high, reply_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(meal.chat_id)
        .bind(meal.user_id)
        .bind(meal.recorded_at)
        .bind(&meal.title)
        .bind(meal.kcal_low)
        .bind(meal.kcal_high)
        .bind(meal.reply_ref)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get(0))
    }

    /// Meals inside the window in ascending time order (the snacking
    /// density rule depends on the ordering).
    pub async fn meals_between(
        &self,
        chat_id: i64,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MealEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, chat_id, user_id, recorded_at, title, kcal_low, kcal_high, reply_ref
            FROM meals
            WHERE chat_id = $1 AND user_id = $2
                AND recorded_at >= $3 AND recorded_at < $4
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::meal_from_row).collect())
    }

    pub async fn find_meal_by_reply_ref(
        &self,
        chat_id: i64,
        reply_ref: i64,
    ) -> Result<Option<MealEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, chat_id, user_id, recorded_at, title, kcal_low, kcal_high, reply_ref
            FROM meals
            WHERE chat_id = $1 AND reply_ref = $2
            "#,
        )
        .bind(chat_id)
        .bind(reply_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::meal_from_row))
    }

    /// In-place correction of a previously analyzed meal. Returns
    /// whether a row was actually updated.
    pub async fn update_meal_by_reply_ref(
        &self,
        chat_id: i64,
        reply_ref: i64,
        title: &str,
        kcal_low: Option<i32>,
        kcal_high: Option<i32>,
    ) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE meals SET title = $3, kcal_low = $4, kcal_high = $5
            WHERE chat_id = $1 AND reply_ref = $2
            "#,
        )
        .bind(chat_id)
        .bind(reply_ref)
        .bind(title)
        .bind(kcal_low)
        .bind(kcal_high)
        .execute(&self.pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    fn meal_from_row(row: sqlx::postgres::PgRow) -> MealEntry {
        MealEntry {
            id: row.get(0),
            chat_id: row.get(1),
            user_id: row.get(2),
            recorded_at: row.get(3),
            title: row.get(4),
            kcal_low: row.get(5),
            kcal_high: row.get(6),
            reply_ref: row.get(7),
        }
    }

    // ---- anti-spam ----

    /// Atomic check-and-set on the per-chat last-analysis timestamp.
    /// The marker advances only when permission is granted, inside the
    /// same statement as the check, so two near-simultaneous photos in
    /// one chat can never both pass.
    pub async fn can_analyze_food(
        &self,
        chat_id: i64,
        now_ts: i64,
        cooldown_seconds: i64,
    ) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE last_actions SET last_food_ts = $2
            WHERE chat_id = $1 AND $2 - last_food_ts >= $3
            "#,
        )
        .bind(chat_id)
        .bind(now_ts)
        .bind(cooldown_seconds)
        .execute(&self.pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    // ---- pending corrections ----

    pub async fn set_pending_fix(
        &self,
        chat_id: i64,
        user_id: i64,
        reply_ref: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pending_fixes (chat_id, user_id, reply_ref, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (chat_id, user_id) DO UPDATE SET
                reply_ref = EXCLUDED.reply_ref,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(reply_ref)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_pending_fix(&self, chat_id: i64, user_id: i64) -> Result<Option<PendingFix>> {
        let row = sqlx::query(
            r#"
            SELECT chat_id, user_id, reply_ref, created_at
            FROM pending_fixes WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PendingFix {
            chat_id: row.get(0),
            user_id: row.get(1),
            reply_ref: row.get(2),
            created_at: row.get(3),
        }))
    }

    pub async fn clear_pending_fix(&self, chat_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM pending_fixes WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_day_bounds() {
        let tz: Tz = "Asia/Almaty".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 21, 30, 0).unwrap();
        let (start, end) = local_day_bounds(tz, now);
        // Frames the full local day containing `now`.
        let start_local = start.with_timezone(&tz);
        assert_eq!(start_local.time(), chrono::NaiveTime::MIN);
        assert_eq!(end - start, Duration::days(1));
        assert!(start <= now && now < end);
    }
}
