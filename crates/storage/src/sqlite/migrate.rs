use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: classes, students, progress, lessons, ai usage.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS classes (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    age_min INTEGER CHECK (age_min BETWEEN 0 AND 25),
                    age_max INTEGER CHECK (age_max BETWEEN 0 AND 25),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY,
                    class_id INTEGER,
                    name TEXT NOT NULL,
                    date_of_birth TEXT,
                    diagnoses TEXT,
                    strengths TEXT,
                    challenges TEXT,
                    interests TEXT,
                    sensory_needs TEXT,
                    communication_style TEXT,
                    support_strategies TEXT,
                    calming_strategies TEXT,
                    triggers TEXT,
                    teacher_notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE SET NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress (
                    student_id INTEGER NOT NULL,
                    subcategory_id TEXT NOT NULL,
                    level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 4),
                    completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
                    plan TEXT,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (student_id, subcategory_id),
                    FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lessons (
                    id INTEGER PRIMARY KEY,
                    class_id INTEGER NOT NULL,
                    topic TEXT NOT NULL,
                    objective TEXT,
                    content TEXT NOT NULL,
                    visual_schedule TEXT,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS ai_usage (
                    id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    model TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    status TEXT NOT NULL,
                    prompt_tokens INTEGER,
                    completion_tokens INTEGER,
                    total_tokens INTEGER
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id, name);")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_lessons_class_created ON lessons(class_id, created_at);",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ai_usage_created ON ai_usage(created_at);")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
