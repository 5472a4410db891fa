use sqlx::PgPool;
use time::PrimitiveDateTime;

pub(crate) struct CreateLogEntry<'a> {
    pub(crate) session_id: &'a str,
    pub(crate) question_number: i32,
    pub(crate) question_id: &'a str,
    pub(crate) question: &'a str,
    pub(crate) user_answers: &'a [String],
    pub(crate) correct_answers: &'a [String],
    pub(crate) is_correct: bool,
    pub(crate) first_modified_time: Option<PrimitiveDateTime>,
    pub(crate) last_modified_time: Option<PrimitiveDateTime>,
    pub(crate) copy_paste_attempts: i32,
    pub(crate) tab_switches: i32,
}

/// One row per (attempt, question), written once at submission and never
/// updated. Answer lists are stored pipe-joined, duplicates preserved.
pub(crate) async fn create(pool: &PgPool, entry: CreateLogEntry<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quiz_log (
            session_id, question_number, question_id, question, user_answers,
            correct_answers, is_correct, first_modified_time, last_modified_time,
            copy_paste_attempts, tab_switches
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(entry.session_id)
    .bind(entry.question_number)
    .bind(entry.question_id)
    .bind(entry.question)
    .bind(entry.user_answers.join("|"))
    .bind(entry.correct_answers.join("|"))
    .bind(entry.is_correct)
    .bind(entry.first_modified_time)
    .bind(entry.last_modified_time)
    .bind(entry.copy_paste_attempts)
    .bind(entry.tab_switches)
    .execute(pool)
    .await?;

    Ok(())
}
