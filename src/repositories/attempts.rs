use sqlx::PgPool;
use time::PrimitiveDateTime;

pub(crate) struct CreateAttempt<'a> {
    pub(crate) session_id: &'a str,
    pub(crate) student_name: &'a str,
    pub(crate) student_hash: &'a str,
    pub(crate) page_load_time: PrimitiveDateTime,
    pub(crate) num_questions: i32,
    pub(crate) passing_level: f64,
    pub(crate) ip_address: &'a str,
    pub(crate) user_agent: &'a str,
}

/// Persists the attempt record before anything else happens for the
/// session. `submission_time` stays NULL until the quiz is submitted.
pub(crate) async fn create(
    pool: &PgPool,
    attempt: CreateAttempt<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO session_info (
            session_id, student_name, student_hash, page_load_time, submission_time,
            num_questions, passing_level, ip_address, user_agent
        ) VALUES ($1, $2, $3, $4, NULL, $5, $6, $7, $8)",
    )
    .bind(attempt.session_id)
    .bind(attempt.student_name)
    .bind(attempt.student_hash)
    .bind(attempt.page_load_time)
    .bind(attempt.num_questions)
    .bind(attempt.passing_level)
    .bind(attempt.ip_address)
    .bind(attempt.user_agent)
    .execute(pool)
    .await?;

    Ok(())
}

/// Sets the submission time iff it has not been set before. The NULL guard
/// makes the submitted transition a single compare-and-set, so a second
/// submission for the same attempt sees zero affected rows.
pub(crate) async fn mark_submitted(
    pool: &PgPool,
    session_id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE session_info SET submission_time = $1
         WHERE session_id = $2 AND submission_time IS NULL",
    )
    .bind(now)
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Counts other attempts with the same fingerprint submitted within the
/// trailing 24 hours.
pub(crate) async fn count_recent_by_fingerprint(
    pool: &PgPool,
    student_hash: &str,
    exclude_session_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM session_info
         WHERE student_hash = $1 AND session_id != $2
         AND submission_time > NOW() - INTERVAL '24 hours'",
    )
    .bind(student_hash)
    .bind(exclude_session_id)
    .fetch_one(pool)
    .await
}
