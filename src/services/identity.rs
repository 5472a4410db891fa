use sqlx::PgPool;

use crate::repositories;

/// Accepts trimmed names of at least two characters made of ASCII letters,
/// whitespace, hyphens, and apostrophes.
pub(crate) fn validate_student_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return false;
    }

    trimmed
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
}

/// Best-effort duplicate detection over the trailing 24-hour window.
/// Storage failures never block a legitimate attempt, so errors resolve
/// to `false`.
pub(crate) async fn is_recent_duplicate(
    pool: &PgPool,
    student_hash: &str,
    exclude_session_id: &str,
) -> bool {
    match repositories::attempts::count_recent_by_fingerprint(pool, student_hash, exclude_session_id)
        .await
    {
        Ok(count) => count > 0,
        Err(err) => {
            tracing::error!(error = %err, "Error checking duplicate attempts");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate_student_name;

    #[test]
    fn accepts_plain_and_punctuated_names() {
        assert!(validate_student_name("Ann"));
        assert!(validate_student_name("O'Brien-Smith"));
        assert!(validate_student_name("Mary Jane"));
        assert!(validate_student_name("  Ann  "));
    }

    #[test]
    fn rejects_short_names() {
        assert!(!validate_student_name("A"));
        assert!(!validate_student_name(" A "));
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert!(!validate_student_name(""));
        assert!(!validate_student_name("   "));
    }

    #[test]
    fn rejects_digits_and_symbols() {
        assert!(!validate_student_name("Ann3"));
        assert!(!validate_student_name("Ann_Smith"));
        assert!(!validate_student_name("Ann!"));
        assert!(!validate_student_name("安娜"));
    }
}
