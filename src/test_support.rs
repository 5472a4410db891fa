use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

use uuid::Uuid;

/// Serializes tests that mutate process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn set_test_env() {
    std::env::set_var("QUIZ_ENV", "test");
    std::env::set_var("SECRET_KEY", "test-secret");
    std::env::set_var("POSTGRES_SERVER", "localhost");
    std::env::set_var("POSTGRES_DB", "cactus_test");
    std::env::set_var("REDIS_HOST", "127.0.0.1");
    std::env::set_var("QUIZ_PARAMS_FILE", "/nonexistent/quiz_parameters.json");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("MAX_QUIZ_TIME");
    std::env::remove_var("MIN_TIME_PER_QUESTION");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
}

/// Writes `contents` to a unique file under the system temp directory and
/// returns its path.
pub(crate) fn write_temp_file(prefix: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("cactus-quiz-{prefix}-{}.json", Uuid::new_v4()));
    std::fs::write(&path, contents).expect("write temp file");
    path
}
