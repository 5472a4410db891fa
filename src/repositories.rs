pub(crate) mod attempts;
pub(crate) mod quiz_log;
pub(crate) mod security_events;
