mod activity;
mod form;
mod start;
mod submit;

pub(crate) use activity::log_activity;
pub(crate) use start::start_quiz;
pub(crate) use submit::submit;
